//! Monthly and category reports built from a user's entries.
//!
//! [`summarize_by_month`] is the core aggregation: it is pure, so the relay
//! handlers and [`crate::client::RelayClient`] share it. Everything else in
//! this module derives views (period window, totals, top categories, CSV,
//! dashboard) from its output.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderName, StatusCode, header},
};
use serde::{Deserialize, Serialize};
use time::{Date, Month, macros::format_description};
use tracing::warn;

use crate::AppState;
use crate::auth::require_session;
use crate::constants::*;
use crate::debts_credits::unpaid_total;
use crate::models::{Category, DebtCredit, DebtType, Entry, EntryFilter};
use crate::store::store_error;
use crate::utils::{parse_date, today};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CategoryTotals {
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub count: u32,
    pub color: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MonthlySummary {
    /// Display label such as `Jan 2024`.
    pub month: String,
    pub year: i32,
    pub month_number: u8,
    pub total_revenue: f64,
    pub total_cost: f64,
    pub total_profit: f64,
    pub entry_count: u32,
    /// Keyed by category name; unknown categories collapse into `Uncategorized`.
    pub categories: BTreeMap<String, CategoryTotals>,
}

impl MonthlySummary {
    fn new(year: i32, month: Month) -> Self {
        let label = Date::from_calendar_date(year, month, 1)
            .ok()
            .and_then(|first| {
                first
                    .format(format_description!("[month repr:short] [year]"))
                    .ok()
            })
            .unwrap_or_else(|| format!("{} {}", month, year));

        Self {
            month: label,
            year,
            month_number: month as u8,
            total_revenue: 0.0,
            total_cost: 0.0,
            total_profit: 0.0,
            entry_count: 0,
            categories: BTreeMap::new(),
        }
    }
}

/// Groups entries by calendar month, newest month first.
///
/// Entries whose date cannot be read as `YYYY-MM-DD` (a trailing time part is
/// ignored) are skipped with a warning.
pub fn summarize_by_month(entries: &[Entry], categories: &[Category]) -> Vec<MonthlySummary> {
    let lookup: HashMap<&str, &Category> = categories.iter().map(|c| (c.id.as_str(), c)).collect();
    let mut months: BTreeMap<(i32, u8), MonthlySummary> = BTreeMap::new();

    for entry in entries {
        let Some(date) = entry.date.get(..10).and_then(parse_date) else {
            warn!(entry_id = %entry.id, date = %entry.date, "skipping entry with unreadable date");
            continue;
        };

        let summary = months
            .entry((date.year(), date.month() as u8))
            .or_insert_with(|| MonthlySummary::new(date.year(), date.month()));

        let profit = entry.profit();
        summary.total_revenue += entry.revenue;
        summary.total_cost += entry.cost;
        summary.total_profit += profit;
        summary.entry_count += 1;

        let category = lookup.get(entry.category_id.as_str());
        let name = category
            .map(|c| c.name.clone())
            .unwrap_or_else(|| UNCATEGORIZED_NAME.to_string());
        let totals = summary
            .categories
            .entry(name)
            .or_insert_with(|| CategoryTotals {
                revenue: 0.0,
                cost: 0.0,
                profit: 0.0,
                count: 0,
                color: category
                    .and_then(|c| c.color.clone())
                    .unwrap_or_else(|| UNCATEGORIZED_COLOR.to_string()),
            });
        totals.revenue += entry.revenue;
        totals.cost += entry.cost;
        totals.profit += profit;
        totals.count += 1;
    }

    months.into_values().rev().collect()
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    #[default]
    #[serde(rename = "6months")]
    SixMonths,
    #[serde(rename = "12months")]
    TwelveMonths,
    #[serde(rename = "all")]
    All,
}

impl Period {
    pub fn month_limit(self) -> Option<usize> {
        match self {
            Period::SixMonths => Some(6),
            Period::TwelveMonths => Some(12),
            Period::All => None,
        }
    }

    /// Keeps the newest months of a newest-first summary list.
    pub fn apply(self, mut summaries: Vec<MonthlySummary>) -> Vec<MonthlySummary> {
        if let Some(limit) = self.month_limit() {
            summaries.truncate(limit);
        }
        summaries
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct OverallTotals {
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub entry_count: u32,
}

pub fn overall_totals(summaries: &[MonthlySummary]) -> OverallTotals {
    summaries
        .iter()
        .fold(OverallTotals::default(), |mut acc, month| {
            acc.revenue += month.total_revenue;
            acc.cost += month.total_cost;
            acc.profit += month.total_profit;
            acc.entry_count += month.entry_count;
            acc
        })
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CategorySlice {
    pub name: String,
    pub value: f64,
    pub color: String,
}

/// Revenue per category across all given months, largest first.
pub fn top_categories(summaries: &[MonthlySummary], limit: usize) -> Vec<CategorySlice> {
    let mut totals: BTreeMap<&str, CategorySlice> = BTreeMap::new();
    for month in summaries {
        for (name, data) in &month.categories {
            totals
                .entry(name.as_str())
                .or_insert_with(|| CategorySlice {
                    name: name.clone(),
                    value: 0.0,
                    color: data.color.clone(),
                })
                .value += data.revenue;
        }
    }

    let mut slices: Vec<CategorySlice> = totals.into_values().collect();
    slices.sort_by(|a, b| b.value.total_cmp(&a.value));
    slices.truncate(limit);
    slices
}

const CSV_HEADER: &str = "Month,Total Revenue,Total Cost,Total Profit,Entry Count";

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn export_csv(summaries: &[MonthlySummary]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for month in summaries {
        let row = [
            csv_field(&month.month),
            month.total_revenue.to_string(),
            month.total_cost.to_string(),
            month.total_profit.to_string(),
            month.entry_count.to_string(),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub total_revenue: f64,
    pub total_profit: f64,
    /// Unpaid receivables.
    pub amount_owed: f64,
    /// Unpaid payables.
    pub amount_you_owe: f64,
    pub daily_streak: u32,
    pub recent_entries: Vec<Entry>,
}

/// Consecutive days with at least one entry, ending today or, when today has
/// nothing yet, yesterday.
pub fn daily_streak(entries: &[Entry], today: Date) -> u32 {
    let days: BTreeSet<Date> = entries
        .iter()
        .filter_map(|e| e.date.get(..10).and_then(parse_date))
        .collect();

    let mut cursor = if days.contains(&today) {
        Some(today)
    } else {
        today.previous_day()
    };

    let mut streak = 0;
    while let Some(day) = cursor
        && days.contains(&day)
    {
        streak += 1;
        cursor = day.previous_day();
    }
    streak
}

pub fn dashboard_summary(entries: &[Entry], debts: &[DebtCredit], today: Date) -> DashboardSummary {
    let mut recent: Vec<Entry> = entries.to_vec();
    recent.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    recent.truncate(RECENT_ENTRIES_LIMIT);

    DashboardSummary {
        total_revenue: entries.iter().fold(0.0, |total, e| total + e.revenue),
        total_profit: entries.iter().fold(0.0, |total, e| total + e.profit()),
        amount_owed: unpaid_total(debts, DebtType::Receivable),
        amount_you_owe: unpaid_total(debts, DebtType::Payable),
        daily_streak: daily_streak(entries, today),
        recent_entries: recent,
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct ReportQuery {
    pub period: Option<Period>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MonthlyReport {
    pub period: Period,
    pub months: Vec<MonthlySummary>,
    pub totals: OverallTotals,
    pub top_categories: Vec<CategorySlice>,
}

async fn load_summaries(
    app_state: &AppState,
    user_id: &str,
    period: Period,
) -> Result<Vec<MonthlySummary>, (StatusCode, String)> {
    let filter = EntryFilter::default();
    let (entries, categories) = tokio::try_join!(
        app_state.store.list_entries(user_id, &filter),
        app_state.store.list_categories(user_id),
    )
    .map_err(store_error("Report data"))?;

    Ok(period.apply(summarize_by_month(&entries, &categories)))
}

pub async fn monthly_report(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ReportQuery>,
) -> Result<Json<MonthlyReport>, (StatusCode, String)> {
    let claims = require_session(&app_state, &headers)?;
    let period = query.period.unwrap_or_default();
    let months = load_summaries(&app_state, &claims.sub, period).await?;

    Ok(Json(MonthlyReport {
        period,
        totals: overall_totals(&months),
        top_categories: top_categories(&months, TOP_CATEGORIES_LIMIT),
        months,
    }))
}

pub async fn export_report(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ReportQuery>,
) -> Result<(StatusCode, [(HeaderName, String); 2], String), (StatusCode, String)> {
    let claims = require_session(&app_state, &headers)?;
    let months = load_summaries(&app_state, &claims.sub, query.period.unwrap_or_default()).await?;

    let disposition = format!("attachment; filename=\"financial-report-{}.csv\"", today());
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export_csv(&months),
    ))
}

pub async fn dashboard(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DashboardSummary>, (StatusCode, String)> {
    let claims = require_session(&app_state, &headers)?;
    let filter = EntryFilter::default();
    let (entries, debts) = tokio::try_join!(
        app_state.store.list_entries(&claims.sub, &filter),
        app_state.store.list_debts_credits(&claims.sub),
    )
    .map_err(store_error("Dashboard data"))?;

    Ok(Json(dashboard_summary(&entries, &debts, today())))
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::models::{CategoryType, DebtStatus};

    fn entry(id: &str, date: &str, revenue: f64, cost: f64, category_id: &str) -> Entry {
        Entry {
            id: id.to_string(),
            date: date.to_string(),
            product_or_service: format!("item {}", id),
            revenue,
            cost,
            category_id: category_id.to_string(),
            notes: None,
            user_id: "u1".to_string(),
            created_at: format!("{}T00:00:00Z", date),
        }
    }

    fn category(id: &str, name: &str, color: Option<&str>) -> Category {
        Category {
            id: id.to_string(),
            name: name.to_string(),
            kind: CategoryType::Income,
            color: color.map(str::to_string),
            user_id: "u1".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn groups_by_month_newest_first() {
        let entries = vec![
            entry("1", "2024-01-05", 100.0, 40.0, "c1"),
            entry("2", "2024-01-20", 50.0, 10.0, "c1"),
            entry("3", "2024-02-01", 200.0, 0.0, "c1"),
        ];
        let categories = vec![category("c1", "Consulting", Some("#10B981"))];

        let months = summarize_by_month(&entries, &categories);
        assert_eq!(months.len(), 2);

        assert_eq!(months[0].month, "Feb 2024");
        assert_eq!(months[0].total_revenue, 200.0);
        assert_eq!(months[0].total_cost, 0.0);
        assert_eq!(months[0].total_profit, 200.0);
        assert_eq!(months[0].entry_count, 1);

        assert_eq!(months[1].month, "Jan 2024");
        assert_eq!(months[1].year, 2024);
        assert_eq!(months[1].month_number, 1);
        assert_eq!(months[1].total_revenue, 150.0);
        assert_eq!(months[1].total_cost, 50.0);
        assert_eq!(months[1].total_profit, 100.0);
        assert_eq!(months[1].entry_count, 2);

        let consulting = &months[1].categories["Consulting"];
        assert_eq!(consulting.count, 2);
        assert_eq!(consulting.profit, 100.0);
        assert_eq!(consulting.color, "#10B981");
    }

    #[test]
    fn year_boundary_sorts_by_year_first() {
        let entries = vec![
            entry("1", "2023-12-31", 1.0, 0.0, "c1"),
            entry("2", "2024-01-01", 1.0, 0.0, "c1"),
            entry("3", "2023-02-10", 1.0, 0.0, "c1"),
        ];
        let labels: Vec<String> = summarize_by_month(&entries, &[])
            .into_iter()
            .map(|m| m.month)
            .collect();
        assert_eq!(labels, vec!["Jan 2024", "Dec 2023", "Feb 2023"]);
    }

    #[test]
    fn totals_match_entry_sums() {
        let entries = vec![
            entry("1", "2024-03-02", 120.5, 20.25, "c1"),
            entry("2", "2024-04-11", 0.0, 75.0, "c2"),
            entry("3", "2024-04-12T09:30:00Z", 300.0, 100.0, "missing"),
            entry("4", "2023-11-30", 42.0, 2.0, "c1"),
        ];
        let categories = vec![
            category("c1", "Design", Some("#3B82F6")),
            category("c2", "Software", None),
        ];
        let months = summarize_by_month(&entries, &categories);

        let count: u32 = months.iter().map(|m| m.entry_count).sum();
        assert_eq!(count as usize, entries.len());

        let totals = overall_totals(&months);
        let revenue: f64 = entries.iter().map(|e| e.revenue).sum();
        let cost: f64 = entries.iter().map(|e| e.cost).sum();
        assert!((totals.revenue - revenue).abs() < 1e-9);
        assert!((totals.cost - cost).abs() < 1e-9);
        assert!((totals.profit - (revenue - cost)).abs() < 1e-9);

        for month in &months {
            let in_categories: u32 = month.categories.values().map(|c| c.count).sum();
            assert_eq!(in_categories, month.entry_count);
        }
    }

    #[test]
    fn unknown_category_is_uncategorized() {
        let months = summarize_by_month(&[entry("1", "2024-05-05", 10.0, 1.0, "gone")], &[]);
        let bucket = &months[0].categories[UNCATEGORIZED_NAME];
        assert_eq!(bucket.count, 1);
        assert_eq!(bucket.color, UNCATEGORIZED_COLOR);
    }

    #[test]
    fn empty_and_unreadable_input() {
        assert!(summarize_by_month(&[], &[]).is_empty());
        assert!(summarize_by_month(&[entry("1", "not a date", 1.0, 0.0, "c")], &[]).is_empty());
    }

    #[test]
    fn period_keeps_newest_months() {
        let entries: Vec<Entry> = (1..=9)
            .map(|m| entry(&m.to_string(), &format!("2024-0{}-01", m), 1.0, 0.0, "c"))
            .collect();
        let months = summarize_by_month(&entries, &[]);
        assert_eq!(Period::SixMonths.apply(months.clone()).len(), 6);
        assert_eq!(Period::TwelveMonths.apply(months.clone()).len(), 9);
        assert_eq!(Period::All.apply(months.clone()).len(), 9);
        assert_eq!(Period::SixMonths.apply(months)[0].month, "Sep 2024");
    }

    #[test]
    fn period_parses_from_query_values() {
        let p: Period = serde_json::from_str("\"12months\"").unwrap();
        assert_eq!(p, Period::TwelveMonths);
        assert!(serde_json::from_str::<Period>("\"3months\"").is_err());
        assert_eq!(Period::default(), Period::SixMonths);
    }

    #[test]
    fn top_categories_ranked_by_revenue() {
        let entries = vec![
            entry("1", "2024-01-05", 100.0, 0.0, "a"),
            entry("2", "2024-02-05", 500.0, 0.0, "b"),
            entry("3", "2024-03-05", 250.0, 0.0, "a"),
        ];
        let categories = vec![
            category("a", "Alpha", Some("#111111")),
            category("b", "Beta", Some("#222222")),
        ];
        let slices = top_categories(&summarize_by_month(&entries, &categories), 8);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].name, "Beta");
        assert_eq!(slices[1].value, 350.0);
        assert_eq!(slices[1].color, "#111111");
        assert_eq!(
            top_categories(&summarize_by_month(&entries, &categories), 1).len(),
            1
        );
    }

    #[test]
    fn csv_has_header_and_rows() {
        let entries = vec![
            entry("1", "2024-01-05", 100.0, 40.0, "c"),
            entry("2", "2024-02-01", 200.5, 0.0, "c"),
        ];
        let csv = export_csv(&summarize_by_month(&entries, &[]));
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "Feb 2024,200.5,0,200.5,1");
        assert_eq!(lines[2], "Jan 2024,100,40,60,1");
        assert_eq!(export_csv(&[]).lines().count(), 1);
    }

    #[test]
    fn csv_fields_are_escaped() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn streak_counts_back_from_today_or_yesterday() {
        let today = date!(2024 - 06 - 10);
        let entries = vec![
            entry("1", "2024-06-10", 1.0, 0.0, "c"),
            entry("2", "2024-06-09", 1.0, 0.0, "c"),
            entry("3", "2024-06-09", 1.0, 0.0, "c"),
            entry("4", "2024-06-08", 1.0, 0.0, "c"),
            entry("5", "2024-06-06", 1.0, 0.0, "c"),
        ];
        assert_eq!(daily_streak(&entries, today), 3);
        assert_eq!(daily_streak(&entries[1..], today), 2);
        assert_eq!(daily_streak(&entries[4..], today), 0);
        assert_eq!(daily_streak(&[], today), 0);
    }

    #[test]
    fn dashboard_sums_and_recent_entries() {
        let today = date!(2024 - 06 - 10);
        let entries = vec![
            entry("old", "2024-05-01", 100.0, 30.0, "c"),
            entry("new", "2024-06-10", 50.0, 10.0, "c"),
            entry("mid", "2024-06-01", 20.0, 0.0, "c"),
            entry("older", "2024-04-01", 5.0, 5.0, "c"),
        ];
        let debt = |amount: f64, status: DebtStatus, kind: DebtType| DebtCredit {
            id: format!("{}", amount),
            name: "Party".to_string(),
            amount,
            reason: "Work".to_string(),
            date: "2024-06-01".to_string(),
            due_date: "2024-07-01".to_string(),
            status,
            kind,
            user_id: "u1".to_string(),
            created_at: "2024-06-01T00:00:00Z".to_string(),
        };
        let debts = vec![
            debt(2500.0, DebtStatus::Unpaid, DebtType::Receivable),
            debt(800.0, DebtStatus::Paid, DebtType::Receivable),
            debt(299.0, DebtStatus::Unpaid, DebtType::Payable),
        ];

        let summary = dashboard_summary(&entries, &debts, today);
        assert_eq!(summary.total_revenue, 175.0);
        assert_eq!(summary.total_profit, 130.0);
        assert_eq!(summary.amount_owed, 2500.0);
        assert_eq!(summary.amount_you_owe, 299.0);
        assert_eq!(summary.daily_streak, 1);
        let ids: Vec<&str> = summary.recent_entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }
}
