//! Sample rows loaded into the local store for demo mode.

use time::{Date, Duration, macros::format_description};

use crate::models::{CategoryType, DebtStatus, DebtType};

pub struct CategorySeed {
    pub name: &'static str,
    pub kind: CategoryType,
    pub color: &'static str,
}

pub struct EntrySeed {
    pub date: String,
    pub product_or_service: &'static str,
    pub revenue: f64,
    pub cost: f64,
    /// Index into [`categories`].
    pub category_index: usize,
    pub notes: Option<&'static str>,
}

pub struct DebtCreditSeed {
    pub name: &'static str,
    pub amount: f64,
    pub reason: &'static str,
    pub date: &'static str,
    pub due_date: &'static str,
    pub status: DebtStatus,
    pub kind: DebtType,
}

pub fn categories() -> Vec<CategorySeed> {
    vec![
        CategorySeed {
            name: "Consulting",
            kind: CategoryType::Income,
            color: "#10B981",
        },
        CategorySeed {
            name: "Design Work",
            kind: CategoryType::Income,
            color: "#3B82F6",
        },
        CategorySeed {
            name: "Development",
            kind: CategoryType::Income,
            color: "#8B5CF6",
        },
        CategorySeed {
            name: "Office Supplies",
            kind: CategoryType::Expense,
            color: "#F59E0B",
        },
        CategorySeed {
            name: "Software",
            kind: CategoryType::Expense,
            color: "#EF4444",
        },
    ]
}

/// Entries spread over the last few months so reports have something to show.
pub fn entries(today: Date) -> Vec<EntrySeed> {
    let rows: [(i64, &'static str, f64, f64, usize, Option<&'static str>); 10] = [
        (0, "Website Design", 2500.0, 500.0, 1, Some("Landing page refresh")),
        (1, "Logo Design", 800.0, 100.0, 1, None),
        (3, "Consulting", 1200.0, 0.0, 0, None),
        (12, "Printer paper", 0.0, 45.0, 3, None),
        (35, "API integration", 3200.0, 400.0, 2, Some("Phase one")),
        (41, "Design license renewal", 0.0, 299.0, 4, None),
        (64, "Strategy workshop", 1800.0, 150.0, 0, None),
        (70, "Mobile app prototype", 4100.0, 900.0, 2, None),
        (97, "Brand guidelines", 1500.0, 200.0, 1, None),
        (125, "Hosting", 0.0, 120.0, 4, Some("Annual plan")),
    ];

    let format = format_description!("[year]-[month]-[day]");
    rows.into_iter()
        .map(
            |(days_ago, product_or_service, revenue, cost, category_index, notes)| EntrySeed {
                date: (today - Duration::days(days_ago))
                    .format(format)
                    .unwrap_or_else(|_| today.to_string()),
                product_or_service,
                revenue,
                cost,
                category_index,
                notes,
            },
        )
        .collect()
}

pub fn debts_credits() -> Vec<DebtCreditSeed> {
    vec![
        DebtCreditSeed {
            name: "ABC Corp",
            amount: 2500.0,
            reason: "Website development project",
            date: "2024-01-15",
            due_date: "2024-02-15",
            status: DebtStatus::Unpaid,
            kind: DebtType::Receivable,
        },
        DebtCreditSeed {
            name: "John Smith",
            amount: 800.0,
            reason: "Logo design work",
            date: "2024-01-20",
            due_date: "2024-02-20",
            status: DebtStatus::Paid,
            kind: DebtType::Receivable,
        },
        DebtCreditSeed {
            name: "Software Vendor",
            amount: 299.0,
            reason: "Annual software license",
            date: "2024-01-10",
            due_date: "2024-02-10",
            status: DebtStatus::Unpaid,
            kind: DebtType::Payable,
        },
    ]
}
