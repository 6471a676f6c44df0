use serde::{Deserialize, Deserializer, Serialize, de};

/// Identity as reported by the auth service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub created_at: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct CredentialsPayload {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProfileResponse {
    pub user: PublicUser,
    pub entry_count: usize,
    pub category_count: usize,
    pub debt_credit_count: usize,
}

/// Closed set of category kinds. Requests may say `revenue` for income.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    #[serde(alias = "revenue")]
    Income,
    Expense,
}

impl CategoryType {
    pub fn as_str(self) -> &'static str {
        match self {
            CategoryType::Income => "income",
            CategoryType::Expense => "expense",
        }
    }

    /// Reads a stored kind. Legacy `revenue` and `profit` rows count as income.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "income" | "revenue" | "profit" => Some(CategoryType::Income),
            "expense" => Some(CategoryType::Expense),
            _ => None,
        }
    }
}

fn stored_category_type<'de, D>(deserializer: D) -> Result<CategoryType, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    CategoryType::parse(&value)
        .ok_or_else(|| de::Error::unknown_variant(&value, &["income", "expense"]))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", deserialize_with = "stored_category_type")]
    pub kind: CategoryType,
    pub color: Option<String>,
    pub user_id: String,
    pub created_at: String,
}

#[derive(Deserialize, Debug)]
pub struct CreateCategoryPayload {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CategoryType,
    pub color: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateCategoryPayload {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<CategoryType>,
    pub color: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct GetCategoriesQuery {
    #[serde(rename = "type")]
    pub kind: Option<CategoryType>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GetCategoriesResponse {
    pub categories: Vec<Category>,
    pub total_count: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: String,
    pub date: String,
    pub product_or_service: String,
    pub revenue: f64,
    pub cost: f64,
    pub category_id: String,
    pub notes: Option<String>,
    pub user_id: String,
    pub created_at: String,
}

impl Entry {
    pub fn profit(&self) -> f64 {
        self.revenue - self.cost
    }
}

#[derive(Deserialize, Debug)]
pub struct CreateEntryPayload {
    pub date: String,
    pub product_or_service: String,
    #[serde(default)]
    pub revenue: f64,
    #[serde(default)]
    pub cost: f64,
    pub category_id: String,
    pub notes: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateEntryPayload {
    pub date: Option<String>,
    pub product_or_service: Option<String>,
    pub revenue: Option<f64>,
    pub cost: Option<f64>,
    pub category_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct GetEntriesQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GetEntriesResponse {
    pub entries: Vec<Entry>,
    pub total_count: u32,
}

/// Filter pushed down to the store when listing entries.
#[derive(Debug, Default, Clone)]
pub struct EntryFilter {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub category_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DebtStatus {
    Paid,
    Unpaid,
}

impl DebtStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DebtStatus::Paid => "paid",
            DebtStatus::Unpaid => "unpaid",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "paid" => Some(DebtStatus::Paid),
            "unpaid" => Some(DebtStatus::Unpaid),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            DebtStatus::Paid => DebtStatus::Unpaid,
            DebtStatus::Unpaid => DebtStatus::Paid,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DebtType {
    Receivable,
    Payable,
}

impl DebtType {
    pub fn as_str(self) -> &'static str {
        match self {
            DebtType::Receivable => "receivable",
            DebtType::Payable => "payable",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "receivable" => Some(DebtType::Receivable),
            "payable" => Some(DebtType::Payable),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DebtCredit {
    pub id: String,
    pub name: String,
    pub amount: f64,
    pub reason: String,
    pub date: String,
    pub due_date: String,
    pub status: DebtStatus,
    #[serde(rename = "type")]
    pub kind: DebtType,
    pub user_id: String,
    pub created_at: String,
}

#[derive(Deserialize, Debug)]
pub struct CreateDebtCreditPayload {
    pub name: String,
    pub amount: f64,
    pub reason: String,
    pub date: String,
    pub due_date: String,
    pub status: Option<DebtStatus>,
    #[serde(rename = "type")]
    pub kind: DebtType,
}

#[derive(Deserialize, Debug)]
pub struct UpdateDebtCreditPayload {
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub reason: Option<String>,
    pub date: Option<String>,
    pub due_date: Option<String>,
    pub status: Option<DebtStatus>,
    #[serde(rename = "type")]
    pub kind: Option<DebtType>,
}

#[derive(Deserialize, Debug, Default)]
pub struct GetDebtsCreditsQuery {
    #[serde(rename = "type")]
    pub kind: Option<DebtType>,
    pub status: Option<DebtStatus>,
    pub search: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GetDebtsCreditsResponse {
    pub items: Vec<DebtCredit>,
    /// Unpaid receivables across all of the user's rows, ignoring filters.
    pub total_receivable: f64,
    /// Unpaid payables across all of the user's rows, ignoring filters.
    pub total_payable: f64,
}
