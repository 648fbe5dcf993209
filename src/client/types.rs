//! Wire types for the ledger API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Net position against one group member, decomposed into two
/// non-negative projections. At most one of `owes_you` / `you_owe` is
/// non-zero at a time; both zero means settled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberBalance {
    pub user: User,
    #[serde(default)]
    pub owes_you: Decimal,
    #[serde(default)]
    pub you_owe: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub paid_by: Option<User>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub members: Vec<User>,
    #[serde(default)]
    pub member_balances: Vec<MemberBalance>,
    #[serde(default)]
    pub recent_expenses: Vec<Expense>,
    #[serde(default)]
    pub total_owed_to_me: Decimal,
    #[serde(default)]
    pub total_i_owe: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(default)]
    pub total_owed_to_me: Decimal,
    #[serde(default)]
    pub total_i_owe: Decimal,
    #[serde(default)]
    pub outstanding_balances: Vec<MemberBalance>,
    #[serde(default)]
    pub recent_expenses: Vec<Expense>,
}

/// One-shot transfer request reducing a mutual balance. Never cached
/// after submission; the refetched group is authoritative.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Settlement {
    pub payer_id: i64,
    pub payee_id: i64,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewGroup {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub member_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}
