//! Expense records and the dashboard aggregate.
//!
//! Totals are computed by the backend; the client only renders them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use super::{CategoryId, ExpenseId, Family, FamilyId, UserId};

/// An expense recorded by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersonalExpense {
    /// Expense identifier.
    pub id: ExpenseId,
    /// Owner; always the caller.
    pub user_id: UserId,
    /// Family the expense was recorded against.
    pub family_id: FamilyId,
    /// Category, if one was chosen.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// Title shown in lists.
    pub expense_title: String,
    /// Amount spent.
    pub amount: Decimal,
    /// Expense type label.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Payment method label.
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Free-form note.
    #[serde(default)]
    pub note: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// A recent family expense with the spender's username denormalised.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecentExpense {
    /// Expense identifier.
    pub id: ExpenseId,
    /// Title shown in lists.
    pub expense_title: String,
    /// Amount spent.
    pub amount: Decimal,
    /// Username of the member who spent it.
    pub username: String,
    /// Expense type label.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Payment method label.
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Free-form note.
    #[serde(default)]
    pub note: Option<String>,
    /// Creation time, when the backend includes it.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Single-round-trip aggregate backing the expenses page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExpensesDashboard {
    /// Caller's family, `None` when the caller has not joined one.
    #[serde(default)]
    pub family: Option<Family>,
    /// Caller's own spend.
    #[serde(default, deserialize_with = "null_as_default")]
    pub personal_total: Decimal,
    /// Whole-family spend.
    #[serde(default, deserialize_with = "null_as_default")]
    pub family_total: Decimal,
    /// Latest expenses across the family.
    #[serde(default, deserialize_with = "null_as_default")]
    pub recent_family_expenses: Vec<RecentExpense>,
    /// Caller's own expenses.
    #[serde(default, deserialize_with = "null_as_default")]
    pub personal_expenses: Vec<PersonalExpense>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
