//! Domain models for Nilufar

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Emoji shown for categories created before emoji support existed
pub const DEFAULT_EMOJI: &str = "📝";

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An operator account (password hash intentionally not carried here)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

/// A bilingual expense category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    /// Chinese name (unique)
    pub name_cn: String,
    /// Uyghur name (unique)
    pub name_ug: String,
    pub emoji: String,
}

/// A new expense to insert; the sequence number is assigned at insert time
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub expense_date: NaiveDate,
    pub amount: f64,
    pub category_id: i64,
    pub user_id: i64,
    pub notes: Option<String>,
}

/// An expense row joined with its category and operator for display
///
/// `sequence_number` is the per-(date, category) dense rank: for every
/// (date, category) pair the surviving values are exactly 1..=n.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: i64,
    pub expense_date: NaiveDate,
    pub amount: f64,
    pub notes: Option<String>,
    pub sequence_number: i64,
    pub category_id: i64,
    pub category_name_cn: String,
    pub category_name_ug: String,
    pub username: String,
}

/// Aggregated spend for one category over a date range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category_name_cn: String,
    pub total_amount: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_role_roundtrip() {
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("user").unwrap(), Role::User);
        assert_eq!(Role::Admin.as_str(), "admin");
        assert!(Role::from_str("root").is_err());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(format!("{}", Role::User), "user");
    }
}
