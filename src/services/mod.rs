//! Business logic, one service per domain area. Handlers authorize the caller
//! against the business first; services then scope every query by `business_id`.

pub mod appointments;
pub mod businesses;
pub mod categories;
pub mod customers;
pub mod distribution;
pub mod employees;
pub mod finance;
pub mod production;
pub mod products;
pub mod reports;
pub mod sales;
pub mod scheduling;
pub mod suppliers;
pub mod validators;

use chrono::NaiveDate;
use sea_orm::sea_query::{Expr, Func, IntoColumnRef, SimpleExpr};
use serde::Serialize;
use uuid::Uuid;

/// One page of a list query plus the unpaged total
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }
}

/// Case-insensitive substring match, portable across SQLite and Postgres
pub(crate) fn contains_ci<C: IntoColumnRef>(column: C, term: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(format!("%{}%", term.trim().to_lowercase()))
}

/// Case-insensitive equality
pub(crate) fn equals_ci<C: IntoColumnRef>(column: C, value: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).eq(value.trim().to_lowercase())
}

/// Human readable reference such as `SAL-20250314-3F9A`
pub(crate) fn generate_reference(prefix: &str, date: NaiveDate) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(4)
        .collect::<String>()
        .to_uppercase();
    format!("{}-{}-{}", prefix, date.format("%Y%m%d"), suffix)
}

/// Trims and drops empty optional text
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_carry_prefix_and_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let reference = generate_reference("SAL", date);
        assert!(reference.starts_with("SAL-20250314-"));
        assert_eq!(reference.len(), "SAL-20250314-".len() + 4);
    }

    #[test]
    fn clean_drops_blank_text() {
        assert_eq!(clean(Some("  ".into())), None);
        assert_eq!(clean(Some(" Ada ".into())), Some("Ada".into()));
        assert_eq!(clean(None), None);
    }
}
