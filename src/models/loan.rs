//! Loan model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::book::Book;

/// Maximum simultaneous active loans per user
pub const MAX_ACTIVE_LOANS: i64 = 3;

/// Loan model from database
///
/// `return_date` is null while the loan is active and set exactly once on
/// return. `fine_amount` is zero at creation and materialized once at return
/// time; payments never reduce it, they only flip `paid` once it is covered.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Loan {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub checkout_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub fine_amount: Decimal,
    pub paid: bool,
}

impl Loan {
    /// Whether the loan is still active (not returned)
    pub fn is_active(&self) -> bool {
        self.return_date.is_none()
    }
}

/// Fields for creating a loan
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub user_id: i32,
    pub book_id: i32,
    pub checkout_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

/// Active loan with its associated book, for user-facing listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanWithBook {
    #[serde(flatten)]
    pub loan: Loan,
    pub book: Book,
}

/// Overdue loan annotated with its live fine projection.
///
/// `current_fine` is computed at query time and never persisted; the stored
/// `fine_amount` is only materialized when the loan is returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverdueLoan {
    #[serde(flatten)]
    pub loan: Loan,
    pub current_fine: Decimal,
}

/// Optional overrides for returning a loan
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReturnLoanInput {
    pub return_date: Option<DateTime<Utc>>,
    pub fine_amount: Option<Decimal>,
}
