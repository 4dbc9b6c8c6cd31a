//! Persistence contracts and adapters
//!
//! The domain services are written against the capability traits below, so
//! they run identically on the Postgres adapters and on the deterministic
//! in-memory store used by tests.

pub mod books;
pub mod loans;
pub mod memory;
pub mod payments;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        loan::{Loan, LoanWithBook, NewLoan},
        payment::{NewPayment, Payment, PaymentQuery},
    },
};

/// Read access to the book catalog
#[async_trait]
pub trait BookGateway: Send + Sync {
    /// Whether the book is in AVAILABLE state
    async fn is_available(&self, book_id: i32) -> AppResult<bool>;
}

/// Read access to a user's fine standing
#[async_trait]
pub trait UserStandingGateway: Send + Sync {
    /// Whether the user has any loan with a positive, unpaid fine
    /// (regardless of return state)
    async fn has_unpaid_fines(&self, user_id: i32) -> AppResult<bool>;
}

/// Loan persistence
#[async_trait]
pub trait LoanRepository: Send + Sync {
    /// Insert a new loan and mark its book RENTED, as one atomic unit.
    ///
    /// All three borrow preconditions are re-validated inside the same unit,
    /// in priority order: a user already holding the maximum active loans
    /// fails with `LoanLimitExceeded`, an outstanding unpaid fine with
    /// `UnpaidFines`, and a book no longer available with `BookNotAvailable`.
    /// Two concurrent borrows whose earlier reads both passed cannot both
    /// slip through.
    async fn create(&self, loan: NewLoan) -> AppResult<Loan>;

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Loan>>;

    /// Active loans (return_date null) for a user, each with its book
    async fn find_active_by_user(&self, user_id: i32) -> AppResult<Vec<LoanWithBook>>;

    /// Active loans whose due date is before `as_of`
    async fn find_overdue(&self, as_of: DateTime<Utc>) -> AppResult<Vec<Loan>>;

    /// Set the return fields and mark the book AVAILABLE, as one atomic unit.
    ///
    /// Fails with `LoanAlreadyReturned` when the return date is already set,
    /// leaving all state untouched.
    async fn finish(
        &self,
        id: i32,
        returned_at: DateTime<Utc>,
        fine_amount: Decimal,
    ) -> AppResult<Loan>;
}

/// Payment persistence
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Insert a payment; when the accumulated total covers the loan's fine,
    /// flip the loan's `paid` flag in the same atomic unit.
    ///
    /// The remaining balance is re-checked against concurrent payments on the
    /// same loan; an oversettling insert fails with `PaymentExceedsBalance`.
    async fn create(&self, payment: NewPayment) -> AppResult<Payment>;

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Payment>>;

    async fn find_by_loan(&self, loan_id: i32) -> AppResult<Vec<Payment>>;

    /// Filtered, sorted, paginated payments for a user, with the unpaginated
    /// total
    async fn find_by_user(
        &self,
        user_id: i32,
        query: &PaymentQuery,
    ) -> AppResult<(Vec<Payment>, i64)>;
}

/// Container bundling the persistence capabilities handed to services
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookGateway>,
    pub users: Arc<dyn UserStandingGateway>,
    pub loans: Arc<dyn LoanRepository>,
    pub payments: Arc<dyn PaymentRepository>,
}

impl Repository {
    /// Postgres-backed repository sharing one connection pool
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::PgBookGateway::new(pool.clone())),
            users: Arc::new(users::PgUserStandingGateway::new(pool.clone())),
            loans: Arc::new(loans::PgLoanRepository::new(pool.clone())),
            payments: Arc::new(payments::PgPaymentRepository::new(pool)),
        }
    }

    /// Repository backed by a shared in-memory store (tests)
    pub fn in_memory(store: Arc<memory::MemoryStore>) -> Self {
        Self {
            books: store.clone(),
            users: store.clone(),
            loans: store.clone(),
            payments: store,
        }
    }
}
