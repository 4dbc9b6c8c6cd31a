//! Loan management service

use chrono::Utc;
use rust_decimal::Decimal;

use crate::{
    error::{AppError, AppResult},
    fine,
    models::loan::{Loan, LoanWithBook, NewLoan, OverdueLoan, ReturnLoanInput, MAX_ACTIVE_LOANS},
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Create a new loan (borrow a book).
    ///
    /// Preconditions: fewer than 3 active loans, no unpaid fines, book
    /// available. The three reads are independent and issued concurrently;
    /// when several fail at once the rejection is reported in that fixed
    /// priority order. The loan insert re-validates all three preconditions
    /// under locks, so a raced borrow still fails cleanly.
    pub async fn create_loan(&self, user_id: i32, book_id: i32) -> AppResult<Loan> {
        let (active_loans, has_unpaid_fines, is_available) = tokio::join!(
            self.repository.loans.find_active_by_user(user_id),
            self.repository.users.has_unpaid_fines(user_id),
            self.repository.books.is_available(book_id),
        );
        let active_loans = active_loans?;
        let has_unpaid_fines = has_unpaid_fines?;
        let is_available = is_available?;

        if active_loans.len() as i64 >= MAX_ACTIVE_LOANS {
            return Err(AppError::LoanLimitExceeded);
        }
        if has_unpaid_fines {
            return Err(AppError::UnpaidFines);
        }
        if !is_available {
            return Err(AppError::BookNotAvailable(book_id));
        }

        let checkout_date = Utc::now();
        self.repository
            .loans
            .create(NewLoan {
                user_id,
                book_id,
                checkout_date,
                due_date: fine::due_date(checkout_date),
            })
            .await
    }

    /// Return a borrowed book.
    ///
    /// The return date defaults to now; an overdue return materializes the
    /// fine (override wins when supplied). The loan update and the book
    /// status flip are applied together or not at all.
    pub async fn return_loan(&self, loan_id: i32, input: ReturnLoanInput) -> AppResult<Loan> {
        let loan = self
            .repository
            .loans
            .find_by_id(loan_id)
            .await?
            .ok_or(AppError::LoanNotFound)?;

        if loan.return_date.is_some() {
            return Err(AppError::LoanAlreadyReturned);
        }

        let returned_at = input.return_date.unwrap_or_else(Utc::now);
        let fine_amount = if returned_at > loan.due_date {
            input
                .fine_amount
                .unwrap_or_else(|| fine::fine(loan.due_date, returned_at))
        } else {
            Decimal::ZERO
        };

        self.repository
            .loans
            .finish(loan_id, returned_at, fine_amount)
            .await
    }

    /// Active loans for a user, each with its book
    pub async fn get_user_loans(&self, user_id: i32) -> AppResult<Vec<LoanWithBook>> {
        self.repository.loans.find_active_by_user(user_id).await
    }

    /// Active loans past their due date, annotated with the fine owed right
    /// now. The projection is computed per request and never persisted; the
    /// stored fine_amount is only materialized on return.
    pub async fn get_overdue_loans(&self) -> AppResult<Vec<OverdueLoan>> {
        let now = Utc::now();
        let loans = self.repository.loans.find_overdue(now).await?;

        Ok(loans
            .into_iter()
            .map(|loan| {
                let current_fine = fine::fine(loan.due_date, now);
                OverdueLoan { loan, current_fine }
            })
            .collect())
    }

    /// Fine still owed on a loan after all payments applied to it
    pub async fn get_remaining_balance(&self, loan_id: i32) -> AppResult<Decimal> {
        let loan = self
            .repository
            .loans
            .find_by_id(loan_id)
            .await?
            .ok_or(AppError::LoanNotFound)?;

        let payments = self.repository.payments.find_by_loan(loan_id).await?;
        let total_paid: Decimal = payments.iter().map(|p| p.amount).sum();

        Ok(loan.fine_amount - total_paid)
    }

    /// Whether a book can currently be borrowed
    pub async fn is_book_available(&self, book_id: i32) -> AppResult<bool> {
        self.repository.books.is_available(book_id).await
    }
}
