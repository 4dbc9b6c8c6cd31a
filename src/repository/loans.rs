//! Loan repository backed by Postgres

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookStatus},
        loan::{Loan, LoanWithBook, NewLoan, MAX_ACTIVE_LOANS},
    },
    repository::LoanRepository,
};

#[derive(Clone)]
pub struct PgLoanRepository {
    pool: Pool<Postgres>,
}

impl PgLoanRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl LoanRepository for PgLoanRepository {
    async fn create(&self, loan: NewLoan) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        // The service reads its preconditions outside any transaction, so
        // every one of them is repeated here under locks. The user row lock
        // serializes concurrent borrows by the same user; without it two
        // racing requests could both count 2 active loans and insert a 4th.
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(loan.user_id)
            .execute(&mut *tx)
            .await?;

        let active_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE user_id = $1 AND return_date IS NULL",
        )
        .bind(loan.user_id)
        .fetch_one(&mut *tx)
        .await?;
        if active_count >= MAX_ACTIVE_LOANS {
            return Err(AppError::LoanLimitExceeded);
        }

        let unpaid_fines: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM loans WHERE user_id = $1 AND fine_amount > 0 AND paid = false)",
        )
        .bind(loan.user_id)
        .fetch_one(&mut *tx)
        .await?;
        if unpaid_fines {
            return Err(AppError::UnpaidFines);
        }

        // Row lock on the book serializes concurrent borrows of the same
        // book.
        let status: Option<BookStatus> =
            sqlx::query_scalar("SELECT status FROM books WHERE id = $1 FOR UPDATE")
                .bind(loan.book_id)
                .fetch_optional(&mut *tx)
                .await?;

        match status {
            None => {
                return Err(AppError::NotFound(format!(
                    "Book with id {} not found",
                    loan.book_id
                )))
            }
            Some(BookStatus::Rented) => return Err(AppError::BookNotAvailable(loan.book_id)),
            Some(BookStatus::Available) => {}
        }

        let created = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (user_id, book_id, checkout_date, due_date, fine_amount, paid)
            VALUES ($1, $2, $3, $4, 0, false)
            RETURNING *
            "#,
        )
        .bind(loan.user_id)
        .bind(loan.book_id)
        .bind(loan.checkout_date)
        .bind(loan.due_date)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE books SET status = 'RENTED' WHERE id = $1")
            .bind(loan.book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(loan)
    }

    async fn find_active_by_user(&self, user_id: i32) -> AppResult<Vec<LoanWithBook>> {
        let rows = sqlx::query(
            r#"
            SELECT l.id, l.user_id, l.book_id, l.checkout_date, l.due_date,
                   l.return_date, l.fine_amount, l.paid,
                   b.title, b.author, b.category, b.status
            FROM loans l
            JOIN books b ON l.book_id = b.id
            WHERE l.user_id = $1 AND l.return_date IS NULL
            ORDER BY l.checkout_date
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::new();
        for row in rows {
            let book_id: i32 = row.get("book_id");
            result.push(LoanWithBook {
                loan: Loan {
                    id: row.get("id"),
                    user_id: row.get("user_id"),
                    book_id,
                    checkout_date: row.get("checkout_date"),
                    due_date: row.get("due_date"),
                    return_date: row.get("return_date"),
                    fine_amount: row.get("fine_amount"),
                    paid: row.get("paid"),
                },
                book: Book {
                    id: book_id,
                    title: row.get("title"),
                    author: row.get("author"),
                    category: row.get("category"),
                    status: row.get("status"),
                },
            });
        }

        Ok(result)
    }

    async fn find_overdue(&self, as_of: DateTime<Utc>) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM loans
            WHERE return_date IS NULL AND due_date < $1
            ORDER BY due_date
            "#,
        )
        .bind(as_of)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    async fn finish(
        &self,
        id: i32,
        returned_at: DateTime<Utc>,
        fine_amount: Decimal,
    ) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        // Guarded update: a loan already returned matches zero rows and
        // nothing is written.
        let updated = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans SET return_date = $2, fine_amount = $3
            WHERE id = $1 AND return_date IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(returned_at)
        .bind(fine_amount)
        .fetch_optional(&mut *tx)
        .await?;

        let loan = match updated {
            Some(loan) => loan,
            None => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM loans WHERE id = $1)")
                        .bind(id)
                        .fetch_one(&mut *tx)
                        .await?;
                return Err(if exists {
                    AppError::LoanAlreadyReturned
                } else {
                    AppError::LoanNotFound
                });
            }
        };

        sqlx::query("UPDATE books SET status = 'AVAILABLE' WHERE id = $1")
            .bind(loan.book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(loan)
    }
}
