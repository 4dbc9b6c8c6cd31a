//! Payment repository backed by Postgres

use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::payment::{NewPayment, Payment, PaymentQuery, PaymentSortField, SortOrder},
    repository::PaymentRepository,
};

#[derive(Clone)]
pub struct PgPaymentRepository {
    pool: Pool<Postgres>,
}

impl PgPaymentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn create(&self, payment: NewPayment) -> AppResult<Payment> {
        let mut tx = self.pool.begin().await?;

        // Lock the loan row so concurrent payments on the same loan are
        // serialized and the balance re-check below is authoritative.
        let fine_amount: Option<Decimal> =
            sqlx::query_scalar("SELECT fine_amount FROM loans WHERE id = $1 FOR UPDATE")
                .bind(payment.loan_id)
                .fetch_optional(&mut *tx)
                .await?;

        let fine_amount = fine_amount.ok_or(AppError::LoanNotFound)?;

        let total_paid: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE loan_id = $1",
        )
        .bind(payment.loan_id)
        .fetch_one(&mut *tx)
        .await?;

        let remaining = fine_amount - total_paid;
        if payment.amount > remaining {
            return Err(AppError::PaymentExceedsBalance(remaining));
        }

        let created = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (user_id, loan_id, amount, payment_date)
            VALUES ($1, $2, $3, NOW())
            RETURNING *
            "#,
        )
        .bind(payment.user_id)
        .bind(payment.loan_id)
        .bind(payment.amount)
        .fetch_one(&mut *tx)
        .await?;

        if total_paid + payment.amount >= fine_amount {
            sqlx::query("UPDATE loans SET paid = true WHERE id = $1")
                .bind(payment.loan_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(payment)
    }

    async fn find_by_loan(&self, loan_id: i32) -> AppResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE loan_id = $1 ORDER BY payment_date",
        )
        .bind(loan_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    async fn find_by_user(
        &self,
        user_id: i32,
        query: &PaymentQuery,
    ) -> AppResult<(Vec<Payment>, i64)> {
        let mut conditions = vec!["user_id = $1".to_string()];
        let mut idx = 1;

        if query.min_amount.is_some() {
            idx += 1;
            conditions.push(format!("amount >= ${}", idx));
        }
        if query.max_amount.is_some() {
            idx += 1;
            conditions.push(format!("amount <= ${}", idx));
        }
        if query.start_date.is_some() {
            idx += 1;
            conditions.push(format!("payment_date >= ${}", idx));
        }
        if query.end_date.is_some() {
            idx += 1;
            conditions.push(format!("payment_date <= ${}", idx));
        }

        let where_clause = conditions.join(" AND ");

        // Count total
        let count_query = format!("SELECT COUNT(*) FROM payments WHERE {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query).bind(user_id);
        if let Some(min) = query.min_amount {
            count_builder = count_builder.bind(min);
        }
        if let Some(max) = query.max_amount {
            count_builder = count_builder.bind(max);
        }
        if let Some(start) = query.start_date {
            count_builder = count_builder.bind(start);
        }
        if let Some(end) = query.end_date {
            count_builder = count_builder.bind(end);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        // Fetch page
        let sort_column = match query.sort_by {
            PaymentSortField::Amount => "amount",
            PaymentSortField::PaymentDate => "payment_date",
        };
        let direction = match query.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        let offset = query.page.saturating_sub(1) as i64 * query.page_size as i64;

        let select_query = format!(
            r#"
            SELECT * FROM payments WHERE {}
            ORDER BY {} {}
            LIMIT {} OFFSET {}
            "#,
            where_clause, sort_column, direction, query.page_size, offset
        );

        let mut select_builder = sqlx::query_as::<_, Payment>(&select_query).bind(user_id);
        if let Some(min) = query.min_amount {
            select_builder = select_builder.bind(min);
        }
        if let Some(max) = query.max_amount {
            select_builder = select_builder.bind(max);
        }
        if let Some(start) = query.start_date {
            select_builder = select_builder.bind(start);
        }
        if let Some(end) = query.end_date {
            select_builder = select_builder.bind(end);
        }
        let payments = select_builder.fetch_all(&self.pool).await?;

        Ok((payments, total))
    }
}
