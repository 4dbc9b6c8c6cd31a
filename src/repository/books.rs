//! Book gateway backed by Postgres

use sqlx::{Pool, Postgres};

use crate::{error::AppResult, repository::BookGateway};

#[derive(Clone)]
pub struct PgBookGateway {
    pool: Pool<Postgres>,
}

impl PgBookGateway {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl BookGateway for PgBookGateway {
    async fn is_available(&self, book_id: i32) -> AppResult<bool> {
        let available: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE id = $1 AND status = 'AVAILABLE')",
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(available)
    }
}
