//! User standing gateway backed by Postgres

use sqlx::{Pool, Postgres};

use crate::{error::AppResult, repository::UserStandingGateway};

#[derive(Clone)]
pub struct PgUserStandingGateway {
    pool: Pool<Postgres>,
}

impl PgUserStandingGateway {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserStandingGateway for PgUserStandingGateway {
    async fn has_unpaid_fines(&self, user_id: i32) -> AppResult<bool> {
        // The predicate deliberately ignores return state: an unpaid fine
        // blocks new loans whether or not the book came back.
        let has_fines: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM loans
                WHERE user_id = $1 AND fine_amount > 0 AND paid = false
            )
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(has_fines)
    }
}
