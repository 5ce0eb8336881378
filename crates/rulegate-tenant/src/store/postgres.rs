use super::{CountQuery, TenantStore};
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use sqlx::{Pool, Postgres};

/// Postgres-backed tenant store
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl TenantStore for PostgresStore {
    async fn count(&self, query: &CountQuery) -> Result<i64> {
        let sql = query.to_sql()?;

        let mut statement = sqlx::query_scalar::<_, i64>(&sql);
        for param in query.params() {
            statement = statement.bind(param);
        }

        statement
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                    StoreError::Unavailable(e.to_string())
                }
                other => StoreError::Query(other.to_string()),
            })
    }
}
