//! Database connection pooling and schema bootstrap.
//!
//! Every service owns exactly one process-wide [`PgPool`] created here at
//! startup. Schema creation is idempotent; services call [`ensure_schema`]
//! before accepting traffic so a fresh database is usable without a separate
//! migration step.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;

const SCHEMA: &str = include_str!("../schema.sql");

pub const MIN_CONNECTIONS: u32 = 1;
pub const MAX_CONNECTIONS: u32 = 10;

/// Create the process-wide connection pool with fixed bounds.
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .min_connections(MIN_CONNECTIONS)
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;

    info!(
        min = MIN_CONNECTIONS,
        max = MAX_CONNECTIONS,
        "database connection pool initialized"
    );
    Ok(pool)
}

/// Apply the platform schema. Idempotent: every statement is IF NOT EXISTS.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA.split(';') {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        sqlx::query(statement).execute(pool).await?;
    }
    info!("database schema ensured");
    Ok(())
}

/// Liveness probe for health endpoints.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_statements_are_single_statements() {
        // The bootstrap splits on ';', so no statement body may contain one.
        let statements: Vec<&str> = SCHEMA
            .split(';')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        assert!(statements.len() > 10);
        for statement in statements {
            assert!(
                statement.starts_with("CREATE TABLE") || statement.starts_with("CREATE INDEX"),
                "unexpected statement: {}",
                &statement[..statement.len().min(40)]
            );
        }
    }
}
