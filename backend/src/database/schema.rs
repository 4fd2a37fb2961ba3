//! Schema migrations
//!
//! Connection settings (WAL, foreign keys, busy timeout) belong to the pool's
//! connect options. This module only tracks which migrations a database has
//! seen and applies the missing ones in order.

use crate::error::{AppError, Result};
use sqlx::sqlite::SqlitePool;

/// Known migrations, ascending by version
const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("migrations/001_initial_schema.sql"))];

/// Highest schema version this build understands
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map(|(version, _)| *version).unwrap_or(0)
}

/// Bring the schema up to date.
///
/// A database written by a newer build is refused rather than opened.
pub async fn initialize_database(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    let found = current_version(pool).await?;
    let supported = latest_version();
    if found > supported {
        tracing::error!(
            "Database schema version {} is newer than supported version {}",
            found,
            supported
        );
        return Err(AppError::SchemaTooNew { found, supported });
    }

    tracing::info!("Database schema at version {} of {}", found, supported);

    for &(version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > found) {
        let mut tx = pool.begin().await?;

        sqlx::raw_sql(sql).execute(&mut *tx).await?;
        sqlx::query("INSERT INTO migrations (version) VALUES (?)")
            .bind(version)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!("Applied migration {}", version);
    }

    Ok(())
}

async fn current_version(pool: &SqlitePool) -> Result<i64> {
    let version = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM migrations")
        .fetch_one(pool)
        .await?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create_memory_pool;

    #[test]
    fn test_migrations_are_ascending() {
        assert!(MIGRATIONS.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(MIGRATIONS.first().map(|(v, _)| *v), Some(1));
    }

    #[tokio::test]
    async fn test_fresh_database_is_at_latest_version() {
        let pool = create_memory_pool().await.unwrap();

        assert_eq!(current_version(&pool).await.unwrap(), latest_version());

        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
             AND name IN ('records', 'tags', 'record_tags', 'users', 'comments')",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(tables, 5);
    }

    #[tokio::test]
    async fn test_initialize_is_repeatable() {
        let pool = create_memory_pool().await.unwrap();

        initialize_database(&pool).await.unwrap();

        let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM migrations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(applied, MIGRATIONS.len() as i64);
    }

    #[tokio::test]
    async fn test_newer_schema_is_refused() {
        let pool = create_memory_pool().await.unwrap();
        sqlx::query("INSERT INTO migrations (version) VALUES (?)")
            .bind(latest_version() + 1)
            .execute(&pool)
            .await
            .unwrap();

        let err = initialize_database(&pool).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::SchemaTooNew { found, supported }
                if found == latest_version() + 1 && supported == latest_version()
        ));
    }

    #[tokio::test]
    async fn test_foreign_keys_come_from_pool_options() {
        let pool = create_memory_pool().await.unwrap();

        let foreign_keys: i32 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(foreign_keys, 1);
    }
}
