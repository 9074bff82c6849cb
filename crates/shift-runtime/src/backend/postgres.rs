//! PostgreSQL backend.
//!
//! The checkpoint lives in a single-row status table; every write is also
//! appended to a history table. Payloads are UTF-8 SQL scripts executed one
//! statement at a time.

use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres, Row};
use tracing::{debug, warn};

use shift_core::backend::{Backend, BackendFuture};
use shift_core::config::DatabaseConfig;
use shift_core::error::{Result, ShiftError};
use shift_core::migration::{Checkpoint, Direction, Migration, Version};

use crate::db::Database;

/// Advisory lock key ("SHIFT" in ASCII).
const MIGRATION_LOCK_ID: i64 = 0x5348494654;

/// Backend running SQL migrations against PostgreSQL.
pub struct PostgresBackend {
    pool: PgPool,
    status_table: String,
    history_table: String,
}

impl PostgresBackend {
    pub fn new(pool: PgPool, config: &DatabaseConfig) -> Self {
        Self {
            pool,
            status_table: quote_ident(&config.status_table),
            history_table: quote_ident(&config.history_table),
        }
    }

    /// Connect using `config` and make sure the bookkeeping tables exist.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let db = Database::from_config(config).await?;
        db.health_check().await?;

        let backend = Self::new(db.pool().clone(), config);
        backend.ensure_tables().await?;
        Ok(backend)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the status and history tables if they are missing.
    pub async fn ensure_tables(&self) -> Result<()> {
        let status = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id SMALLINT PRIMARY KEY DEFAULT 1 CHECK (id = 1),
                version VARCHAR(255) NOT NULL,
                direction VARCHAR(16) NOT NULL,
                execution_time_secs DOUBLE PRECISION NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            self.status_table
        );
        let history = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                version VARCHAR(255) NOT NULL,
                name TEXT NOT NULL,
                direction VARCHAR(16) NOT NULL,
                execution_time_secs DOUBLE PRECISION NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            self.history_table
        );

        for sql in [status, history] {
            sqlx::query(&sql).execute(&self.pool).await.map_err(|e| {
                ShiftError::Backend(format!("Failed to create bookkeeping table: {}", e))
            })?;
        }
        Ok(())
    }

    /// Take the session-level advisory lock on a dedicated connection.
    ///
    /// Blocks until no other holder remains. Call [`MigrationLock::release`]
    /// when done; a guard dropped without it closes its connection, which
    /// ends the session and with it the lock.
    pub async fn lock(&self) -> Result<MigrationLock> {
        debug!("Acquiring migration lock...");
        let mut conn = self.pool.acquire().await.map_err(|e| {
            ShiftError::Backend(format!("Failed to acquire lock connection: {}", e))
        })?;

        sqlx::query("SELECT pg_advisory_lock($1)")
            .bind(MIGRATION_LOCK_ID)
            .execute(&mut *conn)
            .await
            .map_err(|e| ShiftError::Backend(format!("Failed to acquire migration lock: {}", e)))?;

        debug!("Migration lock acquired");
        Ok(MigrationLock { conn: Some(conn) })
    }
}

/// A held migration advisory lock.
pub struct MigrationLock {
    conn: Option<PoolConnection<Postgres>>,
}

impl MigrationLock {
    pub async fn release(mut self) -> Result<()> {
        let Some(mut conn) = self.conn.take() else {
            return Ok(());
        };

        let unlocked = sqlx::query("SELECT pg_advisory_unlock($1)")
            .bind(MIGRATION_LOCK_ID)
            .execute(&mut *conn)
            .await;

        if let Err(e) = unlocked {
            // Ending the session is the only other way to drop the lock
            drop(conn.detach());
            return Err(ShiftError::Backend(format!(
                "Failed to release migration lock: {}",
                e
            )));
        }
        debug!("Migration lock released");
        Ok(())
    }
}

impl Drop for MigrationLock {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            warn!("Migration lock dropped without release; closing its connection");
            drop(conn.detach());
        }
    }
}

impl Backend for PostgresBackend {
    fn extension(&self) -> &str {
        "sql"
    }

    fn checkpoint(&self) -> BackendFuture<'_, Checkpoint> {
        Box::pin(async move {
            let sql = format!(
                "SELECT version, direction FROM {} WHERE id = 1",
                self.status_table
            );
            let row = sqlx::query(&sql)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| ShiftError::Backend(format!("Failed to read checkpoint: {}", e)))?;

            let Some(row) = row else {
                return Ok(Checkpoint::default());
            };

            let version: String = row.try_get("version")?;
            let direction: String = row.try_get("direction")?;
            let direction: Direction = direction.parse()?;

            Ok(Checkpoint::new(Version::new(version), direction))
        })
    }

    fn set_checkpoint<'a>(
        &'a self,
        migration: &'a Migration,
        duration: Duration,
    ) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            let secs = duration.as_secs_f64();
            let direction = migration.direction.as_word();
            let mut tx = self.pool.begin().await?;

            let upsert = format!(
                r#"
                INSERT INTO {} (id, version, direction, execution_time_secs, applied_at)
                VALUES (1, $1, $2, $3, NOW())
                ON CONFLICT (id) DO UPDATE SET
                    version = EXCLUDED.version,
                    direction = EXCLUDED.direction,
                    execution_time_secs = EXCLUDED.execution_time_secs,
                    applied_at = EXCLUDED.applied_at
                "#,
                self.status_table
            );
            sqlx::query(&upsert)
                .bind(migration.version.as_str())
                .bind(direction)
                .bind(secs)
                .execute(&mut *tx)
                .await
                .map_err(|e| ShiftError::Backend(format!("Failed to write checkpoint: {}", e)))?;

            let insert = format!(
                "INSERT INTO {} (version, name, direction, execution_time_secs) VALUES ($1, $2, $3, $4)",
                self.history_table
            );
            sqlx::query(&insert)
                .bind(migration.version.as_str())
                .bind(&migration.name)
                .bind(direction)
                .bind(secs)
                .execute(&mut *tx)
                .await
                .map_err(|e| ShiftError::Backend(format!("Failed to write history: {}", e)))?;

            tx.commit().await?;
            Ok(())
        })
    }

    fn execute_migration<'a>(&'a self, payload: &'a [u8]) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            let sql = std::str::from_utf8(payload).map_err(|e| {
                ShiftError::Backend(format!("Migration payload is not valid UTF-8: {}", e))
            })?;

            let statements = split_sql_statements(sql);
            if statements.is_empty() {
                warn!("Migration payload contains no statements");
            }

            for statement in statements {
                sqlx::query(&statement)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| ShiftError::Backend(e.to_string()))?;
            }
            Ok(())
        })
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Split SQL into individual statements.
///
/// Semicolons inside single-quoted literals, quoted identifiers,
/// dollar-quoted bodies and comments do not end a statement. Statements
/// that consist only of comments are dropped.
pub fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                current.push(c);
                // Doubled quotes re-enter the loop as an empty quoted run
                for next in chars.by_ref() {
                    current.push(next);
                    if next == c {
                        break;
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                current.push(c);
                for next in chars.by_ref() {
                    current.push(next);
                    if next == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                current.push(c);
                let mut prev = '\0';
                for next in chars.by_ref() {
                    current.push(next);
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            '$' => {
                current.push(c);
                let mut tag = String::from("$");
                while let Some(&next) = chars.peek() {
                    if next.is_alphanumeric() || next == '_' {
                        tag.push(next);
                        current.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }

                if chars.peek() == Some(&'$') {
                    chars.next();
                    tag.push('$');
                    current.push('$');

                    // Consume the body up to the matching closing tag
                    let mut body = String::new();
                    for next in chars.by_ref() {
                        body.push(next);
                        current.push(next);
                        if body.ends_with(&tag) {
                            break;
                        }
                    }
                }
            }
            ';' => {
                push_statement(&mut statements, &current);
                current.clear();
            }
            _ => current.push(c),
        }
    }

    push_statement(&mut statements, &current);
    statements
}

fn push_statement(statements: &mut Vec<String>, raw: &str) {
    let statement = raw.trim();
    let only_comments = statement.lines().all(|l| {
        let l = l.trim();
        l.is_empty() || l.starts_with("--")
    });

    if !statement.is_empty() && !only_comments {
        statements.push(statement.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple_statements() {
        let stmts = split_sql_statements("SELECT 1; SELECT 2; SELECT 3;");
        assert_eq!(stmts, ["SELECT 1", "SELECT 2", "SELECT 3"]);
    }

    #[test]
    fn test_split_without_trailing_semicolon() {
        let stmts = split_sql_statements("SELECT 1;\nSELECT 2");
        assert_eq!(stmts, ["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_split_with_dollar_quoted_function() {
        let sql = r#"
CREATE FUNCTION test() RETURNS void AS $$
BEGIN
    SELECT 1;
    SELECT 2;
END;
$$ LANGUAGE plpgsql;

SELECT 3;
"#;
        let stmts = split_sql_statements(sql);
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].contains("CREATE FUNCTION"));
        assert!(stmts[0].contains("$$ LANGUAGE plpgsql"));
        assert!(stmts[1].contains("SELECT 3"));
    }

    #[test]
    fn test_split_with_tagged_dollar_quote() {
        let sql = "DO $body$ BEGIN PERFORM 1; END $body$; SELECT $1;";
        let stmts = split_sql_statements(sql);
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0], "DO $body$ BEGIN PERFORM 1; END $body$");
        assert_eq!(stmts[1], "SELECT $1");
    }

    #[test]
    fn test_split_ignores_semicolons_in_literals_and_comments() {
        let sql = "INSERT INTO t VALUES ('a;b', 'it''s');\n-- note; still a comment\nSELECT \"x;y\" FROM t; /* a; b */ SELECT 1;";
        let stmts = split_sql_statements(sql);
        assert_eq!(stmts.len(), 3);
        assert_eq!(stmts[0], "INSERT INTO t VALUES ('a;b', 'it''s')");
        assert!(stmts[1].ends_with("SELECT \"x;y\" FROM t"));
        assert!(stmts[2].contains("SELECT 1"));
    }

    #[test]
    fn test_split_drops_comment_only_blocks() {
        let stmts = split_sql_statements("-- nothing here\n;\n  ;SELECT 1;");
        assert_eq!(stmts, ["SELECT 1"]);
    }

    #[test]
    fn test_split_empty_payload() {
        assert!(split_sql_statements("").is_empty());
        assert!(split_sql_statements("   \n").is_empty());
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("shift_status"), "\"shift_status\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }
}
