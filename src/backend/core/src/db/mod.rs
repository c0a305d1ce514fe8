//! Database layer for Kinetic.
//!
//! PostgreSQL through sqlx. Queries are grouped per entity in the submodules,
//! each adding an `impl Database` block.

use serde::Serialize;
use sqlx::{postgres::PgPoolOptions, Encode, PgPool, Postgres, QueryBuilder, Type};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::config::DatabaseConfig;
use crate::error::Result;

pub mod exercises;
pub mod models;
pub mod routines;
pub mod seed;
pub mod sessions;
pub mod users;

pub use models::*;

/// Database connection and operations.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a connection pool and verify it can connect.
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let pool = Self::pool_options(config).connect(&config.url).await?;
        info!(max_connections = config.max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create a pool that connects on first use.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self> {
        let pool = Self::pool_options(config).connect_lazy(&config.url)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
    }

    /// Run migrations.
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations...");
        let start = Instant::now();
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Database migration failed");
                e
            })?;
        info!(
            duration_ms = start.elapsed().as_millis() as u64,
            "Database migrations completed"
        );
        Ok(())
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check connectivity with a trivial query, returning its latency.
    pub async fn ping(&self) -> Result<Duration> {
        let start = Instant::now();
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Database connectivity check failed");
                e
            })?;

        let latency = start.elapsed();
        if latency > Duration::from_millis(100) {
            warn!(
                latency_ms = latency.as_millis() as u64,
                "Database connectivity check latency is high"
            );
        }
        Ok(latency)
    }

    pub fn pool_stats(&self) -> PoolStats {
        let size = self.pool.size();
        let idle = self.pool.num_idle() as u32;
        PoolStats {
            size,
            idle,
            active: size.saturating_sub(idle),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PoolStats {
    pub size: u32,
    pub idle: u32,
    pub active: u32,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Partial Updates
// ═══════════════════════════════════════════════════════════════════════════════

/// Builds `UPDATE <table> SET ...` from the columns a caller actually supplied.
pub(crate) struct Assignments<'args> {
    builder: QueryBuilder<'args, Postgres>,
    count: usize,
}

impl<'args> Assignments<'args> {
    pub fn new(table: &str) -> Self {
        Self {
            builder: QueryBuilder::new(format!("UPDATE {table} SET ")),
            count: 0,
        }
    }

    fn column(&mut self, column: &str) {
        if self.count > 0 {
            self.builder.push(", ");
        }
        self.builder.push(column).push(" = ");
        self.count += 1;
    }

    pub fn set<T>(&mut self, column: &str, value: Patch<T>) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        match value {
            Patch::Keep => {}
            Patch::Set(v) => {
                self.column(column);
                self.builder.push_bind(v);
            }
            Patch::Clear => {
                self.column(column);
                self.builder.push("NULL");
            }
        }
        self
    }

    /// Assign a SQL expression, e.g. `NOW()`.
    pub fn set_expr(&mut self, column: &str, expr: &str) -> &mut Self {
        self.column(column);
        self.builder.push(expr);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Append the WHERE clause head; callers push conditions and `RETURNING`.
    pub fn where_clause(mut self) -> QueryBuilder<'args, Postgres> {
        self.builder.push(" WHERE ");
        self.builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignments_sql() {
        let mut set = Assignments::new("users");
        set.set("username", Patch::Set("ada".to_string()))
            .set::<i32>("age", Patch::Keep)
            .set::<f64>("weight", Patch::Clear)
            .set_expr("updated_at", "NOW()");
        assert!(!set.is_empty());

        let mut query = set.where_clause();
        query.push("id = ").push_bind(7).push(" RETURNING *");
        assert_eq!(
            query.sql(),
            "UPDATE users SET username = $1, weight = NULL, updated_at = NOW() WHERE id = $2 RETURNING *"
        );
    }

    #[test]
    fn test_empty_assignments() {
        let mut set = Assignments::new("routines");
        set.set::<String>("name", Patch::Keep);
        assert!(set.is_empty());
    }
}
