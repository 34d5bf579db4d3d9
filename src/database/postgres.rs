use std::time::Instant;

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::{Either, Executor, PgPool, Postgres};
use tracing::{debug, warn};

use super::convert::{bind_param, row_to_json};
use super::executor::{Database, QueryOutcome, Transaction};
use super::manager::DatabaseError;
use crate::config::DatabaseConfig;
use crate::statement::Statement;

#[derive(Debug, Clone, Copy)]
struct QueryLogging {
    enabled: bool,
    slow_warning: bool,
    slow_threshold_ms: u64,
}

impl From<&DatabaseConfig> for QueryLogging {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            enabled: config.enable_query_logging,
            slow_warning: config.enable_slow_query_warning,
            slow_threshold_ms: config.slow_query_threshold_ms,
        }
    }
}

/// [`Database`] backed by a sqlx Postgres pool.
#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
    logging: QueryLogging,
}

impl PgDatabase {
    pub fn new(pool: PgPool, config: &DatabaseConfig) -> Self {
        Self {
            pool,
            logging: QueryLogging::from(config),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
    logging: QueryLogging,
}

async fn run<'e, E>(executor: E, statement: &'e Statement, logging: QueryLogging) -> Result<QueryOutcome, DatabaseError>
where
    E: Executor<'e, Database = Postgres>,
{
    if logging.enabled {
        // Parameter values stay out of the logs.
        debug!(sql = %statement.sql, params = statement.params.len(), "executing statement");
    }
    let started = Instant::now();

    let mut query = sqlx::query(&statement.sql);
    for param in &statement.params {
        query = bind_param(query, param);
    }

    let mut outcome = QueryOutcome::default();
    let mut stream = query.fetch_many(executor);
    while let Some(item) = stream.try_next().await.map_err(DatabaseError::classify)? {
        match item {
            Either::Left(done) => outcome.row_count += done.rows_affected(),
            Either::Right(row) => outcome.rows.push(row_to_json(&row)),
        }
    }

    let elapsed_ms = started.elapsed().as_millis() as u64;
    if logging.slow_warning && elapsed_ms > logging.slow_threshold_ms {
        warn!(sql = %statement.sql, elapsed_ms, "slow statement");
    }
    Ok(outcome)
}

#[async_trait]
impl Database for PgDatabase {
    async fn execute(&self, statement: &Statement) -> Result<QueryOutcome, DatabaseError> {
        run(&self.pool, statement, self.logging).await
    }

    async fn begin(&self) -> Result<Box<dyn Transaction>, DatabaseError> {
        let tx = self.pool.begin().await.map_err(DatabaseError::classify)?;
        Ok(Box::new(PgTransaction {
            tx,
            logging: self.logging,
        }))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn execute(&mut self, statement: &Statement) -> Result<QueryOutcome, DatabaseError> {
        run(&mut *self.tx, statement, self.logging).await
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        self.tx.commit().await.map_err(DatabaseError::classify)
    }

    async fn rollback(self: Box<Self>) -> Result<(), DatabaseError> {
        self.tx.rollback().await.map_err(DatabaseError::classify)
    }
}
