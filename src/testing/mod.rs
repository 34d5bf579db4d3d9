use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::app::AppState;
use crate::database::{Database, DatabaseError, QueryOutcome, Transaction};
use crate::scope::Identity;
use crate::statement::Statement;

/// Something the handlers asked of the database, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Execute(Statement),
    Begin,
    Commit,
    Rollback,
}

#[derive(Default)]
struct Script {
    outcomes: VecDeque<Result<QueryOutcome, DatabaseError>>,
    events: Vec<Recorded>,
    ping_fails: bool,
}

/// In-memory [`Database`] that replays scripted outcomes and records every
/// statement. Unscripted statements affect zero rows.
#[derive(Clone, Default)]
pub struct FakeDatabase {
    script: Arc<Mutex<Script>>,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AppState {
        AppState {
            db: Arc::new(self.clone()),
        }
    }

    pub fn push_rows(&self, rows: Vec<Value>) {
        let rows = rows.into_iter().filter_map(|row| row.as_object().cloned()).collect();
        self.push(Ok(QueryOutcome::with_rows(rows)));
    }

    pub fn push_affected(&self, row_count: u64) {
        self.push(Ok(QueryOutcome::affected(row_count)));
    }

    pub fn push_error(&self, err: DatabaseError) {
        self.push(Err(err));
    }

    pub fn fail_ping(&self) {
        self.script.lock().unwrap().ping_fails = true;
    }

    pub fn events(&self) -> Vec<Recorded> {
        self.script.lock().unwrap().events.clone()
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Recorded::Execute(statement) => Some(statement),
                _ => None,
            })
            .collect()
    }

    fn push(&self, outcome: Result<QueryOutcome, DatabaseError>) {
        self.script.lock().unwrap().outcomes.push_back(outcome);
    }

    fn record(&self, event: Recorded) {
        self.script.lock().unwrap().events.push(event);
    }

    fn next(&self, statement: &Statement) -> Result<QueryOutcome, DatabaseError> {
        let mut script = self.script.lock().unwrap();
        script.events.push(Recorded::Execute(statement.clone()));
        script.outcomes.pop_front().unwrap_or_else(|| Ok(QueryOutcome::default()))
    }
}

#[async_trait]
impl Database for FakeDatabase {
    async fn execute(&self, statement: &Statement) -> Result<QueryOutcome, DatabaseError> {
        self.next(statement)
    }

    async fn begin(&self) -> Result<Box<dyn Transaction>, DatabaseError> {
        self.record(Recorded::Begin);
        Ok(Box::new(FakeTransaction { db: self.clone() }))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        if self.script.lock().unwrap().ping_fails {
            return Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

struct FakeTransaction {
    db: FakeDatabase,
}

#[async_trait]
impl Transaction for FakeTransaction {
    async fn execute(&mut self, statement: &Statement) -> Result<QueryOutcome, DatabaseError> {
        self.db.next(statement)
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        self.db.record(Recorded::Commit);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DatabaseError> {
        self.db.record(Recorded::Rollback);
        Ok(())
    }
}

pub fn identity(id: i64, role: &str) -> Identity {
    Identity {
        id,
        role: role.to_string(),
    }
}
