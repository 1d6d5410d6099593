//! In-memory recording pool used by the integration tests.

#![allow(dead_code)]

use serde_json::Value;
use sqlchunk::{
    ColumnDefinition, Connector, DbConfig, FieldMap, OrmError, OrmResult, Params, PooledConnection,
    QueryOutput, Row, SqlOptions, SqlPool, UpsertResult,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One statement seen by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// `query`, `execute`, `conn.query`, `conn.execute` or `batch`.
    pub kind: &'static str,
    pub sql: String,
    pub params: Params,
    pub named: bool,
    pub extra: FieldMap,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    outputs: VecDeque<QueryOutput>,
    fail_batch: bool,
    fail_acquire: bool,
    acquired: usize,
    released: usize,
    ended: bool,
}

/// Pool that records every statement and answers queries from a script.
#[derive(Debug, Clone, Default)]
pub struct MockPool {
    state: Arc<Mutex<State>>,
}

impl MockPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the rows returned by the next query.
    pub fn push_rows(&self, rows: Value) {
        let rows = rows
            .as_array()
            .map(|rows| rows.iter().filter_map(|r| r.as_object().cloned()).collect())
            .unwrap_or_default();
        self.push_output(QueryOutput::new(rows));
    }

    pub fn push_output(&self, output: QueryOutput) {
        self.lock().outputs.push_back(output);
    }

    /// Make every batch fail with a driver error.
    pub fn fail_batch(&self) {
        self.lock().fail_batch = true;
    }

    /// Make every connection checkout fail with a driver error.
    pub fn fail_acquire(&self) {
        self.lock().fail_acquire = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn sql(&self) -> Vec<String> {
        self.lock().calls.iter().map(|c| c.sql.clone()).collect()
    }

    pub fn acquired(&self) -> usize {
        self.lock().acquired
    }

    pub fn released(&self) -> usize {
        self.lock().released
    }

    pub fn ended(&self) -> bool {
        self.lock().ended
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn record(&self, kind: &'static str, options: &SqlOptions, params: &Params) {
        self.lock().calls.push(Call {
            kind,
            sql: options.sql.clone(),
            params: params.clone(),
            named: options.named_placeholders,
            extra: options.extra.clone(),
        });
    }

    fn next_output(&self) -> QueryOutput {
        self.lock().outputs.pop_front().unwrap_or_default()
    }
}

fn written(params: &Params) -> UpsertResult {
    UpsertResult {
        affected_rows: 1,
        insert_id: if params.is_empty() { None } else { Some(1) },
        warning_status: 0,
    }
}

impl SqlPool for MockPool {
    type Connection = MockConnection;

    async fn query(&self, sql: &SqlOptions, params: &Params) -> OrmResult<QueryOutput> {
        self.record("query", sql, params);
        Ok(self.next_output())
    }

    async fn execute(&self, sql: &SqlOptions, params: &Params) -> OrmResult<UpsertResult> {
        self.record("execute", sql, params);
        Ok(written(params))
    }

    async fn get_connection(&self) -> OrmResult<MockConnection> {
        if self.lock().fail_acquire {
            return Err(OrmError::driver("too many connections"));
        }
        self.lock().acquired += 1;
        Ok(MockConnection { pool: self.clone() })
    }

    async fn end(&self) -> OrmResult<()> {
        self.lock().ended = true;
        Ok(())
    }
}

#[derive(Debug)]
pub struct MockConnection {
    pool: MockPool,
}

impl PooledConnection for MockConnection {
    async fn query(&mut self, sql: &SqlOptions, params: &Params) -> OrmResult<QueryOutput> {
        self.pool.record("conn.query", sql, params);
        Ok(self.pool.next_output())
    }

    async fn execute(&mut self, sql: &SqlOptions, params: &Params) -> OrmResult<UpsertResult> {
        self.pool.record("conn.execute", sql, params);
        Ok(written(params))
    }

    async fn batch(&mut self, sql: &SqlOptions, groups: &[Vec<Value>]) -> OrmResult<UpsertResult> {
        let flat: Vec<Value> = groups.iter().flatten().cloned().collect();
        self.pool.record("batch", sql, &Params::Positional(flat));
        if self.pool.lock().fail_batch {
            return Err(OrmError::driver("deadlock found when trying to get lock"));
        }
        Ok(UpsertResult {
            affected_rows: groups.len() as u64,
            insert_id: None,
            warning_status: 0,
        })
    }

    fn release(self) {
        self.pool.lock().released += 1;
    }
}

/// Connector handing out one shared [`MockPool`].
#[derive(Clone, Default)]
pub struct MockConnector {
    pub pool: MockPool,
    connects: Arc<AtomicUsize>,
}

impl MockConnector {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl Connector for MockConnector {
    type Pool = MockPool;

    fn connect(&self, _config: &DbConfig) -> OrmResult<MockPool> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.pool.clone())
    }
}

pub fn config() -> DbConfig {
    DbConfig::new("localhost", "app", "shop")
}

pub fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap()
}

pub fn column(name: &str, type_name: &str) -> ColumnDefinition {
    ColumnDefinition {
        name: name.to_string(),
        type_name: type_name.to_string(),
        ..ColumnDefinition::default()
    }
}
