//! Pooled client interface.
//!
//! `sqlchunk` does not speak a wire protocol itself. A driver adapter
//! implements [`SqlPool`] (shared pool), [`PooledConnection`] (one checked-out
//! connection) and [`Connector`] (pool construction from a [`DbConfig`]);
//! [`Database`](crate::Database) issues every statement through them.
//!
//! Adapters report their own failures with [`OrmError::driver`](crate::OrmError::driver)
//! so callers see them unchanged.

use crate::config::DbConfig;
use crate::error::OrmResult;
use crate::value::{FieldMap, Params, Row, Value};
use serde::Serialize;
use std::future::Future;

/// SQL text plus per-statement client options.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlOptions {
    pub sql: String,
    /// Resolve `:name` placeholders against [`Params::Named`].
    pub named_placeholders: bool,
    /// Extra driver-specific options, forwarded untouched.
    pub extra: FieldMap,
}

impl SqlOptions {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            ..Self::default()
        }
    }

    pub fn named_placeholders(mut self, named: bool) -> Self {
        self.named_placeholders = named;
        self
    }

    pub fn extra(mut self, extra: FieldMap) -> Self {
        self.extra = extra;
        self
    }
}

/// Column definition as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnDefinition {
    /// Column name or alias as it appears in the result.
    pub name: String,
    /// Underlying column name, when the driver knows it.
    pub org_name: Option<String>,
    pub table: Option<String>,
    /// Server type name (`BIGINT`, `VARCHAR`, ...).
    pub type_name: String,
}

/// Rows and column metadata returned by a query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryOutput {
    pub rows: Vec<Row>,
    pub columns: Vec<ColumnDefinition>,
}

impl QueryOutput {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            columns: Vec::new(),
        }
    }
}

/// Outcome of a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertResult {
    pub affected_rows: u64,
    /// Generated id of the first inserted row, if any.
    pub insert_id: Option<u64>,
    pub warning_status: u32,
}

impl UpsertResult {
    /// Combine the results of several statements issued for one request.
    pub fn merge(self, other: Self) -> Self {
        Self {
            affected_rows: self.affected_rows + other.affected_rows,
            insert_id: other.insert_id.or(self.insert_id),
            warning_status: self.warning_status + other.warning_status,
        }
    }
}

/// A shared connection pool.
pub trait SqlPool: Send + Sync {
    /// A connection checked out of the pool.
    type Connection: PooledConnection;

    /// Run a statement that returns rows.
    fn query(
        &self,
        sql: &SqlOptions,
        params: &Params,
    ) -> impl Future<Output = OrmResult<QueryOutput>> + Send;

    /// Run a write statement.
    fn execute(
        &self,
        sql: &SqlOptions,
        params: &Params,
    ) -> impl Future<Output = OrmResult<UpsertResult>> + Send;

    /// Check out one connection. It must be handed back with
    /// [`PooledConnection::release`].
    fn get_connection(&self) -> impl Future<Output = OrmResult<Self::Connection>> + Send;

    /// Close the pool.
    fn end(&self) -> impl Future<Output = OrmResult<()>> + Send;
}

/// A single connection checked out of a [`SqlPool`].
pub trait PooledConnection: Send {
    fn query(
        &mut self,
        sql: &SqlOptions,
        params: &Params,
    ) -> impl Future<Output = OrmResult<QueryOutput>> + Send;

    fn execute(
        &mut self,
        sql: &SqlOptions,
        params: &Params,
    ) -> impl Future<Output = OrmResult<UpsertResult>> + Send;

    /// Run one statement once per parameter group.
    fn batch(
        &mut self,
        sql: &SqlOptions,
        groups: &[Vec<Value>],
    ) -> impl Future<Output = OrmResult<UpsertResult>> + Send;

    /// Return the connection to its pool.
    fn release(self);
}

/// Builds a pool from connection settings.
pub trait Connector {
    type Pool: SqlPool;

    fn connect(&self, config: &DbConfig) -> OrmResult<Self::Pool>;
}
