//! Statement assembly.
//!
//! Turns structured requests into parameterized SQL text with `?`
//! placeholders and an ordered parameter vector.
//!
//! - [`build_select`]: SELECT with field/join/order/group/limit/page resolution
//! - [`build_insert`] / [`build_upsert`]: multi-row INSERT and
//!   `ON DUPLICATE KEY UPDATE`
//! - [`build_update`] / [`build_object_update`]: filtered UPDATE and keyed batch UPDATE
//! - [`build_delete`]: DELETE with a raw WHERE
//!
//! Validation happens before any SQL is produced: a request that is missing a
//! table, a WHERE (for UPDATE/DELETE) or values fails with
//! [`OrmError::InvalidRequest`](crate::OrmError::InvalidRequest).
//!
//! # Example
//!
//! ```ignore
//! use serde_json::json;
//! use sqlchunk::statement::{QuerySpec, build_select};
//!
//! let spec: QuerySpec = serde_json::from_value(json!({
//!     "select": ["id", "order"],
//!     "from": "users",
//!     "where": {"status": "active"},
//!     "order": "id DESC",
//!     "limit": 20,
//!     "page": 3,
//! }))?;
//! let stmt = build_select(&spec)?.statement();
//! assert_eq!(
//!     stmt.sql,
//!     "SELECT id, `order` FROM users WHERE status = ? ORDER BY id DESC LIMIT 20 OFFSET 40"
//! );
//! ```

mod delete;
mod insert;
mod select;
mod update;

pub use delete::build_delete;
pub use insert::{build_insert, build_upsert};
pub use select::{ChunkSelector, Command, QuerySpec, SelectPlan, build_select};
pub use update::{UpdateParams, build_object_update, build_update};

use crate::error::{OrmError, OrmResult};
use crate::value::Value;

/// An assembled statement: SQL text plus positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// One SQL template executed once per parameter group.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchStatement {
    pub sql: String,
    pub groups: Vec<Vec<Value>>,
}

fn require_table(table: &str) -> OrmResult<()> {
    if table.trim().is_empty() {
        return Err(OrmError::invalid_request("table is required"));
    }
    Ok(())
}

/// `(?,?,...)` with `n` placeholders.
fn placeholder_group(n: usize) -> String {
    let mut out = String::with_capacity(n * 2 + 1);
    out.push('(');
    for i in 0..n {
        if i > 0 {
            out.push(',');
        }
        out.push('?');
    }
    out.push(')');
    out
}
