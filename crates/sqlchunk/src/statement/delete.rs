//! DELETE assembly.

use super::{Statement, require_table};
use crate::error::{OrmError, OrmResult};
use crate::ident::protect;
use crate::value::Value;

/// Build `DELETE FROM t WHERE <filter>`.
///
/// The filter is a raw SQL fragment and `params` are bound positionally as
/// given; both table and filter are required.
pub fn build_delete(table: &str, filter: &str, params: Vec<Value>) -> OrmResult<Statement> {
    require_table(table)?;
    if filter.trim().is_empty() {
        return Err(OrmError::invalid_request("delete requires a WHERE clause"));
    }
    Ok(Statement::new(
        format!("DELETE FROM {} WHERE {}", protect(table), filter),
        params,
    ))
}
