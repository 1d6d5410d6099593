//! UPDATE assembly: filtered updates and keyed batch updates.

use super::{BatchStatement, Statement, require_table};
use crate::error::{OrmError, OrmResult};
use crate::ident::protect;
use crate::value::{FieldMap, OneOrMany, Value};
use crate::where_clause::{WhereSpec, compile_where};
use serde::Deserialize;

/// A filtered UPDATE request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateParams {
    pub table: String,
    /// One value row, or several rows applied against the same filter.
    pub values: OneOrMany<FieldMap>,
    #[serde(default)]
    pub r#where: WhereSpec,
    /// Explicit WHERE parameters; replaces parameters derived from `where`.
    #[serde(default)]
    pub where_params: Option<Value>,
}

impl UpdateParams {
    pub fn new(table: impl Into<String>, values: FieldMap, filter: impl Into<WhereSpec>) -> Self {
        Self {
            table: table.into(),
            values: OneOrMany::One(values),
            r#where: filter.into(),
            where_params: None,
        }
    }

    pub fn where_params(mut self, params: Value) -> Self {
        self.where_params = Some(params);
        self
    }
}

/// Build `UPDATE t SET f=?,... WHERE <filter>`, one statement per value row.
///
/// Value parameters come before WHERE parameters. A non-empty WHERE is required.
pub fn build_update(params: &UpdateParams) -> OrmResult<Vec<Statement>> {
    require_table(&params.table)?;
    if params.r#where.is_empty() {
        return Err(OrmError::invalid_request("update requires a WHERE clause"));
    }
    let rows = params.values.as_slice();
    if rows.is_empty() || rows.iter().any(FieldMap::is_empty) {
        return Err(OrmError::invalid_request("update requires values"));
    }

    let filter = compile_where(&params.r#where, params.where_params.clone());
    let table = protect(&params.table);

    Ok(rows
        .iter()
        .map(|row| {
            let assignments: Vec<String> = row.keys().map(|f| format!("{}=?", protect(f))).collect();
            let mut values: Vec<Value> = row.values().cloned().collect();
            values.extend(filter.params.iter().cloned());
            Statement::new(
                format!("UPDATE {} SET {} WHERE {}", table, assignments.join(","), filter.sql),
                values,
            )
        })
        .collect())
}

/// Build a keyed batch update: `UPDATE t SET f1=?,f2=? WHERE key=?`.
///
/// Every record must contain `key` and the same set of non-key fields as the
/// first record. Each parameter group lists the non-key values in the first
/// record's field order, followed by the key value.
pub fn build_object_update(table: &str, key: &str, records: &[FieldMap]) -> OrmResult<BatchStatement> {
    require_table(table)?;
    if key.trim().is_empty() {
        return Err(OrmError::invalid_request("object update requires a key field"));
    }
    let Some(first) = records.first() else {
        return Err(OrmError::invalid_request("object update requires at least one record"));
    };

    let fields: Vec<&String> = first.keys().filter(|f| f.as_str() != key).collect();
    if fields.is_empty() {
        return Err(OrmError::invalid_request("object update has no fields to set"));
    }

    let mut groups = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let Some(key_value) = record.get(key) else {
            return Err(OrmError::invalid_request(format!(
                "record {i} is missing key field '{key}'"
            )));
        };
        let same_fields = record.len() - 1 == fields.len()
            && fields.iter().all(|f| record.contains_key(f.as_str()));
        if !same_fields {
            return Err(OrmError::invalid_request(format!(
                "record {i} does not have the same fields as record 0"
            )));
        }

        let mut group: Vec<Value> = fields.iter().map(|f| record[f.as_str()].clone()).collect();
        group.push(key_value.clone());
        groups.push(group);
    }

    let assignments: Vec<String> = fields.iter().map(|f| format!("{}=?", protect(f))).collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE {}=?",
        protect(table),
        assignments.join(","),
        protect(key)
    );
    Ok(BatchStatement { sql, groups })
}
