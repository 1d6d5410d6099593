//! INSERT and UPSERT assembly.

use super::{Statement, placeholder_group, require_table};
use crate::error::{OrmError, OrmResult};
use crate::ident::protect;
use crate::value::{FieldMap, Value};

/// Build a multi-row `INSERT ... VALUES (?,?),(?,?)`.
///
/// The column list is taken from the first row. Other rows are not checked
/// against it: each contributes its values for those columns (`NULL` where a
/// column is missing) and any extra fields are ignored.
pub fn build_insert(table: &str, rows: &[FieldMap]) -> OrmResult<Statement> {
    require_table(table)?;
    let Some(first) = rows.first() else {
        return Err(OrmError::invalid_request("insert requires at least one row"));
    };
    if first.is_empty() {
        return Err(OrmError::invalid_request("insert row has no fields"));
    }

    let columns: Vec<&String> = first.keys().collect();
    let group = placeholder_group(columns.len());

    let mut params = Vec::with_capacity(columns.len() * rows.len());
    for row in rows {
        for column in &columns {
            params.push(row.get(column.as_str()).cloned().unwrap_or(Value::Null));
        }
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES {}",
        protect(table),
        column_list(&columns),
        vec![group; rows.len()].join(",")
    );
    Ok(Statement::new(sql, params))
}

/// Build `INSERT ... ON DUPLICATE KEY UPDATE f=?,...`.
///
/// `update_fields` selects which inserted fields are overwritten on conflict;
/// an empty slice means all of them. Insert parameters come first, then the
/// update parameters.
pub fn build_upsert(table: &str, values: &FieldMap, update_fields: &[String]) -> OrmResult<Statement> {
    require_table(table)?;
    if values.is_empty() {
        return Err(OrmError::invalid_request("upsert requires at least one value"));
    }

    let columns: Vec<&String> = values.keys().collect();
    let updates: Vec<&String> = if update_fields.is_empty() {
        columns.clone()
    } else {
        update_fields.iter().collect()
    };

    let mut params: Vec<Value> = values.values().cloned().collect();
    let mut assignments = Vec::with_capacity(updates.len());
    for field in updates {
        let Some(value) = values.get(field.as_str()) else {
            return Err(OrmError::invalid_request(format!(
                "upsert update field '{field}' has no value"
            )));
        };
        assignments.push(format!("{}=?", protect(field)));
        params.push(value.clone());
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES {} ON DUPLICATE KEY UPDATE {}",
        protect(table),
        column_list(&columns),
        placeholder_group(columns.len()),
        assignments.join(",")
    );
    Ok(Statement::new(sql, params))
}

fn column_list(columns: &[&String]) -> String {
    columns
        .iter()
        .map(|c| protect(c))
        .collect::<Vec<_>>()
        .join(",")
}
