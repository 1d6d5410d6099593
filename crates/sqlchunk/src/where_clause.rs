//! WHERE clause compilation.
//!
//! A [`WhereSpec`] accepts the four shapes callers use to describe a filter:
//!
//! | shape | example | compiled |
//! |-------|---------|----------|
//! | raw fragment | `"age > ?"` | `age > ?` |
//! | list of fragments | `["a = 1", "b = 2"]` | `a = 1 AND b = 2` |
//! | field mapping | `{"a": 1, "order": 2}` | ``a = ? AND `order` = ?`` |
//! | list of mappings | `[{"a": 1}, {"b": 2}]` | `(a = ?) OR (b = ?)` |
//!
//! [`compile_where`] derives the SQL text and the parameter vector from the
//! same borrowed spec in a single pass, so placeholder order and parameter
//! order cannot drift apart.

use crate::ident::protect;
use crate::value::{FieldMap, Value, normalize_params};
use serde::{Deserialize, Deserializer};

/// SQL emitted for an empty filter.
pub const MATCH_ALL: &str = "1 = 1";

/// A WHERE specification.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WhereSpec {
    /// No filter.
    #[default]
    Empty,
    /// Raw SQL fragment, used verbatim.
    Raw(String),
    /// Raw fragments joined with `AND`.
    RawList(Vec<String>),
    /// `field = ?` predicates joined with `AND`, in key order.
    Fields(FieldMap),
    /// Mappings joined with `OR`, each mapping's fields joined with `AND`.
    /// `None` entries are skipped.
    AnyOf(Vec<Option<FieldMap>>),
}

impl WhereSpec {
    /// Create a raw SQL fragment spec.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }

    /// Interpret a JSON value as a WHERE spec.
    ///
    /// Shapes that match none of the variants are coerced to their string
    /// representation and used as a raw fragment.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::String(s) => Self::Raw(s),
            Value::Object(map) => Self::Fields(map),
            Value::Array(items) if items.iter().all(Value::is_string) => Self::RawList(
                items
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            Value::Array(items) if items.iter().all(|v| v.is_object() || v.is_null()) => {
                Self::AnyOf(
                    items
                        .into_iter()
                        .map(|v| match v {
                            Value::Object(map) => Some(map),
                            _ => None,
                        })
                        .collect(),
                )
            }
            other => Self::Raw(fallback_string(&other)),
        }
    }

    /// Whether this spec filters nothing (compiles to [`MATCH_ALL`]).
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Raw(sql) => sql.trim().is_empty(),
            Self::RawList(parts) => parts.iter().all(|p| p.trim().is_empty()),
            Self::Fields(map) => map.is_empty(),
            Self::AnyOf(maps) => maps.iter().flatten().all(FieldMap::is_empty),
        }
    }
}

fn fallback_string(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(fallback_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl From<&str> for WhereSpec {
    fn from(sql: &str) -> Self {
        Self::Raw(sql.to_string())
    }
}

impl From<String> for WhereSpec {
    fn from(sql: String) -> Self {
        Self::Raw(sql)
    }
}

impl From<FieldMap> for WhereSpec {
    fn from(fields: FieldMap) -> Self {
        Self::Fields(fields)
    }
}

impl From<Value> for WhereSpec {
    fn from(value: Value) -> Self {
        Self::from_json(value)
    }
}

impl<'de> Deserialize<'de> for WhereSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_json)
    }
}

/// Compiled WHERE clause: SQL text (without the `WHERE` keyword) and its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledWhere {
    pub sql: String,
    pub params: Vec<Value>,
}

impl CompiledWhere {
    fn match_all() -> Self {
        Self {
            sql: MATCH_ALL.to_string(),
            params: Vec::new(),
        }
    }
}

/// Compile a WHERE spec.
///
/// When `params_override` is given (and not `null`) it replaces the parameters
/// derived from `spec`; a scalar override becomes a one-element list.
pub fn compile_where(spec: &WhereSpec, params_override: Option<Value>) -> CompiledWhere {
    let mut compiled = match spec {
        WhereSpec::Empty => CompiledWhere::match_all(),
        WhereSpec::Raw(sql) => compile_raw(sql),
        WhereSpec::RawList(parts) => compile_raw_list(parts),
        WhereSpec::Fields(fields) => compile_fields(fields),
        WhereSpec::AnyOf(maps) => compile_any_of(maps),
    };

    if let Some(params) = params_override.filter(|v| !v.is_null()) {
        compiled.params = normalize_params(params);
    }
    compiled
}

fn compile_raw(sql: &str) -> CompiledWhere {
    if sql.trim().is_empty() {
        return CompiledWhere::match_all();
    }
    CompiledWhere {
        sql: sql.to_string(),
        params: Vec::new(),
    }
}

fn compile_raw_list(parts: &[String]) -> CompiledWhere {
    let parts: Vec<&str> = parts
        .iter()
        .map(String::as_str)
        .filter(|p| !p.trim().is_empty())
        .collect();
    if parts.is_empty() {
        return CompiledWhere::match_all();
    }
    CompiledWhere {
        sql: parts.join(" AND "),
        params: Vec::new(),
    }
}

fn compile_fields(fields: &FieldMap) -> CompiledWhere {
    let mut params = Vec::with_capacity(fields.len());
    match push_field_predicates(fields, &mut params) {
        Some(sql) => CompiledWhere { sql, params },
        None => CompiledWhere::match_all(),
    }
}

fn compile_any_of(maps: &[Option<FieldMap>]) -> CompiledWhere {
    let mut params = Vec::new();
    let clauses: Vec<String> = maps
        .iter()
        .flatten()
        .filter_map(|fields| push_field_predicates(fields, &mut params))
        .map(|sql| format!("({sql})"))
        .collect();

    if clauses.is_empty() {
        return CompiledWhere::match_all();
    }
    CompiledWhere {
        sql: clauses.join(" OR "),
        params,
    }
}

/// Render `field = ?` for each key and push the values in the same order.
fn push_field_predicates(fields: &FieldMap, params: &mut Vec<Value>) -> Option<String> {
    if fields.is_empty() {
        return None;
    }
    let mut predicates = Vec::with_capacity(fields.len());
    for (field, value) in fields {
        predicates.push(format!("{} = ?", protect(field)));
        params.push(value.clone());
    }
    Some(predicates.join(" AND "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(value: Value) -> WhereSpec {
        WhereSpec::from_json(value)
    }

    fn placeholders(sql: &str) -> usize {
        sql.matches('?').count()
    }

    #[test]
    fn empty_matches_all() {
        let c = compile_where(&WhereSpec::Empty, None);
        assert_eq!(c.sql, "1 = 1");
        assert!(c.params.is_empty());

        assert_eq!(compile_where(&spec(json!({})), None).sql, "1 = 1");
        assert_eq!(compile_where(&spec(json!([])), None).sql, "1 = 1");
        assert_eq!(compile_where(&WhereSpec::raw("  "), None).sql, "1 = 1");
    }

    #[test]
    fn raw_fragment_verbatim() {
        let c = compile_where(&WhereSpec::raw("age > ?"), Some(json!(18)));
        assert_eq!(c.sql, "age > ?");
        assert_eq!(c.params, vec![json!(18)]);

        let c = compile_where(&WhereSpec::raw("deleted_at IS NULL"), None);
        assert_eq!(c.sql, "deleted_at IS NULL");
        assert!(c.params.is_empty());
    }

    #[test]
    fn raw_list_and_joined() {
        let c = compile_where(
            &spec(json!(["a = ?", "b IS NULL"])),
            Some(json!([1])),
        );
        assert_eq!(c.sql, "a = ? AND b IS NULL");
        assert_eq!(c.params, vec![json!(1)]);
    }

    #[test]
    fn mapping_in_key_order() {
        let c = compile_where(&spec(json!({"a": 1, "b": 2})), None);
        assert_eq!(c.sql, "a = ? AND b = ?");
        assert_eq!(c.params, vec![json!(1), json!(2)]);

        let c = compile_where(&spec(json!({"z": "last", "a": "first"})), None);
        assert_eq!(c.sql, "z = ? AND a = ?");
        assert_eq!(c.params, vec![json!("last"), json!("first")]);
    }

    #[test]
    fn mapping_protects_keys() {
        let c = compile_where(&spec(json!({"order": 1, "t.group": 2, "name": "x"})), None);
        assert_eq!(c.sql, "`order` = ? AND t.`group` = ? AND name = ?");
        assert_eq!(c.params.len(), 3);
    }

    #[test]
    fn list_of_mappings_or_joined() {
        let c = compile_where(&spec(json!([{"a": 1}, {"b": 2}])), None);
        assert_eq!(c.sql, "(a = ?) OR (b = ?)");
        assert_eq!(c.params, vec![json!(1), json!(2)]);
    }

    #[test]
    fn list_of_mappings_skips_null() {
        let c = compile_where(
            &spec(json!([{"a": 1, "b": 2}, null, {"c": 3}])),
            None,
        );
        assert_eq!(c.sql, "(a = ? AND b = ?) OR (c = ?)");
        assert_eq!(c.params, vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn override_wins() {
        let c = compile_where(&spec(json!({"a": 1, "b": 2})), Some(json!([9, 8])));
        assert_eq!(c.sql, "a = ? AND b = ?");
        assert_eq!(c.params, vec![json!(9), json!(8)]);

        let c = compile_where(&spec(json!({"a": 1})), Some(Value::Null));
        assert_eq!(c.params, vec![json!(1)]);
    }

    #[test]
    fn unrecognized_shape_coerces_to_string() {
        assert_eq!(spec(json!(42)), WhereSpec::Raw("42".to_string()));
        assert_eq!(spec(json!(true)), WhereSpec::Raw("true".to_string()));
        assert_eq!(
            spec(json!(["a = 1", 2])),
            WhereSpec::Raw("a = 1,2".to_string())
        );
    }

    #[test]
    fn placeholder_parity() {
        let shapes = [
            json!(null),
            json!({"a": 1}),
            json!({"a": 1, "select": "x", "c.d": null}),
            json!([{"a": 1}, {"b": 2, "c": 3}, null, {}]),
            json!([]),
        ];
        for shape in shapes {
            let c = compile_where(&spec(shape.clone()), None);
            assert_eq!(placeholders(&c.sql), c.params.len(), "shape {shape}");
        }
    }

    #[test]
    fn compile_does_not_mutate_input() {
        let where_spec = spec(json!([{"a": 1}, {"b": 2}]));
        let before = where_spec.clone();
        let first = compile_where(&where_spec, None);
        let second = compile_where(&where_spec, None);
        assert_eq!(where_spec, before);
        assert_eq!(first, second);
    }

    #[test]
    fn deserialize_from_request() {
        let parsed: WhereSpec = serde_json::from_value(json!({"status": "active"})).unwrap();
        assert_eq!(parsed, spec(json!({"status": "active"})));
        assert!(!parsed.is_empty());
        assert!(spec(json!([null, {}])).is_empty());
    }
}
