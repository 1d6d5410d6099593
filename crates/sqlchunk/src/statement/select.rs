//! SELECT assembly.

use super::Statement;
use crate::error::{OrmError, OrmResult};
use crate::ident::{protect_field, protect_order};
use crate::value::{FieldMap, OneOrMany, Value};
use crate::where_clause::{CompiledWhere, WhereSpec, compile_where};
use serde::{Deserialize, Deserializer};

/// Join type used when none is given.
pub const DEFAULT_JOIN_TYPE: &str = "LEFT";

/// Execution mode of a SELECT request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Command {
    /// At most one row (`LIMIT 1`).
    FindFirst,
    /// A list of rows, limited by the request's `limit` if any.
    FindMany,
    /// Iterate the whole result set chunk by chunk.
    FindAll,
}

/// Which chunk of a chunked query to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkSelector {
    /// Zero-based window index.
    Index(usize),
    /// Only report the number of windows.
    Count,
}

impl<'de> Deserialize<'de> for ChunkSelector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        match Value::deserialize(deserializer)? {
            Value::Number(n) => {
                let index = n.as_u64().ok_or_else(|| {
                    D::Error::custom("chunk index must be a non-negative integer")
                })?;
                usize::try_from(index)
                    .map(Self::Index)
                    .map_err(|_| D::Error::custom(format!("chunk index out of range: {index}")))
            }
            Value::String(s) if s.eq_ignore_ascii_case("count") => Ok(Self::Count),
            Value::String(s) => s
                .parse()
                .map(Self::Index)
                .map_err(|_| D::Error::custom(format!("invalid chunk selector: {s}"))),
            other => Err(D::Error::custom(format!("invalid chunk selector: {other}"))),
        }
    }
}

fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Option::<OneOrMany<String>>::deserialize(deserializer)
        .map(|v| v.map(OneOrMany::into_vec).unwrap_or_default())
}

/// A declarative SELECT request.
///
/// Deserializes from the JSON request shape (`select`, `from`, `join`,
/// `joinType`, `where`, `whereParams`, `order`, `group`, `limit`, `page`,
/// `offset`, `chunk`, `command`, `options`, `asArray`). String-valued list
/// fields accept either a single string or a list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuerySpec {
    /// SELECT fields (empty means `*`).
    #[serde(deserialize_with = "string_list")]
    pub select: Vec<String>,
    /// FROM sources, comma-joined.
    #[serde(deserialize_with = "string_list")]
    pub from: Vec<String>,
    /// Join sources, each including its ON condition.
    #[serde(deserialize_with = "string_list")]
    pub join: Vec<String>,
    /// A single join type for every join, or one per join.
    pub join_type: Option<OneOrMany<String>>,
    pub r#where: WhereSpec,
    /// Explicit WHERE parameters; replaces parameters derived from `where`.
    pub where_params: Option<Value>,
    #[serde(deserialize_with = "string_list")]
    pub order: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub group: Vec<String>,
    pub limit: Option<u64>,
    pub page: Option<u64>,
    pub offset: Option<u64>,
    pub chunk: Option<ChunkSelector>,
    pub command: Option<Command>,
    /// Extra options forwarded to the pooled client.
    pub options: FieldMap,
    /// Ask the client for rows as arrays instead of objects.
    pub as_array: bool,
}

impl QuerySpec {
    /// Create a request reading from `from`.
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: vec![from.into()],
            ..Self::default()
        }
    }

    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Add a LEFT JOIN (`source` includes the ON condition).
    pub fn join(self, source: impl Into<String>) -> Self {
        self.join_as(DEFAULT_JOIN_TYPE, source)
    }

    /// Add a join of the given type (`INNER`, `RIGHT`, ...).
    pub fn join_as(mut self, join_type: impl Into<String>, source: impl Into<String>) -> Self {
        let mut types = self.join_types();
        types.push(join_type.into());
        self.join.push(source.into());
        self.join_type = Some(OneOrMany::Many(types));
        self
    }

    pub fn filter(mut self, filter: impl Into<WhereSpec>) -> Self {
        self.r#where = filter.into();
        self
    }

    pub fn where_params(mut self, params: Value) -> Self {
        self.where_params = Some(params);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order.push(field.into());
        self
    }

    pub fn group_by(mut self, field: impl Into<String>) -> Self {
        self.group.push(field.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn chunk(mut self, chunk: ChunkSelector) -> Self {
        self.chunk = Some(chunk);
        self
    }

    pub fn command(mut self, command: Command) -> Self {
        self.command = Some(command);
        self
    }

    pub fn as_array(mut self, as_array: bool) -> Self {
        self.as_array = as_array;
        self
    }

    /// Execution mode: explicit, or inferred from `limit`.
    pub fn resolved_command(&self) -> Command {
        self.command.unwrap_or(match self.limit {
            Some(limit) if limit > 1 => Command::FindMany,
            _ => Command::FindFirst,
        })
    }

    /// One join type per join, broadcasting a single type.
    fn join_types(&self) -> Vec<String> {
        match &self.join_type {
            Some(OneOrMany::One(ty)) => vec![ty.clone(); self.join.len()],
            Some(OneOrMany::Many(types)) => (0..self.join.len())
                .map(|i| {
                    types
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| DEFAULT_JOIN_TYPE.to_string())
                })
                .collect(),
            None => vec![DEFAULT_JOIN_TYPE.to_string(); self.join.len()],
        }
    }
}

/// A resolved SELECT, renderable as a plain, base or chunked statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectPlan {
    command: Command,
    chunk: Option<ChunkSelector>,
    /// `SELECT ... FROM ... [JOIN ...]`
    head: String,
    filter: CompiledWhere,
    /// ` GROUP BY ...` / ` ORDER BY ...`
    tail: String,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl SelectPlan {
    pub fn command(&self) -> Command {
        self.command
    }

    /// The chunk to fetch, if this request iterates by chunks.
    pub fn chunk(&self) -> Option<ChunkSelector> {
        self.chunk
    }

    pub fn is_chunked(&self) -> bool {
        self.chunk.is_some()
    }

    /// The statement to run for a non-chunked request.
    pub fn statement(&self) -> Statement {
        let mut stmt = self.base();
        if let Some(limit) = self.limit {
            stmt.sql.push_str(&format!(" LIMIT {limit}"));
            if let Some(offset) = self.offset {
                stmt.sql.push_str(&format!(" OFFSET {offset}"));
            }
        }
        stmt
    }

    /// The statement without LIMIT/OFFSET or chunk predicate.
    ///
    /// Its SQL text is the chunk-table cache key.
    pub fn base(&self) -> Statement {
        Statement::new(
            format!("{} WHERE {}{}", self.head, self.filter.sql, self.tail),
            self.filter.params.clone(),
        )
    }

    /// The base statement restricted to `id BETWEEN start AND end`.
    ///
    /// The filter is parenthesized so an `OR` filter stays scoped to the window.
    pub fn chunked(&self, start: i64, end: i64) -> Statement {
        let mut params = self.filter.params.clone();
        params.push(Value::from(start));
        params.push(Value::from(end));
        Statement::new(
            format!(
                "{} WHERE ({}) AND id BETWEEN ? AND ?{}",
                self.head, self.filter.sql, self.tail
            ),
            params,
        )
    }
}

/// Resolve a [`QuerySpec`] into a [`SelectPlan`].
pub fn build_select(spec: &QuerySpec) -> OrmResult<SelectPlan> {
    let from: Vec<&str> = spec
        .from
        .iter()
        .map(String::as_str)
        .filter(|s| !s.trim().is_empty())
        .collect();
    if from.is_empty() {
        return Err(OrmError::invalid_request("from is required"));
    }

    let fields = if spec.select.is_empty() {
        "*".to_string()
    } else {
        spec.select
            .iter()
            .map(|f| protect_field(f))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut head = format!("SELECT {} FROM {}", fields, from.join(", "));
    for (source, join_type) in spec.join.iter().zip(spec.join_types()) {
        head.push_str(&format!(" {} JOIN {}", join_type.trim(), source));
    }

    let filter = compile_where(&spec.r#where, spec.where_params.clone());

    let mut tail = String::new();
    if !spec.group.is_empty() {
        let group: Vec<String> = spec.group.iter().map(|f| protect_field(f)).collect();
        tail.push_str(" GROUP BY ");
        tail.push_str(&group.join(", "));
    }
    if !spec.order.is_empty() {
        let order: Vec<String> = spec.order.iter().map(|f| protect_order(f)).collect();
        tail.push_str(" ORDER BY ");
        tail.push_str(&order.join(", "));
    }

    let command = spec.resolved_command();
    let chunk = match (command, spec.chunk) {
        (_, Some(chunk)) => Some(chunk),
        (Command::FindAll, None) => Some(ChunkSelector::Index(0)),
        _ => None,
    };
    let limit = match command {
        Command::FindFirst => Some(1),
        Command::FindMany => spec.limit,
        Command::FindAll => None,
    };
    let offset = match (spec.page, limit) {
        (Some(page), Some(limit)) if page > 1 => Some((page - 1).saturating_mul(limit)),
        _ => spec.offset,
    };

    Ok(SelectPlan {
        command,
        chunk,
        head,
        filter,
        tail,
        limit,
        offset,
    })
}
