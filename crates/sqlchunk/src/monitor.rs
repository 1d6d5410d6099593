//! Statement classification and `tracing` output.
//!
//! Every statement issued through [`Database`](crate::Database) is logged at
//! `DEBUG` on the `sqlchunk.sql` target before it runs, with the SQL truncated
//! to [`MAX_LOGGED_SQL`] bytes.

use regex::Regex;
use std::sync::LazyLock;

/// Longest SQL prefix written to logs.
pub const MAX_LOGGED_SQL: usize = 200;

static LIMIT_ONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\blimit\s+1\b").expect("valid LIMIT 1 pattern")
});

/// The type of SQL operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    /// Anything else (transaction control, DDL, ...)
    Other,
}

impl QueryType {
    /// Detect query type from the statement's leading keyword.
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = sql.trim_start().trim_start_matches('(');
        if starts_with_keyword(trimmed, "SELECT") {
            QueryType::Select
        } else if starts_with_keyword(trimmed, "INSERT") || starts_with_keyword(trimmed, "REPLACE")
        {
            QueryType::Insert
        } else if starts_with_keyword(trimmed, "UPDATE") {
            QueryType::Update
        } else if starts_with_keyword(trimmed, "DELETE") {
            QueryType::Delete
        } else if starts_with_keyword(trimmed, "WITH") {
            Self::from_cte_body(trimmed)
        } else {
            QueryType::Other
        }
    }

    /// Classify `WITH name AS (...) <statement>` by the statement after the
    /// last top-level closing parenthesis. Quoted text is skipped.
    fn from_cte_body(sql: &str) -> Self {
        let mut depth = 0usize;
        let mut body_start = 0;
        let mut quote: Option<char> = None;
        let mut escaped = false;

        for (pos, c) in sql.char_indices() {
            if let Some(q) = quote {
                if escaped {
                    escaped = false;
                } else if c == '\\' && q != '`' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
                continue;
            }
            match c {
                '\'' | '"' | '`' => quote = Some(c),
                '(' => depth += 1,
                ')' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        body_start = pos + 1;
                    }
                }
                _ => {}
            }
        }

        let body = sql[body_start..].trim_start();
        match Self::from_sql(body) {
            QueryType::Other => QueryType::Select,
            other => other,
        }
    }
}

fn starts_with_keyword(sql: &str, keyword: &str) -> bool {
    sql.get(..keyword.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
        && sql[keyword.len()..]
            .chars()
            .next()
            .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '_'))
}

/// Whether the statement restricts its result to a single row (`LIMIT 1`).
pub fn is_limit_one(sql: &str) -> bool {
    LIMIT_ONE.is_match(sql)
}

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// Log a statement about to be issued.
pub(crate) fn log_statement(sql: &str, param_count: usize) {
    tracing::debug!(
        target: "sqlchunk.sql",
        query_type = ?QueryType::from_sql(sql),
        param_count,
        sql = %truncate_sql_bytes(sql, MAX_LOGGED_SQL),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_type_detection() {
        assert_eq!(QueryType::from_sql("  select * from t"), QueryType::Select);
        assert_eq!(QueryType::from_sql("(SELECT 1) UNION (SELECT 2)"), QueryType::Select);
        assert_eq!(QueryType::from_sql("INSERT INTO t VALUES (1)"), QueryType::Insert);
        assert_eq!(QueryType::from_sql("update t set a=1"), QueryType::Update);
        assert_eq!(QueryType::from_sql("DELETE FROM t"), QueryType::Delete);
        assert_eq!(QueryType::from_sql("SELECTED"), QueryType::Other);
        assert_eq!(QueryType::from_sql("BEGIN"), QueryType::Other);
    }

    #[test]
    fn cte_classified_by_final_statement() {
        let read = "WITH recent AS (SELECT id FROM orders WHERE day > :day) SELECT * FROM recent";
        assert_eq!(QueryType::from_sql(read), QueryType::Select);

        let write = "WITH a AS (SELECT 1), b AS (SELECT ')' AS p) DELETE FROM t WHERE id IN (SELECT * FROM a)";
        assert_eq!(QueryType::from_sql(write), QueryType::Delete);

        let update = "with stale as (select id from t where note = 'it''s (old') update t set x = 1";
        assert_eq!(QueryType::from_sql(update), QueryType::Update);
    }

    #[test]
    fn limit_one_word_boundaries() {
        assert!(is_limit_one("SELECT * FROM t LIMIT 1"));
        assert!(is_limit_one("select * from t limit   1 offset 20"));
        assert!(!is_limit_one("SELECT * FROM t LIMIT 10"));
        assert!(!is_limit_one("SELECT * FROM t LIMIT 2"));
        assert!(!is_limit_one("SELECT nolimit 1 FROM t"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_sql_bytes("abc", 10), "abc");
        assert_eq!(truncate_sql_bytes("abcdef", 3), "abc");
        assert_eq!(truncate_sql_bytes("aé", 2), "a");
    }
}
