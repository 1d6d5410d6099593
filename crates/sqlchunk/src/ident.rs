//! Identifier protection.
//!
//! [`protect`] decides whether a column/table token has to be wrapped in
//! backticks so the server does not misread it as a keyword or reject it for
//! special characters.
//!
//! - Already-quoted tokens pass through unchanged
//! - Dotted paths (`table.field`) are protected part by part
//! - Reserved words and tokens outside `[A-Za-z0-9_]` are quoted
//!
//! # Example
//! ```ignore
//! use sqlchunk::protect;
//!
//! assert_eq!(protect("users.order"), "users.`order`");
//! assert_eq!(protect("created_at"), "created_at");
//! ```

/// Character used to quote identifiers.
pub const QUOTE: char = '`';

/// Words that are always quoted when used as identifiers (compared case-insensitively).
///
/// Kept sorted so lookups can binary search.
pub const RESERVED_WORDS: &[&str] = &[
    "add",
    "all",
    "alter",
    "and",
    "as",
    "asc",
    "between",
    "by",
    "case",
    "change",
    "check",
    "column",
    "create",
    "cross",
    "database",
    "default",
    "delete",
    "desc",
    "describe",
    "distinct",
    "div",
    "drop",
    "else",
    "exists",
    "explain",
    "false",
    "fetch",
    "for",
    "force",
    "foreign",
    "from",
    "fulltext",
    "grant",
    "group",
    "having",
    "if",
    "ignore",
    "in",
    "index",
    "inner",
    "insert",
    "interval",
    "into",
    "is",
    "join",
    "key",
    "keys",
    "kill",
    "left",
    "like",
    "limit",
    "lines",
    "load",
    "lock",
    "match",
    "natural",
    "not",
    "null",
    "on",
    "option",
    "or",
    "order",
    "outer",
    "partition",
    "primary",
    "range",
    "read",
    "references",
    "regexp",
    "rename",
    "replace",
    "require",
    "restrict",
    "right",
    "rlike",
    "schema",
    "select",
    "set",
    "show",
    "spatial",
    "sql",
    "table",
    "then",
    "to",
    "trigger",
    "true",
    "union",
    "unique",
    "unlock",
    "unsigned",
    "update",
    "usage",
    "use",
    "using",
    "values",
    "when",
    "where",
    "with",
    "write",
    "xor",
];

/// Check whether `word` is in [`RESERVED_WORDS`], ignoring ASCII case.
pub fn is_reserved(word: &str) -> bool {
    let lower = word.to_ascii_lowercase();
    RESERVED_WORDS.binary_search(&lower.as_str()).is_ok()
}

fn is_quoted(name: &str) -> bool {
    name.len() > 1 && name.starts_with(QUOTE) && name.ends_with(QUOTE)
}

fn is_plain(name: &str) -> bool {
    name.chars().all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Quote `name` if it is reserved or contains characters outside `[A-Za-z0-9_]`.
///
/// Idempotent: `protect(&protect(x)) == protect(x)`.
pub fn protect(name: &str) -> String {
    if name.is_empty() || is_quoted(name) {
        return name.to_string();
    }

    if name.contains('.') {
        return name.split('.').map(protect).collect::<Vec<_>>().join(".");
    }

    if is_reserved(name) || !is_plain(name) {
        return quote(name);
    }

    name.to_string()
}

fn quote(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push(QUOTE);
    for ch in name.chars() {
        if ch == QUOTE {
            out.push(QUOTE);
        }
        out.push(ch);
    }
    out.push(QUOTE);
    out
}

/// Protect a field from a select/group/order list.
///
/// `*`, `table.*`, function calls and aliased expressions are passed through
/// verbatim.
pub(crate) fn protect_field(field: &str) -> String {
    if is_passthrough(field) {
        field.to_string()
    } else {
        protect(field)
    }
}

/// Protect an ORDER BY entry: only the column is protected, the direction is
/// kept as written.
pub(crate) fn protect_order(field: &str) -> String {
    if is_passthrough(field) {
        return field.to_string();
    }

    let mut tokens = field.split_whitespace();
    let Some(column) = tokens.next() else {
        return field.to_string();
    };
    let rest: Vec<&str> = tokens.collect();
    if rest.is_empty() {
        protect(column)
    } else {
        format!("{} {}", protect(column), rest.join(" "))
    }
}

fn is_passthrough(field: &str) -> bool {
    field == "*"
        || field.ends_with(".*")
        || field.contains('(')
        || field.to_ascii_lowercase().contains(" as ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_words_sorted() {
        let mut sorted = RESERVED_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, RESERVED_WORDS);
    }

    #[test]
    fn protect_plain() {
        assert_eq!(protect("users"), "users");
        assert_eq!(protect("created_at"), "created_at");
        assert_eq!(protect("Col1"), "Col1");
    }

    #[test]
    fn protect_reserved() {
        assert_eq!(protect("order"), "`order`");
        assert_eq!(protect("GROUP"), "`GROUP`");
        assert_eq!(protect("Limit"), "`Limit`");
    }

    #[test]
    fn protect_every_reserved_word() {
        for word in RESERVED_WORDS {
            assert_eq!(protect(word), format!("`{word}`"));
            let upper = word.to_ascii_uppercase();
            assert_eq!(protect(&upper), format!("`{upper}`"));
        }
    }

    #[test]
    fn protect_special_chars() {
        assert_eq!(protect("first name"), "`first name`");
        assert_eq!(protect("price-usd"), "`price-usd`");
        assert_eq!(protect("naïve"), "`naïve`");
    }

    #[test]
    fn protect_dotted() {
        assert_eq!(protect("users.order"), "users.`order`");
        assert_eq!(protect("t.id"), "t.id");
        assert_eq!(protect("db.select.where"), "db.`select`.`where`");
    }

    #[test]
    fn protect_already_quoted() {
        assert_eq!(protect("`order`"), "`order`");
        assert_eq!(protect("`weird name`"), "`weird name`");
    }

    #[test]
    fn protect_doubles_embedded_quote() {
        assert_eq!(protect("a`b"), "`a``b`");
    }

    #[test]
    fn protect_idempotent() {
        for name in [
            "users",
            "order",
            "users.order",
            "first name",
            "a`b",
            "x.y z",
            "",
            "`",
        ] {
            let once = protect(name);
            assert_eq!(protect(&once), once, "not idempotent for {name:?}");
        }
    }

    #[test]
    fn field_passthrough() {
        assert_eq!(protect_field("*"), "*");
        assert_eq!(protect_field("u.*"), "u.*");
        assert_eq!(protect_field("COUNT(*)"), "COUNT(*)");
        assert_eq!(protect_field("name AS label"), "name AS label");
        assert_eq!(protect_field("key"), "`key`");
    }

    #[test]
    fn order_direction_kept() {
        assert_eq!(protect_order("order DESC"), "`order` DESC");
        assert_eq!(protect_order("created_at asc"), "created_at asc");
        assert_eq!(protect_order("group"), "`group`");
        assert_eq!(protect_order("FIELD(id, 3, 1) DESC"), "FIELD(id, 3, 1) DESC");
    }
}
