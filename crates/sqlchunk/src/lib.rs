//! # sqlchunk
//!
//! A structured-query compiler and chunked-pagination planner for MySQL-dialect
//! pooled clients.
//!
//! ## Features
//!
//! - **Declarative requests**: [`QuerySpec`] and [`UpdateParams`] deserialize from JSON
//!   request shapes and compile to `?`-placeholder SQL plus ordered parameters
//! - **Flexible WHERE**: raw SQL, a list of fragments, a field mapping, or a list of
//!   mappings OR-ed together ([`WhereSpec`])
//! - **Identifier protection**: reserved words and unusual names are backtick-quoted
//! - **Chunked iteration**: large result sets are read by cached id windows instead of
//!   OFFSET scans ([`chunk`])
//! - **Pluggable client**: any driver implementing [`SqlPool`] can run the statements
//!
//! ## Statement assembly
//!
//! ```ignore
//! use serde_json::json;
//! use sqlchunk::{QuerySpec, build_select};
//!
//! let spec = QuerySpec::new("users")
//!     .select(["id", "name"])
//!     .filter(json!([{"status": "active"}, {"role": "admin"}]))
//!     .order_by("id DESC")
//!     .limit(20);
//! let stmt = build_select(&spec)?.statement();
//! assert_eq!(
//!     stmt.sql,
//!     "SELECT id, name FROM users WHERE (status = ?) OR (role = ?) ORDER BY id DESC LIMIT 20"
//! );
//! ```
//!
//! ## Execution
//!
//! ```ignore
//! use serde_json::json;
//! use sqlchunk::{Database, DbConfig, QueryOutcome};
//!
//! let db = Database::default();
//! db.configure(&DbConfig::from_url("mysql://app@localhost/shop")?, &connector)?;
//! if let QueryOutcome::Row(user) = db.query("SELECT * FROM users WHERE id = ? LIMIT 1", json!([7])).await? {
//!     println!("{user:?}");
//! }
//! ```

pub mod chunk;
pub mod client;
pub mod config;
pub mod database;
pub mod error;
pub mod ident;
pub mod monitor;
pub mod statement;
pub mod transaction;
pub mod value;
pub mod where_clause;

pub use chunk::{
    CHUNK_SIZE, ChunkPlan, ChunkPlanner, ChunkRange, ChunkStore, ChunkTable, FIRST_CHUNK_SIZE,
    MemoryChunkStore, cache_key, partition,
};
pub use client::{
    ColumnDefinition, Connector, PooledConnection, QueryOutput, SqlOptions, SqlPool, UpsertResult,
};
pub use config::DbConfig;
pub use database::{ColumnMeta, Database, QueryOutcome};
pub use error::{DriverError, OrmError, OrmResult};
pub use ident::protect;
pub use monitor::QueryType;
pub use statement::{
    BatchStatement, ChunkSelector, Command, QuerySpec, SelectPlan, Statement, UpdateParams,
    build_delete, build_insert, build_object_update, build_select, build_update, build_upsert,
};
pub use transaction::Transaction;
pub use value::{FieldMap, Params, Row, Value};
pub use where_clause::{CompiledWhere, WhereSpec, compile_where};
