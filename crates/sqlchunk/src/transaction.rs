//! Transactions pinned to one pooled connection.
//!
//! [`Database::transaction`](crate::Database::transaction) checks a connection
//! out of the pool and issues `BEGIN` on it; every statement of the
//! [`Transaction`] runs on that connection, and `COMMIT`/`ROLLBACK` hand it
//! back to the pool.
//!
//! For ergonomic commit/rollback handling, use the [`transaction!`](crate::transaction!) macro.
//!
//! # Example
//!
//! ```ignore
//! use serde_json::json;
//!
//! sqlchunk::transaction!(&db, tx, {
//!     tx.execute("UPDATE accounts SET balance = balance - ? WHERE id = ?", json!([100, 1]))
//!         .await?;
//!     tx.execute("UPDATE accounts SET balance = balance + ? WHERE id = ?", json!([100, 2]))
//!         .await?;
//!     Ok(())
//! })?;
//! ```

use crate::client::{PooledConnection, SqlOptions, UpsertResult};
use crate::database::{QueryOutcome, bind, shape_rows};
use crate::error::{OrmError, OrmResult};
use crate::monitor::log_statement;
use crate::value::Params;

/// Runs the given block inside a transaction.
///
/// - Begins a transaction via `$db.transaction().await`.
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)` and returns the block's error.
///
/// The block must evaluate to `sqlchunk::OrmResult<T>`.
#[macro_export]
macro_rules! transaction {
    ($db:expr, $tx:ident, $body:block) => {{
        let mut $tx = ($db).transaction().await?;

        let __sqlchunk_tx_body_result: $crate::OrmResult<_> = async { $body }.await;
        match __sqlchunk_tx_body_result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(error) => Err($tx.abort(error).await),
        }
    }};
}

/// An open transaction.
///
/// Dropping it without [`commit`](Self::commit) or [`rollback`](Self::rollback)
/// drops the connection instead of returning it to the pool.
#[derive(Debug)]
pub struct Transaction<C: PooledConnection> {
    conn: Option<C>,
}

impl<C: PooledConnection> Transaction<C> {
    pub(crate) async fn begin(mut conn: C) -> OrmResult<Self> {
        log_statement("BEGIN", 0);
        match conn.execute(&SqlOptions::new("BEGIN"), &Params::none()).await {
            Ok(_) => Ok(Self { conn: Some(conn) }),
            Err(e) => {
                conn.release();
                Err(e)
            }
        }
    }

    /// Run SQL that returns rows on the transaction's connection.
    pub async fn query(&mut self, sql: &str, params: impl Into<Params>) -> OrmResult<QueryOutcome> {
        let (options, params) = bind(SqlOptions::new(sql), params.into());
        log_statement(&options.sql, params.len());
        let output = self.conn()?.query(&options, &params).await?;
        Ok(shape_rows(&options.sql, output.rows, false))
    }

    /// Run SQL that writes on the transaction's connection.
    pub async fn execute(&mut self, sql: &str, params: impl Into<Params>) -> OrmResult<UpsertResult> {
        let (options, params) = bind(SqlOptions::new(sql), params.into());
        log_statement(&options.sql, params.len());
        self.conn()?.execute(&options, &params).await
    }

    pub async fn commit(self) -> OrmResult<()> {
        self.finish("COMMIT").await
    }

    pub async fn rollback(self) -> OrmResult<()> {
        self.finish("ROLLBACK").await
    }

    /// Roll back after `error`, returning `error`.
    ///
    /// A failed rollback is logged; the original error is still returned.
    pub async fn abort(self, error: OrmError) -> OrmError {
        if let Err(rollback_err) = self.rollback().await {
            tracing::error!(
                target: "sqlchunk.pool",
                error = %error,
                rollback_error = %rollback_err,
                "rollback failed"
            );
        }
        error
    }

    fn conn(&mut self) -> OrmResult<&mut C> {
        self.conn
            .as_mut()
            .ok_or_else(|| OrmError::config("transaction already finished"))
    }

    async fn finish(mut self, sql: &str) -> OrmResult<()> {
        let mut conn = self
            .conn
            .take()
            .ok_or_else(|| OrmError::config("transaction already finished"))?;
        log_statement(sql, 0);
        let result = conn.execute(&SqlOptions::new(sql), &Params::none()).await;
        conn.release();
        result.map(|_| ())
    }
}

impl<C: PooledConnection> Drop for Transaction<C> {
    fn drop(&mut self) {
        if self.conn.take().is_some() {
            tracing::warn!(
                target: "sqlchunk.pool",
                "transaction dropped without commit or rollback"
            );
        }
    }
}
