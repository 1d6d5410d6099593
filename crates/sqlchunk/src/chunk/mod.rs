//! Chunked iteration over large result sets.
//!
//! The planner runs a base query once, reads the ascending `id` of every row
//! and partitions the id list into inclusive windows. The first window is
//! small ([`FIRST_CHUNK_SIZE`] rows) so the first page comes back quickly;
//! every following window holds [`CHUNK_SIZE`] rows. Windows are cached in a
//! [`ChunkStore`] under [`cache_key`] (base SQL text plus its bound values),
//! and a data query then reads one window with `id BETWEEN start AND end`
//! instead of a large OFFSET.
//!
//! Cached tables are never invalidated here. Two concurrent cold misses for
//! the same base query both build the table; the last write wins.

mod store;

pub use store::{ChunkStore, MemoryChunkStore};

use crate::client::{SqlOptions, SqlPool};
use crate::error::{OrmError, OrmResult};
use crate::monitor::log_statement;
use crate::statement::{ChunkSelector, Statement};
use crate::value::{Params, Row, as_id};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Rows in the first window.
pub const FIRST_CHUNK_SIZE: usize = 20;

/// Rows in every window after the first.
pub const CHUNK_SIZE: usize = 1000;

/// An inclusive id range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRange {
    pub start: i64,
    pub end: i64,
}

/// The ordered windows of one base query.
pub type ChunkTable = Arc<[ChunkRange]>;

/// Split an ascending id list into windows.
///
/// Window 0 covers `ids[0..min(20, n)]`; later windows cover 1000 ids each,
/// the last one possibly fewer. An empty list yields no windows.
pub fn partition(ids: &[i64]) -> Vec<ChunkRange> {
    let split = ids.len().min(FIRST_CHUNK_SIZE);
    let (first, rest) = ids.split_at(split);

    std::iter::once(first)
        .filter(|window| !window.is_empty())
        .chain(rest.chunks(CHUNK_SIZE))
        .filter_map(|window| {
            Some(ChunkRange {
                start: *window.first()?,
                end: *window.last()?,
            })
        })
        .collect()
}

/// Store key for the chunk table of `base`.
///
/// Two requests share a table only when both the SQL text and the bound
/// values match, so `kind = 'click'` and `kind = 'view'` never collide.
pub fn cache_key(base: &Statement) -> OrmResult<String> {
    let params = serde_json::to_string(&base.params)?;
    Ok(format!("{}\u{0}{}", base.sql, params))
}

/// What to run for a chunk request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkPlan {
    /// Only the window count was requested.
    Count { total: usize },
    /// The requested window, or `None` when the index is past the last window.
    Window {
        range: Option<ChunkRange>,
        total: usize,
    },
}

impl ChunkPlan {
    pub fn total(&self) -> usize {
        match self {
            Self::Count { total } | Self::Window { total, .. } => *total,
        }
    }

    /// Bounds to query, if a data query should be issued at all.
    pub fn range(&self) -> Option<ChunkRange> {
        match self {
            Self::Count { .. } => None,
            Self::Window { range, .. } => *range,
        }
    }
}

/// Builds and memoizes chunk tables.
pub struct ChunkPlanner<'a, S: ChunkStore> {
    store: &'a S,
}

impl<'a, S: ChunkStore> ChunkPlanner<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// The chunk table for `base`, building and caching it on a miss.
    pub async fn table<P: SqlPool>(&self, pool: &P, base: &Statement) -> OrmResult<ChunkTable> {
        let key = cache_key(base)?;
        if let Some(table) = self.store.get(&key).await {
            return Ok(table);
        }

        let ids = collect_ids(pool, base).await?;
        let table: ChunkTable = partition(&ids).into();
        tracing::debug!(
            target: "sqlchunk.chunk",
            rows = ids.len(),
            windows = table.len(),
            "built chunk table"
        );
        self.store.set(&key, Arc::clone(&table)).await;
        Ok(table)
    }

    /// Resolve `selector` against the chunk table for `base`.
    pub async fn plan<P: SqlPool>(
        &self,
        pool: &P,
        base: &Statement,
        selector: ChunkSelector,
    ) -> OrmResult<ChunkPlan> {
        let table = self.table(pool, base).await?;
        let total = table.len();
        Ok(match selector {
            ChunkSelector::Count => ChunkPlan::Count { total },
            ChunkSelector::Index(index) => ChunkPlan::Window {
                range: table.get(index).copied(),
                total,
            },
        })
    }
}

async fn collect_ids<P: SqlPool>(pool: &P, base: &Statement) -> OrmResult<Vec<i64>> {
    log_statement(&base.sql, base.params.len());
    let output = pool
        .query(
            &SqlOptions::new(base.sql.as_str()),
            &Params::Positional(base.params.clone()),
        )
        .await?;

    ids_from_rows(&output.rows)
}

fn ids_from_rows(rows: &[Row]) -> OrmResult<Vec<i64>> {
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    if !first.contains_key("id") {
        return Err(OrmError::config(
            "chunked query rows must include an `id` column",
        ));
    }

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            row.get("id").and_then(as_id).ok_or_else(|| {
                OrmError::invalid_request(format!("row {i} has no integer `id`"))
            })
        })
        .collect()
}
