//! Chunked work-item field fetching.

use crate::ado::{FieldMap, WorkGateway, WorkItem};
use crate::error::Error;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashMap;
use tracing::debug;

/// Maximum number of ids the remote API accepts per batch request.
pub const BATCH_CEILING: usize = 200;

/// Fetch work items in chunks of at most [`BATCH_CEILING`] ids.
///
/// Chunks run concurrently (at most `concurrency` in flight). Items come back
/// in chunk order. The first failing chunk fails the whole call.
pub async fn fetch_in_chunks<G: WorkGateway>(
    gateway: &G,
    ids: &[i64],
    fields: &[String],
    concurrency: usize,
) -> Result<Vec<WorkItem>, Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    debug!(
        ids = ids.len(),
        chunks = ids.len().div_ceil(BATCH_CEILING),
        "fetching work items in batches"
    );

    let chunks: Vec<Vec<i64>> = ids.chunks(BATCH_CEILING).map(<[i64]>::to_vec).collect();
    let chunks: Vec<Vec<WorkItem>> = stream::iter(chunks)
        .map(|chunk| async move { gateway.batch_fetch_fields(&chunk, fields).await })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    Ok(chunks.into_iter().flatten().collect())
}

/// Fetch `fields` for every id and merge the responses into one map keyed by id.
///
/// Ids the remote does not return are absent from the map.
pub async fn batch_fields<G: WorkGateway>(
    gateway: &G,
    ids: &[i64],
    fields: &[String],
    concurrency: usize,
) -> Result<HashMap<i64, FieldMap>, Error> {
    let items = fetch_in_chunks(gateway, ids, fields, concurrency).await?;
    Ok(items.into_iter().map(|item| (item.id, item.fields)).collect())
}
