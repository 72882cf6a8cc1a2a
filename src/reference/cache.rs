//! Process-lifetime cache of reference records.
//!
//! Entries are created on the first successful fetch and kept until the cache
//! is dropped; there is no eviction and no staleness tracking. [`ReferenceCache::refresh`]
//! is the only way to replace an entry.
//!
//! Overlapping [`ReferenceCache::ensure`] calls may fetch the same id twice.
//! The second result simply overwrites the first.

use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use super::{ExternalRecord, RecordKind, ReferenceFetcher};
use crate::chunk;
use crate::error::{Error, Result};

pub struct ReferenceCache {
    fetcher: Arc<dyn ReferenceFetcher>,
    records: RwLock<HashMap<(RecordKind, u64), ExternalRecord>>,
}

impl ReferenceCache {
    pub fn new(fetcher: Arc<dyn ReferenceFetcher>) -> Self {
        Self {
            fetcher,
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, kind: RecordKind, id: u64) -> Option<ExternalRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(kind, id))
            .cloned()
    }

    pub fn contains(&self, kind: RecordKind, id: u64) -> bool {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&(kind, id))
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct ids from `ids` that are not cached, in ascending order.
    pub fn missing(&self, kind: RecordKind, ids: impl IntoIterator<Item = u64>) -> Vec<u64> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        ids.into_iter()
            .filter(|id| !records.contains_key(&(kind, *id)))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Make a best effort to cache every id in `ids`.
    ///
    /// Uncached ids are split into batches no larger than the kind's ceiling
    /// and fetched concurrently. A failed batch is logged and skipped; the
    /// other batches still populate the cache.
    pub async fn ensure(&self, kind: RecordKind, ids: impl IntoIterator<Item = u64>) {
        let missing = self.missing(kind, ids);
        if missing.is_empty() {
            return;
        }

        let plan = chunk::batches(missing, kind.batch_ceiling());
        tracing::debug!(%kind, batches = plan.len(), "fetching uncached records");

        let results = join_all(plan.iter().map(|batch| self.fetcher.fetch(kind, batch))).await;

        for (batch, result) in plan.iter().zip(results) {
            match result {
                Ok(records) => self.insert_all(records),
                Err(e) => {
                    tracing::warn!(%kind, ids = batch.len(), error = %e, "batch fetch failed");
                }
            }
        }
    }

    /// Return the cached record, fetching it if needed.
    ///
    /// Unlike [`ensure`](Self::ensure), fetch failures propagate.
    pub async fn get_or_fetch(&self, kind: RecordKind, id: u64) -> Result<ExternalRecord> {
        if let Some(record) = self.get(kind, id) {
            return Ok(record);
        }
        self.fetch_one(kind, id).await
    }

    /// Fetch a record again, overwriting whatever is cached.
    ///
    /// If the remote no longer knows the id, the stale entry is dropped.
    pub async fn refresh(&self, kind: RecordKind, id: u64) -> Result<ExternalRecord> {
        let result = self.fetch_one(kind, id).await;
        if matches!(result, Err(Error::NotFound(_))) {
            self.records
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&(kind, id));
        }
        result
    }

    async fn fetch_one(&self, kind: RecordKind, id: u64) -> Result<ExternalRecord> {
        let record = self
            .fetcher
            .fetch(kind, &[id])
            .await?
            .into_iter()
            .find(|record| record.kind == kind && record.id == id)
            .ok_or_else(|| Error::NotFound(format!("{kind} {id} not found")))?;
        self.insert_all(vec![record.clone()]);
        Ok(record)
    }

    fn insert_all(&self, records: Vec<ExternalRecord>) {
        let mut cached = self.records.write().unwrap_or_else(PoisonError::into_inner);
        for record in records {
            cached.insert(record.key(), record);
        }
    }
}
