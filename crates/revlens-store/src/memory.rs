//! In-memory review store.

use std::cmp::Reverse;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use revlens_core::{ReviewDraft, ReviewError, ReviewRecord, ReviewStore};

use crate::{StoreError, now_micros};

/// Process-local [`ReviewStore`], lost on exit.
///
/// Same ordering contract as the DuckDB store: newest first, ties broken by
/// id descending.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    rows: Vec<ReviewRecord>,
    last_id: i64,
}

impl Inner {
    fn window(&self, offset: u64, limit: u32) -> Vec<ReviewRecord> {
        let mut rows: Vec<&ReviewRecord> = self.rows.iter().collect();
        rows.sort_by_key(|r| Reverse((r.created_at, r.id)));
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        rows.into_iter()
            .skip(offset)
            .take(limit as usize)
            .cloned()
            .collect()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, draft: ReviewDraft, created_at: DateTime<Utc>) -> Result<ReviewRecord, StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        inner.last_id += 1;
        let record = draft.into_record(inner.last_id, created_at);
        inner.rows.push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn create(&self, draft: ReviewDraft) -> Result<ReviewRecord, ReviewError> {
        Ok(self.insert(draft, now_micros())?)
    }

    async fn count(&self) -> Result<u64, ReviewError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.rows.len() as u64)
    }

    async fn list(&self, offset: u64, limit: u32) -> Result<Vec<ReviewRecord>, ReviewError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.window(offset, limit))
    }

    async fn page(
        &self,
        offset: u64,
        limit: u32,
    ) -> Result<(u64, Vec<ReviewRecord>), ReviewError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok((inner.rows.len() as u64, inner.window(offset, limit)))
    }
}
