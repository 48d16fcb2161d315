//! In-memory profile store for tests and offline runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use cfy_core::ProfileDocument;

use crate::ProfileStore;
use crate::error::StoreError;

#[derive(Debug, Default)]
struct Inner {
    docs: HashMap<String, ProfileDocument>,
    latency: HashMap<String, Duration>,
    /// Calls left to fail before the store answers normally again.
    failures_left: usize,
    outage: Option<StoreError>,
}

/// Profile store backed by a `HashMap`, with per-uid latency and failure
/// injection.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    inner: Mutex<Inner>,
    calls: AtomicUsize,
}

impl MemoryProfileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_profiles(profiles: impl IntoIterator<Item = ProfileDocument>) -> Self {
        let store = Self::new();
        for doc in profiles {
            store.insert(doc);
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, doc: ProfileDocument) {
        self.lock().docs.insert(doc.uid.clone(), doc);
    }

    pub fn remove(&self, uid: &str) -> Option<ProfileDocument> {
        self.lock().docs.remove(uid)
    }

    /// Delay every call for `uid` by `latency`.
    pub fn set_latency(&self, uid: impl Into<String>, latency: Duration) {
        self.lock().latency.insert(uid.into(), latency);
    }

    /// Fail the next `count` calls (any uid) with a backend error.
    pub fn fail_next(&self, count: usize) {
        self.lock().failures_left = count;
    }

    /// Fail every call with `error` until [`Self::end_outage`].
    pub fn start_outage(&self, error: StoreError) {
        self.lock().outage = Some(error);
    }

    pub fn end_outage(&self) {
        self.lock().outage = None;
    }

    /// Number of `exists`/`get` calls made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Shared prologue: count, wait, maybe fail.
    async fn enter(&self, uid: &str) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let latency = self.lock().latency.get(uid).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut inner = self.lock();
        if let Some(error) = inner.outage.clone() {
            return Err(error);
        }
        if inner.failures_left > 0 {
            inner.failures_left -= 1;
            return Err(StoreError::Backend("injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn exists(&self, uid: &str) -> Result<bool, StoreError> {
        self.enter(uid).await?;
        Ok(self.lock().docs.contains_key(uid))
    }

    async fn get(&self, uid: &str) -> Result<Option<ProfileDocument>, StoreError> {
        self.enter(uid).await?;
        Ok(self.lock().docs.get(uid).cloned())
    }
}
