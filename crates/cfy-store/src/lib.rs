//! # cfy-store
//!
//! Read-only access to profile documents keyed by identity uid.
//!
//! The session core only asks two questions: does a profile exist, and what
//! is in it. Adapters: an in-memory store with latency/failure injection and a
//! Firestore REST store.

pub mod error;
pub mod firestore;
pub mod memory;

pub use error::StoreError;
pub use firestore::FirestoreProfileStore;
pub use memory::MemoryProfileStore;

use async_trait::async_trait;
use cfy_core::ProfileDocument;

/// Document store holding one profile per uid.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Whether a profile document exists for `uid`.
    async fn exists(&self, uid: &str) -> Result<bool, StoreError>;

    /// Fetch the profile document for `uid`, `None` if absent.
    async fn get(&self, uid: &str) -> Result<Option<ProfileDocument>, StoreError>;
}
