use std::collections::BTreeMap;
use std::future::Future;

use serde_json::Value;
use tokio::sync::watch;

pub mod memory;

pub use memory::MemoryStore;

/// Partial update payload: field paths relative to the updated subtree
/// (nested like `payment/registrationFee`) mapped to their new values.
pub type FieldPatch = BTreeMap<String, Value>;

/// Guard evaluated atomically with an update. `expected = None` requires
/// the field to be absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Precondition {
    pub field: String,
    pub expected: Option<Value>,
}

impl Precondition {
    pub fn equals(field: impl Into<String>, expected: Value) -> Self {
        Self {
            field: field.into(),
            expected: Some(expected),
        }
    }

    pub fn absent(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("concurrent update conflict at {path}")]
    Conflict { path: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Seam to the remote application store: a JSON tree addressed by
/// slash-joined paths, observable per subtree.
///
/// Writes are single attempts. There is no retry or offline queueing here;
/// callers surface failures and leave their own state alone.
///
/// All methods return `Send` futures so the trait can back axum handlers
/// and spawned tasks.
pub trait RemoteStore: Send + Sync {
    /// Observe a subtree. The receiver holds the current value immediately
    /// and is handed a full replacement snapshot after every change
    /// underneath `path`.
    fn subscribe(&self, path: &str) -> watch::Receiver<Option<Value>>;

    /// One-shot read of a subtree, bypassing any subscription.
    fn read(&self, path: &str) -> impl Future<Output = Result<Option<Value>, StoreError>> + Send;

    /// Merge `changes` into the subtree at `path` without touching sibling
    /// fields. Every precondition must hold at the moment of the write or
    /// the whole update is rejected with [`StoreError::Conflict`] and
    /// nothing changes.
    fn update(
        &self,
        path: &str,
        preconditions: &[Precondition],
        changes: FieldPatch,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Replace the subtree at `path` wholesale.
    fn put(&self, path: &str, value: Value) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Append `value` under a store-minted id and return that id.
    fn push(
        &self,
        path: &str,
        value: Value,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Delete the subtree at `path`. Removing an absent path succeeds.
    fn remove(&self, path: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}
