use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::Value;
use tokio::sync::watch;

use crate::applications::domain::{application_path, ApplicationRecord, ApplicationStatus};
use crate::applications::lifecycle::ApplicationLifecycle;
use crate::store::{FieldPatch, MemoryStore, Precondition, RemoteStore, StoreError};

pub(super) fn record(first: &str, last: &str, email: &str, code: &str) -> ApplicationRecord {
    ApplicationRecord {
        first_name: Some(first.to_string()),
        last_name: Some(last.to_string()),
        email: Some(email.to_string()),
        student_code: Some(code.to_string()),
        phone: Some("013 555 0100".to_string()),
        application_date: Utc.with_ymd_and_hms(2024, 1, 15, 8, 30, 0).single(),
        ..ApplicationRecord::default()
    }
}

pub(super) fn record_with_status(
    first: &str,
    last: &str,
    email: &str,
    code: &str,
    status: ApplicationStatus,
) -> ApplicationRecord {
    ApplicationRecord {
        status,
        ..record(first, last, email, code)
    }
}

pub(super) async fn seed_application(store: &MemoryStore, id: &str, record: &ApplicationRecord) {
    let value = serde_json::to_value(record).expect("record encodes");
    store
        .put(&application_path(id), value)
        .await
        .expect("seed write succeeds");
}

/// Store plus a lifecycle manager whose mirror already reflects the seeded
/// records.
pub(super) async fn seeded_lifecycle(
    entries: &[(&str, ApplicationRecord)],
) -> (Arc<MemoryStore>, Arc<ApplicationLifecycle<MemoryStore>>) {
    let store = Arc::new(MemoryStore::new());
    for (id, record) in entries {
        seed_application(&store, id, record).await;
    }
    let lifecycle = Arc::new(ApplicationLifecycle::new(store.clone()));
    lifecycle.refresh().await.expect("refresh succeeds");
    (store, lifecycle)
}

pub(super) async fn read_json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Store whose write operations can be switched off mid-test.
pub(super) struct FlakyStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub(super) fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub(super) fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("store offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl RemoteStore for FlakyStore {
    fn subscribe(&self, path: &str) -> watch::Receiver<Option<Value>> {
        self.inner.subscribe(path)
    }

    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError> {
        self.inner.read(path).await
    }

    async fn update(
        &self,
        path: &str,
        preconditions: &[Precondition],
        changes: FieldPatch,
    ) -> Result<(), StoreError> {
        self.check_writable()?;
        self.inner.update(path, preconditions, changes).await
    }

    async fn put(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.check_writable()?;
        self.inner.put(path, value).await
    }

    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError> {
        self.check_writable()?;
        self.inner.push(path, value).await
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.inner.remove(path).await
    }
}

/// Store that refuses every operation.
pub(super) struct UnavailableStore;

impl UnavailableStore {
    fn offline<T>() -> Result<T, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }
}

impl RemoteStore for UnavailableStore {
    fn subscribe(&self, _path: &str) -> watch::Receiver<Option<Value>> {
        watch::channel(None).1
    }

    async fn read(&self, _path: &str) -> Result<Option<Value>, StoreError> {
        Self::offline()
    }

    async fn update(
        &self,
        _path: &str,
        _preconditions: &[Precondition],
        _changes: FieldPatch,
    ) -> Result<(), StoreError> {
        Self::offline()
    }

    async fn put(&self, _path: &str, _value: Value) -> Result<(), StoreError> {
        Self::offline()
    }

    async fn push(&self, _path: &str, _value: Value) -> Result<String, StoreError> {
        Self::offline()
    }

    async fn remove(&self, _path: &str) -> Result<(), StoreError> {
        Self::offline()
    }
}
