use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::watch;

use crate::store::{FieldPatch, Precondition, RemoteStore, StoreError};

use super::domain::{
    application_path, decode_snapshot, Application, ApplicationRecord, ApplicationStatus,
    RegistrationFee, StatusCounts, PENDING_APPLICATIONS_PATH,
};

/// Coordinates admin review of the pending application collection.
///
/// Holds a transient in-memory mirror of `application/pending`, replaced
/// wholesale on every ingested snapshot. Review operations never mutate the
/// mirror directly: they issue targeted store updates and rely on the store
/// re-emitting the changed collection (or an explicit `refresh`) to bring
/// the mirror forward. A failed write therefore leaves the mirror exactly
/// as it was.
pub struct ApplicationLifecycle<S> {
    store: Arc<S>,
    mirror: RwLock<Vec<Application>>,
}

impl<S> ApplicationLifecycle<S>
where
    S: RemoteStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            mirror: RwLock::new(Vec::new()),
        }
    }

    /// Replace the mirror with a full snapshot of the pending collection,
    /// keyed by record id. `None` (path absent in the store) clears it.
    pub fn ingest(&self, snapshot: Option<BTreeMap<String, ApplicationRecord>>) {
        let applications: Vec<Application> = snapshot
            .unwrap_or_default()
            .into_iter()
            .map(|(id, record)| Application { id, record })
            .collect();
        let mut mirror = self.mirror.write().expect("mirror lock poisoned");
        *mirror = applications;
    }

    /// One-shot read of the pending collection, bypassing the subscription.
    pub async fn refresh(&self) -> Result<(), StoreError> {
        let value = self.store.read(PENDING_APPLICATIONS_PATH).await?;
        self.ingest(decode_snapshot(value));
        Ok(())
    }

    /// Drive the mirror from a store subscription until the store side of
    /// the channel goes away.
    pub async fn follow(&self, mut updates: watch::Receiver<Option<Value>>) {
        loop {
            let snapshot = decode_snapshot(updates.borrow_and_update().clone());
            self.ingest(snapshot);
            if updates.changed().await.is_err() {
                break;
            }
        }
    }

    /// Approve a pending application, stamping the decision timestamps.
    pub async fn approve(&self, id: &str) -> Result<(), LifecycleError> {
        self.expect_status(id, ApplicationStatus::Pending)?;

        let now = Utc::now();
        let mut changes = FieldPatch::new();
        changes.insert("status".to_string(), json!(ApplicationStatus::Approved));
        changes.insert("approvedDate".to_string(), json!(now));
        changes.insert("lastUpdated".to_string(), json!(now));

        self.store
            .update(
                &application_path(id),
                &[Precondition::equals(
                    "status",
                    json!(ApplicationStatus::Pending),
                )],
                changes,
            )
            .await?;
        Ok(())
    }

    /// Reject a pending application, stamping the decision timestamps.
    pub async fn reject(&self, id: &str) -> Result<(), LifecycleError> {
        self.expect_status(id, ApplicationStatus::Pending)?;

        let now = Utc::now();
        let mut changes = FieldPatch::new();
        changes.insert("status".to_string(), json!(ApplicationStatus::Rejected));
        changes.insert("rejectedDate".to_string(), json!(now));
        changes.insert("lastUpdated".to_string(), json!(now));

        self.store
            .update(
                &application_path(id),
                &[Precondition::equals(
                    "status",
                    json!(ApplicationStatus::Pending),
                )],
                changes,
            )
            .await?;
        Ok(())
    }

    /// Remove an application from the store entirely.
    pub async fn delete(&self, id: &str) -> Result<(), LifecycleError> {
        if self.find(id).is_none() {
            return Err(LifecycleError::NotFound(id.to_string()));
        }
        self.store.remove(&application_path(id)).await?;
        Ok(())
    }

    /// Record the registration fee as paid on an approved application,
    /// attributing the change to the acting admin (the literal `admin`
    /// when no identity is available).
    pub async fn mark_paid(
        &self,
        id: &str,
        acting_admin: Option<String>,
    ) -> Result<(), LifecycleError> {
        let application = self
            .find(id)
            .ok_or_else(|| LifecycleError::NotFound(id.to_string()))?;
        if application.record.status != ApplicationStatus::Approved {
            return Err(LifecycleError::InvalidStatus {
                id: id.to_string(),
                actual: application.record.status,
                expected: ApplicationStatus::Approved,
            });
        }
        if application.record.registration_fee_paid() {
            return Err(LifecycleError::AlreadyPaid(id.to_string()));
        }

        let now = Utc::now();
        let approved_by = acting_admin.unwrap_or_else(|| "admin".to_string());
        let mut changes = FieldPatch::new();
        changes.insert(
            "payment/registrationFee".to_string(),
            json!(RegistrationFee::Paid),
        );
        changes.insert("payment/registrationFeeDate".to_string(), json!(now));
        changes.insert("payment/approvedBy".to_string(), json!(approved_by));

        self.store
            .update(
                &application_path(id),
                &[
                    Precondition::equals("status", json!(ApplicationStatus::Approved)),
                    Precondition::absent("payment/registrationFee"),
                ],
                changes,
            )
            .await?;
        Ok(())
    }

    /// Current tallies for the dashboard header.
    pub fn counts(&self) -> StatusCounts {
        let mirror = self.mirror.read().expect("mirror lock poisoned");
        let mut counts = StatusCounts::default();
        for application in mirror.iter() {
            match application.record.status {
                ApplicationStatus::Pending => counts.pending += 1,
                ApplicationStatus::Approved => counts.approved += 1,
                ApplicationStatus::Rejected => counts.rejected += 1,
            }
            counts.total += 1;
        }
        counts
    }

    /// Applications on the given tab, optionally narrowed by a
    /// case-insensitive search over name, email, and student code. Mirror
    /// order is preserved.
    pub fn filter(&self, tab: ApplicationStatus, search: &str) -> Vec<Application> {
        let needle = search.to_lowercase();
        let mirror = self.mirror.read().expect("mirror lock poisoned");
        mirror
            .iter()
            .filter(|application| application.record.status == tab)
            .filter(|application| needle.is_empty() || application.record.matches_search(&needle))
            .cloned()
            .collect()
    }

    /// Mirror lookup for the detail view.
    pub fn find(&self, id: &str) -> Option<Application> {
        let mirror = self.mirror.read().expect("mirror lock poisoned");
        mirror
            .iter()
            .find(|application| application.id == id)
            .cloned()
    }

    fn expect_status(&self, id: &str, expected: ApplicationStatus) -> Result<(), LifecycleError> {
        let mirror = self.mirror.read().expect("mirror lock poisoned");
        let application = mirror
            .iter()
            .find(|application| application.id == id)
            .ok_or_else(|| LifecycleError::NotFound(id.to_string()))?;
        if application.record.status != expected {
            return Err(LifecycleError::InvalidStatus {
                id: id.to_string(),
                actual: application.record.status,
                expected,
            });
        }
        Ok(())
    }
}

/// Error raised by review operations.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("application {0} not found")]
    NotFound(String),
    #[error("application {id} is {actual}, expected {expected}")]
    InvalidStatus {
        id: String,
        actual: ApplicationStatus,
        expected: ApplicationStatus,
    },
    #[error("registration fee already recorded for application {0}")]
    AlreadyPaid(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
