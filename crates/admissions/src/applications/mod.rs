//! Admin review workflow over the pending application collection.

pub mod domain;
pub mod lifecycle;
pub mod router;

#[cfg(test)]
mod tests;

pub use domain::{
    application_path, decode_snapshot, Address, Application, ApplicationRecord, ApplicationStatus,
    Guardian, PaymentRecord, RegistrationFee, StatusCounts, PENDING_APPLICATIONS_PATH,
};
pub use lifecycle::{ApplicationLifecycle, LifecycleError};
pub use router::{admissions_router, AdmissionsState};
