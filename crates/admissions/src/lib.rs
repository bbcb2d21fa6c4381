//! Core library for the school admissions management service.
//!
//! Applications submitted by prospective students accumulate in a remote,
//! subscribable key-value store. Admins review them through the workflow in
//! [`applications`], confirm their own identity through [`auth`], and pull
//! uploaded supporting documents through [`documents`]. The store itself is
//! an external collaborator consumed through the [`store::RemoteStore`]
//! seam; [`store::MemoryStore`] hosts the service and the tests.

pub mod applications;
pub mod auth;
pub mod config;
pub mod documents;
pub mod error;
pub mod store;
pub mod telemetry;
