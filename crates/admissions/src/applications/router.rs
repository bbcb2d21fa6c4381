use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{SessionRegistry, SESSION_TOKEN_HEADER};
use crate::store::{RemoteStore, StoreError};

use super::domain::ApplicationStatus;
use super::lifecycle::{ApplicationLifecycle, LifecycleError};

/// Shared state for the admin review endpoints.
pub struct AdmissionsState<S> {
    pub lifecycle: Arc<ApplicationLifecycle<S>>,
    pub sessions: Arc<SessionRegistry>,
}

impl<S> Clone for AdmissionsState<S> {
    fn clone(&self) -> Self {
        Self {
            lifecycle: self.lifecycle.clone(),
            sessions: self.sessions.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    tab: Option<ApplicationStatus>,
    search: Option<String>,
}

/// Router builder exposing the admin review endpoints.
pub fn admissions_router<S>(
    lifecycle: Arc<ApplicationLifecycle<S>>,
    sessions: Arc<SessionRegistry>,
) -> Router
where
    S: RemoteStore + 'static,
{
    let state = AdmissionsState {
        lifecycle,
        sessions,
    };
    Router::new()
        .route("/api/v1/admissions/applications", get(list_handler::<S>))
        .route("/api/v1/admissions/summary", get(summary_handler::<S>))
        .route(
            "/api/v1/admissions/applications/:application_id",
            get(detail_handler::<S>).delete(delete_handler::<S>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id/approve",
            post(approve_handler::<S>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id/reject",
            post(reject_handler::<S>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id/payment",
            post(payment_handler::<S>),
        )
        .with_state(state)
}

pub(crate) async fn list_handler<S>(
    State(state): State<AdmissionsState<S>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    S: RemoteStore + 'static,
{
    let tab = query.tab.unwrap_or(ApplicationStatus::Pending);
    let search = query.search.unwrap_or_default();
    let applications = state.lifecycle.filter(tab, &search);
    let payload = json!({
        "tab": tab.label(),
        "applications": applications,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn summary_handler<S>(State(state): State<AdmissionsState<S>>) -> Response
where
    S: RemoteStore + 'static,
{
    (StatusCode::OK, axum::Json(state.lifecycle.counts())).into_response()
}

pub(crate) async fn detail_handler<S>(
    State(state): State<AdmissionsState<S>>,
    Path(application_id): Path<String>,
) -> Response
where
    S: RemoteStore + 'static,
{
    match state.lifecycle.find(&application_id) {
        Some(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        None => lifecycle_error_response(LifecycleError::NotFound(application_id)),
    }
}

pub(crate) async fn approve_handler<S>(
    State(state): State<AdmissionsState<S>>,
    Path(application_id): Path<String>,
) -> Response
where
    S: RemoteStore + 'static,
{
    match state.lifecycle.approve(&application_id).await {
        Ok(()) => decision_response(&application_id, ApplicationStatus::Approved),
        Err(error) => lifecycle_error_response(error),
    }
}

pub(crate) async fn reject_handler<S>(
    State(state): State<AdmissionsState<S>>,
    Path(application_id): Path<String>,
) -> Response
where
    S: RemoteStore + 'static,
{
    match state.lifecycle.reject(&application_id).await {
        Ok(()) => decision_response(&application_id, ApplicationStatus::Rejected),
        Err(error) => lifecycle_error_response(error),
    }
}

pub(crate) async fn payment_handler<S>(
    State(state): State<AdmissionsState<S>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: RemoteStore + 'static,
{
    let acting_admin = session_uid(&state.sessions, &headers);
    match state
        .lifecycle
        .mark_paid(&application_id, acting_admin)
        .await
    {
        Ok(()) => {
            let payload = json!({
                "id": application_id,
                "registrationFee": "paid",
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => lifecycle_error_response(error),
    }
}

pub(crate) async fn delete_handler<S>(
    State(state): State<AdmissionsState<S>>,
    Path(application_id): Path<String>,
) -> Response
where
    S: RemoteStore + 'static,
{
    match state.lifecycle.delete(&application_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => lifecycle_error_response(error),
    }
}

fn decision_response(application_id: &str, status: ApplicationStatus) -> Response {
    let payload = json!({
        "id": application_id,
        "status": status.label(),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

fn lifecycle_error_response(error: LifecycleError) -> Response {
    let status = match &error {
        LifecycleError::NotFound(_) => StatusCode::NOT_FOUND,
        LifecycleError::InvalidStatus { .. } | LifecycleError::AlreadyPaid(_) => {
            StatusCode::CONFLICT
        }
        LifecycleError::Store(StoreError::Conflict { .. }) => StatusCode::CONFLICT,
        LifecycleError::Store(StoreError::Unavailable(_)) => StatusCode::BAD_GATEWAY,
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

fn session_uid(sessions: &SessionRegistry, headers: &HeaderMap) -> Option<String> {
    let token = headers.get(SESSION_TOKEN_HEADER)?.to_str().ok()?;
    sessions.resolve(token).map(|session| session.uid)
}
