use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::applications::{decode_snapshot, Application, PENDING_APPLICATIONS_PATH};
use crate::store::RemoteStore;

use super::client::{DocumentsClient, DocumentsError};

/// Shared state for the document-browsing endpoints.
pub struct DocumentsState<S> {
    pub client: Arc<DocumentsClient>,
    pub store: Arc<S>,
}

impl<S> Clone for DocumentsState<S> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            store: self.store.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RosterQuery {
    search: Option<String>,
}

/// Router builder for the document-browsing view: a one-shot student
/// roster plus per-student bundle fetches proxied to the upload service.
pub fn documents_router<S>(client: Arc<DocumentsClient>, store: Arc<S>) -> Router
where
    S: RemoteStore + 'static,
{
    let state = DocumentsState { client, store };
    Router::new()
        .route("/api/v1/documents/students", get(roster_handler::<S>))
        .route(
            "/api/v1/documents/students/:student_id",
            get(bundle_handler::<S>),
        )
        .with_state(state)
}

/// Snapshot the pending collection once rather than subscribing; the
/// roster does not need live updates.
pub(crate) async fn roster_handler<S>(
    State(state): State<DocumentsState<S>>,
    Query(query): Query<RosterQuery>,
) -> Response
where
    S: RemoteStore + 'static,
{
    let snapshot = match state.store.read(PENDING_APPLICATIONS_PATH).await {
        Ok(snapshot) => snapshot,
        Err(error) => {
            let payload = json!({ "error": format!("Failed to fetch students: {error}") });
            return (StatusCode::BAD_GATEWAY, Json(payload)).into_response();
        }
    };

    let needle = query.search.unwrap_or_default().to_lowercase();
    let students: Vec<Application> = decode_snapshot(snapshot)
        .unwrap_or_default()
        .into_iter()
        .filter(|(_, record)| needle.is_empty() || record.matches_search(&needle))
        .map(|(id, record)| Application { id, record })
        .collect();

    (StatusCode::OK, Json(json!({ "students": students }))).into_response()
}

pub(crate) async fn bundle_handler<S>(
    State(state): State<DocumentsState<S>>,
    Path(student_id): Path<String>,
) -> Response
where
    S: RemoteStore + 'static,
{
    match state.client.fetch_bundle(&student_id).await {
        Ok(bundle) => (StatusCode::OK, Json(bundle)).into_response(),
        Err(error) => bundle_error_response(error),
    }
}

fn bundle_error_response(error: DocumentsError) -> Response {
    let status = match &error {
        DocumentsError::Rejected(_) => StatusCode::NOT_FOUND,
        DocumentsError::Transport(_) | DocumentsError::Status(_) => StatusCode::BAD_GATEWAY,
    };
    let payload = json!({ "error": format!("Failed to fetch documents: {error}") });
    (status, Json(payload)).into_response()
}
