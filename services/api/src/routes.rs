use crate::infra::{AppState, Services};
use admissions::applications::admissions_router;
use admissions::auth::auth_router;
use admissions::documents::documents_router;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;

/// The admin surface: review endpoints, credential endpoints, document
/// browsing, and the operational probes.
pub(crate) fn admin_routes(services: &Services) -> axum::Router {
    admissions_router(services.lifecycle.clone(), services.sessions.clone())
        .merge(auth_router(
            services.provider.clone(),
            services.store.clone(),
            services.sessions.clone(),
        ))
        .merge(documents_router(
            services.documents.clone(),
            services.store.clone(),
        ))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
