use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use serde_json::json;
use tower::ServiceExt;

use super::common::*;

use crate::applications::domain::{application_path, ApplicationStatus};
use crate::applications::lifecycle::ApplicationLifecycle;
use crate::applications::router::admissions_router;
use crate::auth::{AdminSession, SessionRegistry, SESSION_TOKEN_HEADER};
use crate::store::{MemoryStore, RemoteStore};

fn review_router(
    lifecycle: Arc<ApplicationLifecycle<MemoryStore>>,
) -> (axum::Router, Arc<SessionRegistry>) {
    let sessions = Arc::new(SessionRegistry::new());
    (admissions_router(lifecycle, sessions.clone()), sessions)
}

#[tokio::test]
async fn list_defaults_to_the_pending_tab() {
    let (_, lifecycle) = seeded_lifecycle(&[
        (
            "app-001",
            record("Thabo", "Nkosi", "thabo@example.com", "STU-001"),
        ),
        (
            "app-002",
            record_with_status(
                "Lindiwe",
                "Dlamini",
                "lindiwe@example.com",
                "STU-002",
                ApplicationStatus::Approved,
            ),
        ),
    ])
    .await;
    let (router, _) = review_router(lifecycle);

    let response = router
        .oneshot(
            Request::get("/api/v1/admissions/applications")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["tab"], json!("pending"));
    let applications = payload["applications"]
        .as_array()
        .expect("applications array");
    assert_eq!(applications.len(), 1);
    assert_eq!(applications[0]["id"], json!("app-001"));
    assert_eq!(applications[0]["firstName"], json!("Thabo"));
}

#[tokio::test]
async fn list_honors_tab_and_search_parameters() {
    let (_, lifecycle) = seeded_lifecycle(&[
        (
            "app-001",
            record("Thabo", "Nkosi", "thabo@example.com", "STU-001"),
        ),
        (
            "app-002",
            record_with_status(
                "Lindiwe",
                "Dlamini",
                "lindiwe@example.com",
                "STU-002",
                ApplicationStatus::Approved,
            ),
        ),
        (
            "app-003",
            record_with_status(
                "Sipho",
                "Mahlangu",
                "sipho@example.com",
                "STU-003",
                ApplicationStatus::Approved,
            ),
        ),
    ])
    .await;
    let (router, _) = review_router(lifecycle);

    let response = router
        .oneshot(
            Request::get("/api/v1/admissions/applications?tab=approved&search=DLAMINI")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["tab"], json!("approved"));
    let applications = payload["applications"]
        .as_array()
        .expect("applications array");
    assert_eq!(applications.len(), 1);
    assert_eq!(applications[0]["id"], json!("app-002"));
}

#[tokio::test]
async fn unknown_tab_values_are_rejected() {
    let (_, lifecycle) = seeded_lifecycle(&[]).await;
    let (router, _) = review_router(lifecycle);

    let response = router
        .oneshot(
            Request::get("/api/v1/admissions/applications?tab=archived")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn summary_reports_current_counts() {
    let (_, lifecycle) = seeded_lifecycle(&[
        (
            "app-001",
            record("Thabo", "Nkosi", "thabo@example.com", "STU-001"),
        ),
        (
            "app-002",
            record_with_status(
                "Lindiwe",
                "Dlamini",
                "lindiwe@example.com",
                "STU-002",
                ApplicationStatus::Rejected,
            ),
        ),
    ])
    .await;
    let (router, _) = review_router(lifecycle);

    let response = router
        .oneshot(
            Request::get("/api/v1/admissions/summary")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["pending"], json!(1));
    assert_eq!(payload["rejected"], json!(1));
    assert_eq!(payload["total"], json!(2));
}

#[tokio::test]
async fn detail_view_resolves_and_misses() {
    let (_, lifecycle) = seeded_lifecycle(&[(
        "app-001",
        record("Thabo", "Nkosi", "thabo@example.com", "STU-001"),
    )])
    .await;
    let (router, _) = review_router(lifecycle);

    let response = router
        .clone()
        .oneshot(
            Request::get("/api/v1/admissions/applications/app-001")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["id"], json!("app-001"));

    let response = router
        .oneshot(
            Request::get("/api/v1/admissions/applications/app-404")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], json!("application app-404 not found"));
}

#[tokio::test]
async fn stale_second_decision_conflicts() {
    let (_, lifecycle) = seeded_lifecycle(&[(
        "app-001",
        record("Thabo", "Nkosi", "thabo@example.com", "STU-001"),
    )])
    .await;
    let (router, _) = review_router(lifecycle);

    let response = router
        .clone()
        .oneshot(
            Request::post("/api/v1/admissions/applications/app-001/approve")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], json!("approved"));

    // The mirror has not seen the store change yet, so the precondition
    // fires at the store rather than in the status check.
    let response = router
        .oneshot(
            Request::post("/api/v1/admissions/applications/app-001/approve")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn payment_on_a_pending_application_conflicts() {
    let (_, lifecycle) = seeded_lifecycle(&[(
        "app-001",
        record("Thabo", "Nkosi", "thabo@example.com", "STU-001"),
    )])
    .await;
    let (router, _) = review_router(lifecycle);

    let response = router
        .oneshot(
            Request::post("/api/v1/admissions/applications/app-001/payment")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn payment_attributes_the_session_admin() {
    let (store, lifecycle) = seeded_lifecycle(&[(
        "app-001",
        record_with_status(
            "Thabo",
            "Nkosi",
            "thabo@example.com",
            "STU-001",
            ApplicationStatus::Approved,
        ),
    )])
    .await;
    let (router, sessions) = review_router(lifecycle);

    let token = sessions.open(AdminSession {
        uid: "admin-7".to_string(),
        email: "nomsa@school.example".to_string(),
        is_admin: true,
        admin: None,
        started_at: Utc::now(),
    });

    let response = router
        .oneshot(
            Request::post("/api/v1/admissions/applications/app-001/payment")
                .header(SESSION_TOKEN_HEADER, &token)
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["registrationFee"], json!("paid"));

    let value = store
        .read(&application_path("app-001"))
        .await
        .expect("read works")
        .expect("record present");
    assert_eq!(value["payment"]["approvedBy"], json!("admin-7"));
}

#[tokio::test]
async fn delete_clears_the_record_for_the_detail_view() {
    let (_, lifecycle) = seeded_lifecycle(&[(
        "app-001",
        record("Thabo", "Nkosi", "thabo@example.com", "STU-001"),
    )])
    .await;
    let (router, _) = review_router(lifecycle.clone());

    let response = router
        .clone()
        .oneshot(
            Request::delete("/api/v1/admissions/applications/app-001")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    lifecycle.refresh().await.expect("refresh succeeds");

    let response = router
        .oneshot(
            Request::get("/api/v1/admissions/applications/app-001")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
