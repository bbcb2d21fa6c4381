use crate::cli::ServeArgs;
use crate::infra::{build_services, AppState};
use crate::routes::admin_routes;
use admissions::applications::PENDING_APPLICATIONS_PATH;
use admissions::config::AppConfig;
use admissions::error::AppError;
use admissions::store::RemoteStore;
use admissions::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, metrics_handle) = PrometheusMetricLayer::pair();
    let readiness = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness.clone(),
        metrics: Arc::new(metrics_handle),
    };

    let services = build_services(&config)?;
    services.lifecycle.refresh().await?;

    // Keep the review mirror tracking the store for the life of the server.
    let updates = services.store.subscribe(PENDING_APPLICATIONS_PATH);
    let follower = services.lifecycle.clone();
    tokio::spawn(async move {
        follower.follow(updates).await;
    });

    let app = admin_routes(&services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    readiness.store(true, Ordering::Release);
    info!(?config.environment, %addr, "admissions management service ready");

    axum::serve(listener, app).await?;

    Ok(())
}
