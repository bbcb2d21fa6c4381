use admissions::applications::ApplicationLifecycle;
use admissions::auth::{DirectoryAuthProvider, SessionRegistry};
use admissions::config::AppConfig;
use admissions::documents::DocumentsClient;
use admissions::error::AppError;
use admissions::store::MemoryStore;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Wired service graph shared by the HTTP server and the CLI demo.
pub(crate) struct Services {
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) provider: Arc<DirectoryAuthProvider>,
    pub(crate) sessions: Arc<SessionRegistry>,
    pub(crate) lifecycle: Arc<ApplicationLifecycle<MemoryStore>>,
    pub(crate) documents: Arc<DocumentsClient>,
}

pub(crate) fn build_services(config: &AppConfig) -> Result<Services, AppError> {
    let store = Arc::new(MemoryStore::new());
    let lifecycle = Arc::new(ApplicationLifecycle::new(store.clone()));
    let documents = Arc::new(DocumentsClient::new(&config.documents)?);

    Ok(Services {
        store,
        provider: Arc::new(DirectoryAuthProvider::new()),
        sessions: Arc::new(SessionRegistry::new()),
        lifecycle,
        documents,
    })
}
