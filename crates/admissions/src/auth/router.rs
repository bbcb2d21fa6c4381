use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::store::RemoteStore;

use super::provider::{AuthError, AuthProvider, SIGN_IN_FAILED_MESSAGE};
use super::session::{AdminSession, SessionRegistry, SESSION_TOKEN_HEADER};
use super::signup::{register, RegistrationError, SignupForm};

/// Shared state for the credential endpoints.
pub struct AuthState<P, S> {
    pub provider: Arc<P>,
    pub store: Arc<S>,
    pub sessions: Arc<SessionRegistry>,
}

impl<P, S> Clone for AuthState<P, S> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            store: self.store.clone(),
            sessions: self.sessions.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Router builder exposing login, logout, and admin signup.
pub fn auth_router<P, S>(
    provider: Arc<P>,
    store: Arc<S>,
    sessions: Arc<SessionRegistry>,
) -> Router
where
    P: AuthProvider + 'static,
    S: RemoteStore + 'static,
{
    let state = AuthState {
        provider,
        store,
        sessions,
    };
    Router::new()
        .route("/api/v1/auth/login", post(login_handler::<P, S>))
        .route("/api/v1/auth/logout", post(logout_handler::<P, S>))
        .route("/api/v1/auth/signup", post(signup_handler::<P, S>))
        .with_state(state)
}

pub(crate) async fn login_handler<P, S>(
    State(state): State<AuthState<P, S>>,
    Json(request): Json<LoginRequest>,
) -> Response
where
    P: AuthProvider + 'static,
    S: RemoteStore + 'static,
{
    let user = match state.provider.sign_in(&request.email, &request.password) {
        Ok(user) => user,
        Err(error) => {
            tracing::debug!(email = %request.email, %error, "sign-in rejected");
            let payload = json!({ "error": SIGN_IN_FAILED_MESSAGE });
            return (StatusCode::UNAUTHORIZED, Json(payload)).into_response();
        }
    };

    let session = AdminSession::establish(state.store.as_ref(), &user).await;
    let token = state.sessions.open(session.clone());
    let payload = json!({
        "token": token,
        "uid": session.uid,
        "email": session.email,
        "isAdmin": session.is_admin,
        "admin": session.admin,
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn logout_handler<P, S>(
    State(state): State<AuthState<P, S>>,
    headers: HeaderMap,
) -> Response
where
    P: AuthProvider + 'static,
    S: RemoteStore + 'static,
{
    if let Some(token) = header_token(&headers) {
        state.sessions.close(token);
    }
    StatusCode::NO_CONTENT.into_response()
}

pub(crate) async fn signup_handler<P, S>(
    State(state): State<AuthState<P, S>>,
    headers: HeaderMap,
    Json(form): Json<SignupForm>,
) -> Response
where
    P: AuthProvider + 'static,
    S: RemoteStore + 'static,
{
    let created_by = header_token(&headers)
        .and_then(|token| state.sessions.resolve(token))
        .map(|session| session.uid);

    match register(
        state.provider.as_ref(),
        state.store.as_ref(),
        form,
        created_by,
    )
    .await
    {
        Ok(profile) => (StatusCode::CREATED, Json(profile)).into_response(),
        Err(error) => {
            let payload = json!({ "error": error.user_message() });
            (registration_status(&error), Json(payload)).into_response()
        }
    }
}

fn registration_status(error: &RegistrationError) -> StatusCode {
    match error {
        RegistrationError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RegistrationError::Auth(AuthError::EmailAlreadyInUse) => StatusCode::CONFLICT,
        RegistrationError::Auth(AuthError::InvalidEmail | AuthError::WeakPassword) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        RegistrationError::Auth(AuthError::OperationNotAllowed) => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn header_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(SESSION_TOKEN_HEADER)?.to_str().ok()
}
