use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::store::RemoteStore;

use super::provider::AuthUser;
use super::signup::{admin_path, AdminProfile};

/// Request header carrying the opaque session token.
pub const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// Signed-in context established after a credential exchange. Passed
/// explicitly to whatever needs the acting identity; there is no ambient
/// current-user global.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub uid: String,
    pub email: String,
    pub is_admin: bool,
    pub admin: Option<AdminProfile>,
    pub started_at: DateTime<Utc>,
}

impl AdminSession {
    /// Build the session for a signed-in user by consulting the
    /// `admins/{uid}` directory. A missing or unreadable record demotes
    /// the session to non-admin instead of failing sign-in.
    pub async fn establish<S: RemoteStore>(store: &S, user: &AuthUser) -> Self {
        let admin = match store.read(&admin_path(&user.uid)).await {
            Ok(Some(value)) => match serde_json::from_value::<AdminProfile>(value) {
                Ok(profile) => Some(profile),
                Err(err) => {
                    tracing::warn!(uid = %user.uid, %err, "undecodable admin directory record");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(uid = %user.uid, %err, "admin directory lookup failed");
                None
            }
        };

        Self {
            uid: user.uid.clone(),
            email: user.email.clone(),
            is_admin: admin.is_some(),
            admin,
            started_at: Utc::now(),
        }
    }
}

/// Token-keyed registry of live sessions with an explicit open/close
/// lifecycle.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, AdminSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the session and mint its opaque token.
    pub fn open(&self, session: AdminSession) -> String {
        let token = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        sessions.insert(token.clone(), session);
        token
    }

    pub fn resolve(&self, token: &str) -> Option<AdminSession> {
        let sessions = self.sessions.lock().expect("session mutex poisoned");
        sessions.get(token).cloned()
    }

    /// Drop the session for `token`. Closing an unknown token is a no-op.
    pub fn close(&self, token: &str) -> bool {
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        sessions.remove(token).is_some()
    }
}
