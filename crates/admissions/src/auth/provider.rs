use std::collections::HashMap;
use std::sync::Mutex;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand_core::OsRng;
use uuid::Uuid;

/// Identity handed back by the auth provider after a successful credential
/// exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
}

/// Fixed failure codes surfaced by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("email already in use")]
    EmailAlreadyInUse,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("weak password")]
    WeakPassword,
    #[error("password sign-in is disabled")]
    OperationNotAllowed,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("auth provider unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    /// Message shown on the signup form. The first four codes carry fixed
    /// wording; everything else falls through to a generic line.
    pub fn signup_message(&self) -> String {
        match self {
            AuthError::EmailAlreadyInUse => {
                "This email is already registered. Please use a different email.".to_string()
            }
            AuthError::InvalidEmail => "Invalid email address format.".to_string(),
            AuthError::WeakPassword => {
                "Password is too weak. Please use a stronger password.".to_string()
            }
            AuthError::OperationNotAllowed => {
                "Email/password accounts are not enabled. Please contact support.".to_string()
            }
            other => format!("Failed to create admin account: {other}"),
        }
    }
}

/// Message shown on the login form. Sign-in failures are deliberately not
/// distinguished for the user.
pub const SIGN_IN_FAILED_MESSAGE: &str = "Invalid email or password";

/// Credential seam to the external identity provider.
pub trait AuthProvider: Send + Sync {
    fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;
    fn create_account(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;
}

struct StoredAccount {
    uid: String,
    password_hash: String,
}

/// In-process [`AuthProvider`] keeping argon2 password hashes keyed by
/// lowercased email. Hosts the service the same way the in-memory store
/// does.
pub struct DirectoryAuthProvider {
    accounts: Mutex<HashMap<String, StoredAccount>>,
    password_sign_in: bool,
}

impl Default for DirectoryAuthProvider {
    fn default() -> Self {
        Self::with_password_sign_in(true)
    }
}

impl DirectoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// `enabled = false` mirrors a provider with email/password accounts
    /// switched off; every request then fails with `OperationNotAllowed`.
    pub fn with_password_sign_in(enabled: bool) -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            password_sign_in: enabled,
        }
    }
}

impl AuthProvider for DirectoryAuthProvider {
    fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        if !self.password_sign_in {
            return Err(AuthError::OperationNotAllowed);
        }

        let email = email.trim();
        let accounts = self.accounts.lock().expect("account mutex poisoned");
        let account = accounts
            .get(&email.to_lowercase())
            .ok_or(AuthError::InvalidCredentials)?;

        let parsed = PasswordHash::new(&account.password_hash)
            .map_err(|err| AuthError::Unavailable(err.to_string()))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::InvalidCredentials)?;

        Ok(AuthUser {
            uid: account.uid.clone(),
            email: email.to_string(),
        })
    }

    fn create_account(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        if !self.password_sign_in {
            return Err(AuthError::OperationNotAllowed);
        }

        let email = email.trim();
        if !email_is_valid(email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < 6 {
            return Err(AuthError::WeakPassword);
        }

        let key = email.to_lowercase();
        let mut accounts = self.accounts.lock().expect("account mutex poisoned");
        if accounts.contains_key(&key) {
            return Err(AuthError::EmailAlreadyInUse);
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| AuthError::Unavailable(err.to_string()))?
            .to_string();

        let uid = Uuid::new_v4().to_string();
        accounts.insert(
            key,
            StoredAccount {
                uid: uid.clone(),
                password_hash,
            },
        );

        Ok(AuthUser {
            uid,
            email: email.to_string(),
        })
    }
}

fn email_is_valid(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_account_can_sign_in() {
        let provider = DirectoryAuthProvider::new();
        let created = provider
            .create_account("head@school.example", "sekret-9")
            .expect("account creates");

        let signed_in = provider
            .sign_in("head@school.example", "sekret-9")
            .expect("sign-in succeeds");
        assert_eq!(signed_in.uid, created.uid);
        assert_eq!(signed_in.email, "head@school.example");
    }

    #[test]
    fn sign_in_is_case_insensitive_on_email() {
        let provider = DirectoryAuthProvider::new();
        provider
            .create_account("Head@School.example", "sekret-9")
            .expect("account creates");

        assert!(provider.sign_in("head@school.example", "sekret-9").is_ok());
    }

    #[test]
    fn wrong_password_is_invalid_credentials() {
        let provider = DirectoryAuthProvider::new();
        provider
            .create_account("head@school.example", "sekret-9")
            .expect("account creates");

        let err = provider
            .sign_in("head@school.example", "wrong-pass")
            .expect_err("sign-in fails");
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[test]
    fn unknown_email_is_invalid_credentials() {
        let provider = DirectoryAuthProvider::new();
        let err = provider
            .sign_in("ghost@school.example", "whatever")
            .expect_err("sign-in fails");
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let provider = DirectoryAuthProvider::new();
        provider
            .create_account("head@school.example", "sekret-9")
            .expect("first account creates");

        let err = provider
            .create_account("HEAD@school.example", "other-pass")
            .expect_err("duplicate rejected");
        assert_eq!(err, AuthError::EmailAlreadyInUse);
    }

    #[test]
    fn malformed_emails_are_rejected() {
        let provider = DirectoryAuthProvider::new();
        for email in ["", "plain", "@school.example", "head@", "head@school"] {
            let err = provider
                .create_account(email, "sekret-9")
                .expect_err("malformed email rejected");
            assert_eq!(err, AuthError::InvalidEmail, "email: {email:?}");
        }
    }

    #[test]
    fn short_password_is_weak() {
        let provider = DirectoryAuthProvider::new();
        let err = provider
            .create_account("head@school.example", "five5")
            .expect_err("short password rejected");
        assert_eq!(err, AuthError::WeakPassword);
    }

    #[test]
    fn disabled_password_sign_in_blocks_everything() {
        let provider = DirectoryAuthProvider::with_password_sign_in(false);
        assert_eq!(
            provider.create_account("head@school.example", "sekret-9"),
            Err(AuthError::OperationNotAllowed)
        );
        assert_eq!(
            provider.sign_in("head@school.example", "sekret-9"),
            Err(AuthError::OperationNotAllowed)
        );
    }

    #[test]
    fn signup_messages_follow_the_fixed_table() {
        assert_eq!(
            AuthError::EmailAlreadyInUse.signup_message(),
            "This email is already registered. Please use a different email."
        );
        assert_eq!(
            AuthError::InvalidEmail.signup_message(),
            "Invalid email address format."
        );
        assert_eq!(
            AuthError::WeakPassword.signup_message(),
            "Password is too weak. Please use a stronger password."
        );
        assert_eq!(
            AuthError::OperationNotAllowed.signup_message(),
            "Email/password accounts are not enabled. Please contact support."
        );
        assert!(AuthError::Unavailable("down".to_string())
            .signup_message()
            .starts_with("Failed to create admin account: "));
    }
}
