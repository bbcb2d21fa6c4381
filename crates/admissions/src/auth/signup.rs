use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{RemoteStore, StoreError};

use super::provider::{AuthError, AuthProvider};

/// Store location of the admin directory record for a uid.
pub fn admin_path(uid: &str) -> String {
    format!("admins/{uid}")
}

/// Admin directory record seeded at `admins/{uid}` when an account is
/// created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub uid: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub role: AdminRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<Department>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub status: AccountStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    #[default]
    Admin,
    SuperAdmin,
    AdmissionsOfficer,
    AcademicOfficer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Department {
    Admissions,
    Academics,
    Administration,
    Finance,
    StudentAffairs,
    It,
}

/// Directory visibility of an admin account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
}

/// Raw signup form contents, validated before the account is created.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub role: AdminRole,
    #[serde(default, deserialize_with = "department_or_none")]
    pub department: Option<Department>,
}

/// The form posts an empty string when no department is picked; unknown
/// values are treated the same way rather than rejecting the whole form.
fn department_or_none<'de, D>(deserializer: D) -> Result<Option<Department>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Known(Department),
        Other(serde::de::IgnoredAny),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Known(department)) => Ok(Some(department)),
        Some(Raw::Other(_)) | None => Ok(None),
    }
}

/// First-failure validation error for the signup form. Messages are shown
/// to the admin verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignupError {
    #[error("First name is required")]
    MissingFirstName,
    #[error("Last name is required")]
    MissingLastName,
    #[error("Email is required")]
    MissingEmail,
    #[error("Password is required")]
    MissingPassword,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Phone number is required")]
    MissingPhone,
}

impl SignupForm {
    /// Apply the form rules in order, stopping at the first failure.
    pub fn validate(&self) -> Result<(), SignupError> {
        if self.first_name.trim().is_empty() {
            return Err(SignupError::MissingFirstName);
        }
        if self.last_name.trim().is_empty() {
            return Err(SignupError::MissingLastName);
        }
        if self.email.trim().is_empty() {
            return Err(SignupError::MissingEmail);
        }
        if self.password.is_empty() {
            return Err(SignupError::MissingPassword);
        }
        if self.password.chars().count() < 6 {
            return Err(SignupError::PasswordTooShort);
        }
        if self.password != self.confirm_password {
            return Err(SignupError::PasswordMismatch);
        }
        if self.phone.trim().is_empty() {
            return Err(SignupError::MissingPhone);
        }
        Ok(())
    }
}

/// Failure of the full registration flow.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error(transparent)]
    Validation(#[from] SignupError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("failed to encode admin record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RegistrationError {
    /// User-facing form message, matching the signup screen wording.
    pub fn user_message(&self) -> String {
        match self {
            RegistrationError::Validation(err) => err.to_string(),
            RegistrationError::Auth(err) => err.signup_message(),
            RegistrationError::Encode(err) => format!("Failed to create admin account: {err}"),
            RegistrationError::Store(err) => format!("Failed to create admin account: {err}"),
        }
    }
}

/// Validate the form, create the account, and seed the admin directory.
/// `created_by` is the acting admin's uid, or the literal `system` when
/// the account is created unattended.
pub async fn register<P, S>(
    provider: &P,
    store: &S,
    form: SignupForm,
    created_by: Option<String>,
) -> Result<AdminProfile, RegistrationError>
where
    P: AuthProvider,
    S: RemoteStore,
{
    form.validate()?;

    let user = provider.create_account(form.email.trim(), &form.password)?;
    let profile = AdminProfile {
        uid: user.uid,
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        email: form.email.trim().to_string(),
        phone: form.phone.trim().to_string(),
        role: form.role,
        department: form.department,
        created_at: Utc::now(),
        created_by: created_by.unwrap_or_else(|| "system".to_string()),
        status: AccountStatus::Active,
    };

    let value = serde_json::to_value(&profile)?;
    store.put(&admin_path(&profile.uid), value).await?;
    Ok(profile)
}
