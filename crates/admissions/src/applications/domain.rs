use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Store location of the pending application collection.
pub const PENDING_APPLICATIONS_PATH: &str = "application/pending";

/// Store location of a single application record.
pub fn application_path(id: &str) -> String {
    format!("{PENDING_APPLICATIONS_PATH}/{id}")
}

/// Review state of a submitted application. Approved and rejected are
/// terminal; a record never returns to pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Stored application value. The record id is the store key, never part of
/// the value itself. Field presence is dynamic: anything beyond `status`
/// may be missing on records written by older intake forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub race: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_code: Option<String>,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardian: Option<Guardian>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_school: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subjects: Option<String>,
}

impl ApplicationRecord {
    /// Case-insensitive search over the fields admins actually scan.
    /// Expects `needle` already lowercased; absent fields never match.
    pub fn matches_search(&self, needle: &str) -> bool {
        [
            &self.first_name,
            &self.last_name,
            &self.email,
            &self.student_code,
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
    }

    /// True once the registration fee has been marked paid.
    pub fn registration_fee_paid(&self) -> bool {
        self.payment
            .as_ref()
            .is_some_and(|payment| payment.registration_fee == Some(RegistrationFee::Paid))
    }
}

/// An application record joined with its store id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    #[serde(flatten)]
    pub record: ApplicationRecord,
}

/// Residential address captured at submission, when the applicant provided
/// one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Guardian contact details nested under `guardian/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guardian {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workplace: Option<String>,
}

/// Registration-fee state nested under `payment/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_fee: Option<RegistrationFee>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_fee_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
}

/// The only value ever written for a settled registration fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationFee {
    Paid,
}

/// Dashboard tallies computed with a single pass over the mirror.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub total: usize,
}

/// Decode a raw snapshot of the pending collection. Entries that fail to
/// decode are skipped with a warning so one malformed sibling cannot take
/// down the whole mirror.
pub fn decode_snapshot(value: Option<Value>) -> Option<BTreeMap<String, ApplicationRecord>> {
    let map = match value {
        Some(Value::Object(map)) => map,
        Some(_) => {
            tracing::warn!("ignoring non-object pending snapshot");
            return None;
        }
        None => return None,
    };

    let mut records = BTreeMap::new();
    for (id, raw) in map {
        match serde_json::from_value::<ApplicationRecord>(raw) {
            Ok(record) => {
                records.insert(id, record);
            }
            Err(err) => tracing::warn!(%id, %err, "skipping undecodable application record"),
        }
    }
    Some(records)
}
