//! Read-only view of the external document upload service.

pub mod client;
pub mod router;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::applications::Guardian;

pub use client::{DocumentsClient, DocumentsEnvelope, DocumentsError};
pub use router::{documents_router, DocumentsState};

/// Known document-type tags students upload against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentKind {
    StudentIdCopy,
    PreviousResults,
    GuardianIdCopy,
}

impl DocumentKind {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentKind::StudentIdCopy => "Student ID Copy",
            DocumentKind::PreviousResults => "Previous School Results",
            DocumentKind::GuardianIdCopy => "Guardian ID Copy",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "studentIdCopy" => Some(DocumentKind::StudentIdCopy),
            "previousResults" => Some(DocumentKind::PreviousResults),
            "guardianIdCopy" => Some(DocumentKind::GuardianIdCopy),
            _ => None,
        }
    }
}

/// Display label for a document tag. Unknown tags are echoed verbatim so
/// new upload types render instead of disappearing.
pub fn label_for(tag: &str) -> &str {
    match DocumentKind::parse(tag) {
        Some(kind) => kind.label(),
        None => tag,
    }
}

/// Upload-time metadata the service records per document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Everything the upload service knows about one student: identity echo,
/// a tag to URL mapping, per-tag metadata, and a guardian snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentBundle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
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
    pub student_code: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub documents: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub documents_meta: BTreeMap<String, DocumentMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents_uploaded_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardian: Option<Guardian>,
}

/// Render a byte count the way the documents screen shows it, with up to
/// two decimals and no trailing zeros.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let exponent = ((bytes as f64).ln() / 1024_f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024_f64.powi(exponent as i32);

    let mut rendered = format!("{value:.2}");
    while rendered.ends_with('0') {
        rendered.pop();
    }
    if rendered.ends_with('.') {
        rendered.pop();
    }
    format!("{rendered} {}", UNITS[exponent])
}
