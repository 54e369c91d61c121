use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// JSON body returned by `/api/upload`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl UploadResult {
    pub fn uploaded(file_url: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some("File uploaded successfully".to_string()),
            file_url: Some(file_url.into()),
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            details,
            ..Default::default()
        }
    }
}

/// A file part received from the multipart body, spooled to the temp dir.
#[derive(Clone, Debug)]
pub struct ReceivedFile {
    pub original_filename: String,
    pub mime_type: String,
    pub size: u64,
    pub path: PathBuf,
}

/// Validated form submission.
#[derive(Clone, Debug)]
pub struct UploadRequest {
    pub name: String,
    pub email: String,
    pub file: ReceivedFile,
}

/// What the storage backend hands back for a created object.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub id: String,
    pub web_view_link: String,
}

/// How the tabular backend should interpret appended cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueInputOption {
    UserEntered,
}

impl ValueInputOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueInputOption::UserEntered => "USER_ENTERED",
        }
    }
}

/// One appended metadata row: timestamp, name, email, file link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpreadsheetRow {
    pub timestamp: String,
    pub name: String,
    pub email: String,
    pub file_url: String,
}

impl SpreadsheetRow {
    pub fn new(at: DateTime<Utc>, name: &str, email: &str, file_url: &str) -> Self {
        Self {
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            name: name.to_string(),
            email: email.to_string(),
            file_url: file_url.to_string(),
        }
    }

    pub fn into_values(self) -> Vec<String> {
        vec![self.timestamp, self.name, self.email, self.file_url]
    }
}
