#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use formdrop_server::{
    app::{build_router, UPLOAD_PATH},
    backends::{ObjectMetadata, StorageService, TabularService},
    config::{ServerConfig, ServiceAccountKey},
    records::{ReceivedFile, SpreadsheetRow, StoredObject, ValueInputOption},
    state::AppState,
};
use std::{
    path::Path,
    sync::{Arc, Mutex},
};

pub const TEST_KEY_PEM: &str = include_str!("../fixtures/test_service_account.pem");

pub fn test_config(temp_dir: &Path) -> ServerConfig {
    ServerConfig {
        port: 0,
        temp_dir: temp_dir.to_path_buf(),
        drive_folder_id: "folder-123".to_string(),
        spreadsheet_id: "sheet-456".to_string(),
        sheet_range: "Sheet1!A:D".to_string(),
        service_account: test_service_account("http://127.0.0.1:9/token"),
    }
}

pub fn test_service_account(token_uri: &str) -> ServiceAccountKey {
    ServiceAccountKey {
        project_id: "formdrop-test".to_string(),
        private_key_id: "test-key-id".to_string(),
        private_key: TEST_KEY_PEM.to_string(),
        client_email: "uploader@formdrop-test.iam.gserviceaccount.com".to_string(),
        client_id: "1000".to_string(),
        token_uri: token_uri.to_string(),
    }
}

#[derive(Clone, Debug)]
pub struct StoredCall {
    pub name: String,
    pub parents: Vec<String>,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// In-memory Drive stand-in. Objects are never deleted once created.
#[derive(Default)]
pub struct FakeStorage {
    pub calls: Mutex<Vec<StoredCall>>,
    pub fail_with: Option<String>,
}

impl FakeStorage {
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<StoredCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageService for FakeStorage {
    async fn create_object(
        &self,
        metadata: ObjectMetadata,
        file: &ReceivedFile,
    ) -> Result<StoredObject> {
        if let Some(message) = &self.fail_with {
            return Err(anyhow!(message.clone()));
        }
        let bytes = tokio::fs::read(&file.path).await?;
        let mut calls = self.calls.lock().unwrap();
        calls.push(StoredCall {
            name: metadata.name,
            parents: metadata.parents,
            mime_type: file.mime_type.clone(),
            bytes,
        });
        let id = format!("file-{}", calls.len());
        Ok(StoredObject {
            web_view_link: format!("https://drive.google.com/file/d/{}/view?usp=drivesdk", id),
            id,
        })
    }
}

#[derive(Clone, Debug)]
pub struct AppendCall {
    pub spreadsheet_id: String,
    pub range: String,
    pub input: ValueInputOption,
    pub values: Vec<String>,
}

#[derive(Default)]
pub struct FakeTable {
    pub calls: Mutex<Vec<AppendCall>>,
    pub fail_with: Option<String>,
}

impl FakeTable {
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<AppendCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TabularService for FakeTable {
    async fn append_row(
        &self,
        spreadsheet_id: &str,
        range: &str,
        input: ValueInputOption,
        row: SpreadsheetRow,
    ) -> Result<()> {
        self.calls.lock().unwrap().push(AppendCall {
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
            input,
            values: row.into_values(),
        });
        match &self.fail_with {
            Some(message) => Err(anyhow!(message.clone())),
            None => Ok(()),
        }
    }
}

pub fn test_router(
    temp_dir: &Path,
    storage: Arc<FakeStorage>,
    table: Arc<FakeTable>,
) -> Router {
    build_router(AppState::new(test_config(temp_dir), storage, table))
}

/// Hand-assembled multipart/form-data body.
pub struct MultipartBuilder {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBuilder {
    pub fn new() -> Self {
        Self {
            boundary: "----formdrop-test-boundary".to_string(),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, mime: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary, name, filename, mime
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        Request::builder()
            .method("POST")
            .uri(UPLOAD_PATH)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", self.boundary),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}

pub fn spooled_files(temp_dir: &Path) -> usize {
    std::fs::read_dir(temp_dir).map(|d| d.count()).unwrap_or(0)
}
