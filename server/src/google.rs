use anyhow::{Context, Result};
use async_trait::async_trait;
use log::info;
use reqwest::{header, Body, Response};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::{
    backends::{ObjectMetadata, StorageService, TabularService},
    credential::ServiceAccountAuth,
    records::{ReceivedFile, SpreadsheetRow, StoredObject, ValueInputOption},
};

pub const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com";
pub const SHEETS_BASE: &str = "https://sheets.googleapis.com";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    web_view_link: Option<String>,
}

async fn ensure_success(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    anyhow::bail!("{} failed ({}): {}", what, status, body.trim())
}

/// Drive v3 storage using the resumable upload protocol.
pub struct DriveStorage {
    http: reqwest::Client,
    auth: Arc<ServiceAccountAuth>,
    base_url: String,
}

impl DriveStorage {
    pub fn new(http: reqwest::Client, auth: Arc<ServiceAccountAuth>) -> Self {
        Self::with_base_url(http, auth, DRIVE_UPLOAD_BASE)
    }

    pub fn with_base_url(
        http: reqwest::Client,
        auth: Arc<ServiceAccountAuth>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            auth,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn open_session(
        &self,
        token: &str,
        metadata: &ObjectMetadata,
        file: &ReceivedFile,
    ) -> Result<String> {
        let url = format!("{}/upload/drive/v3/files", self.base_url);
        let response = self
            .http
            .post(&url)
            .query(&[
                ("uploadType", "resumable"),
                ("supportsAllDrives", "true"),
                ("fields", "id,webViewLink"),
            ])
            .bearer_auth(token)
            .header("X-Upload-Content-Type", &file.mime_type)
            .header("X-Upload-Content-Length", file.size.to_string())
            .json(&json!({
                "name": metadata.name,
                "parents": metadata.parents,
            }))
            .send()
            .await
            .context("Failed to start Drive upload session")?;

        let response = ensure_success(response, "Drive upload session").await?;
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .context("Drive upload session returned no Location header")?;
        Ok(location.to_string())
    }
}

#[async_trait]
impl StorageService for DriveStorage {
    async fn create_object(
        &self,
        metadata: ObjectMetadata,
        file: &ReceivedFile,
    ) -> Result<StoredObject> {
        let token = self.auth.access_token().await?;
        let session_url = self.open_session(&token, &metadata, file).await?;

        let source = tokio::fs::File::open(&file.path)
            .await
            .with_context(|| format!("Failed to open {}", file.path.display()))?;

        let response = self
            .http
            .put(&session_url)
            .bearer_auth(&token)
            .header(header::CONTENT_TYPE, &file.mime_type)
            .header(header::CONTENT_LENGTH, file.size)
            .body(Body::wrap_stream(ReaderStream::new(source)))
            .send()
            .await
            .context("Failed to send file bytes to Drive")?;

        let created: DriveFile = ensure_success(response, "Drive upload")
            .await?
            .json()
            .await
            .context("Failed to parse Drive upload response")?;

        let web_view_link = created
            .web_view_link
            .with_context(|| format!("Drive file {} has no webViewLink", created.id))?;

        info!("Stored {} in Drive as {}", metadata.name, created.id);
        Ok(StoredObject {
            id: created.id,
            web_view_link,
        })
    }
}

/// Sheets v4 `values.append`.
pub struct SheetsTable {
    http: reqwest::Client,
    auth: Arc<ServiceAccountAuth>,
    base_url: String,
}

impl SheetsTable {
    pub fn new(http: reqwest::Client, auth: Arc<ServiceAccountAuth>) -> Self {
        Self::with_base_url(http, auth, SHEETS_BASE)
    }

    pub fn with_base_url(
        http: reqwest::Client,
        auth: Arc<ServiceAccountAuth>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            auth,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TabularService for SheetsTable {
    async fn append_row(
        &self,
        spreadsheet_id: &str,
        range: &str,
        input: ValueInputOption,
        row: SpreadsheetRow,
    ) -> Result<()> {
        let token = self.auth.access_token().await?;
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}:append",
            self.base_url,
            urlencoding::encode(spreadsheet_id),
            urlencoding::encode(range)
        );

        let response = self
            .http
            .post(&url)
            .query(&[("valueInputOption", input.as_str())])
            .bearer_auth(&token)
            .json(&json!({ "values": [row.into_values()] }))
            .send()
            .await
            .context("Failed to reach Sheets API")?;

        ensure_success(response, "Sheets append").await?;
        info!("Appended row to {} ({})", spreadsheet_id, range);
        Ok(())
    }
}
