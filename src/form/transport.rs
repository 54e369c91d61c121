use anyhow::{Context, Result};
use log::info;
use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;

use super::FormFields;

/// Decoded `/api/upload` response body.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadPayload {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub file_url: Option<String>,
    pub error: Option<String>,
    pub details: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadReply {
    pub status: u16,
    /// `None` when the body was not the expected JSON.
    pub payload: Option<UploadPayload>,
}

impl UploadReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status) && self.payload.as_ref().is_some_and(|p| p.success)
    }
}

/// Sends one multipart submission of the form.
pub trait UploadTransport {
    fn send(&self, form: &FormFields) -> Result<UploadReply>;
}

pub struct HttpTransport {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpTransport {
    pub fn new(server: &str, endpoint: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("formdrop/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            url: join_url(server, endpoint),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn build_form(form: &FormFields) -> Result<Form> {
        let mut multipart = Form::new()
            .text("name", form.name.clone())
            .text("email", form.email.clone());

        if let Some(file) = &form.file {
            let part = Part::file(&file.path)
                .with_context(|| format!("Failed to open {}", file.path.display()))?
                .file_name(file.name.clone())
                .mime_str(&file.mime_type)
                .context("Invalid file content type")?;
            multipart = multipart.part("file", part);
        }
        Ok(multipart)
    }
}

impl UploadTransport for HttpTransport {
    fn send(&self, form: &FormFields) -> Result<UploadReply> {
        let multipart = Self::build_form(form)?;
        info!("Uploading to {}", self.url);

        let response = self
            .client
            .post(&self.url)
            .multipart(multipart)
            .send()
            .context("Failed to send upload request")?;

        let status = response.status().as_u16();
        let body = response.text().context("Failed to read upload response")?;
        Ok(UploadReply {
            status,
            payload: serde_json::from_str(&body).ok(),
        })
    }
}

fn join_url(server: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        server.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}
