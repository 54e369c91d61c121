use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{env, fmt, fs, path::PathBuf};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TEMP_DIR: &str = "temp";
pub const DEFAULT_SHEET_RANGE: &str = "Sheet1!A:D";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Service-account identity used for every Drive and Sheets call.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    pub client_id: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read service account key {}", path))?;
        let key: ServiceAccountKey = serde_json::from_str(&content)
            .with_context(|| format!("Invalid service account key {}", path))?;
        Ok(key)
    }

    pub fn scopes(&self) -> [&'static str; 2] {
        [DRIVE_FILE_SCOPE, SPREADSHEETS_SCOPE]
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"<redacted>")
            .field("client_email", &self.client_email)
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// Process-wide settings, built once in `main` and shared through `AppState`.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub temp_dir: PathBuf,
    pub drive_folder_id: String,
    pub spreadsheet_id: String,
    pub sheet_range: String,
    pub service_account: ServiceAccountKey,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require = |key: &str| get(key).with_context(|| format!("{} is not set", key));

        let service_account = match get("GOOGLE_APPLICATION_CREDENTIALS") {
            Some(path) => ServiceAccountKey::load_from_file(&path)?,
            None => ServiceAccountKey {
                project_id: require("GOOGLE_PROJECT_ID")?,
                private_key_id: require("GOOGLE_PRIVATE_KEY_ID")?,
                private_key: unescape_private_key(&require("GOOGLE_PRIVATE_KEY")?),
                client_email: require("GOOGLE_CLIENT_EMAIL")?,
                client_id: require("GOOGLE_CLIENT_ID")?,
                token_uri: default_token_uri(),
            },
        };

        if !service_account.private_key.contains("PRIVATE KEY") {
            bail!("Service account private key is not a PEM block");
        }

        let port = match get("PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("PORT is not a valid port: {}", value))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            temp_dir: PathBuf::from(
                get("FORMDROP_TEMP_DIR").unwrap_or_else(|| DEFAULT_TEMP_DIR.to_string()),
            ),
            drive_folder_id: require("GOOGLE_DRIVE_FOLDER_ID")?,
            spreadsheet_id: require("GOOGLE_SPREADSHEET_ID")?,
            sheet_range: get("GOOGLE_SHEET_RANGE").unwrap_or_else(|| DEFAULT_SHEET_RANGE.to_string()),
            service_account,
        })
    }
}

/// Keys pasted into a single-line env var carry literal `\n` sequences.
fn unescape_private_key(raw: &str) -> String {
    raw.replace("\\n", "\n")
}
