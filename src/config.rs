use log::info;
use serde::{Deserialize, Serialize};
use std::fs;

pub const CONFIG_FILE: &str = ".formdrop.toml";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_ENDPOINT: &str = "/api/upload";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    #[serde(default = "default_server")]
    pub server: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

fn default_server() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            endpoint: default_endpoint(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientConfig>,
}

impl AppConfig {
    pub fn load_from_file(path: &str) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Client settings with CLI overrides applied on top of the file.
    pub fn resolve_client(&self, server: Option<String>, endpoint: Option<String>) -> ClientConfig {
        let base = self.client.clone().unwrap_or_default();
        ClientConfig {
            server: server.unwrap_or(base.server),
            endpoint: endpoint.unwrap_or(base.endpoint),
        }
    }

    pub fn generate_config_file(path: &str, force: bool) -> anyhow::Result<()> {
        if std::path::Path::new(path).exists() && !force {
            anyhow::bail!(
                "Configuration file {} already exists. Use --force to overwrite.",
                path
            );
        }

        fs::write(path, Self::generate_full_config()?)?;

        info!("Configuration file generated: {}", path);
        info!("Please edit this file to point at your upload server");
        Ok(())
    }

    pub fn generate_full_config() -> anyhow::Result<String> {
        let config = AppConfig {
            client: Some(ClientConfig::default()),
        };
        let toml_content = toml::to_string_pretty(&config)?;
        Ok(format!(
            "# formdrop configuration file\n# All fields are optional, command line arguments override config file values\n\n{}",
            toml_content
        ))
    }
}
