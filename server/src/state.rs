use anyhow::{Context, Result};
use std::sync::Arc;

use crate::{
    backends::{StorageService, TabularService},
    config::ServerConfig,
    credential::ServiceAccountAuth,
    google::{DriveStorage, SheetsTable},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub storage: Arc<dyn StorageService>,
    pub tabular: Arc<dyn TabularService>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        storage: Arc<dyn StorageService>,
        tabular: Arc<dyn TabularService>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            tabular,
        }
    }

    /// Drive and Sheets backends sharing one HTTP client and one service-account token.
    pub fn google(config: ServerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("formdrop-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        let auth = Arc::new(ServiceAccountAuth::new(
            config.service_account.clone(),
            http.clone(),
        ));
        log::info!("Using service account {}", auth.client_email());

        let storage = Arc::new(DriveStorage::new(http.clone(), Arc::clone(&auth)));
        let tabular = Arc::new(SheetsTable::new(http, auth));
        Ok(Self::new(config, storage, tabular))
    }
}
