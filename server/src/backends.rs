use anyhow::Result;
use async_trait::async_trait;

use crate::records::{ReceivedFile, SpreadsheetRow, StoredObject, ValueInputOption};

/// File metadata sent alongside the media on upload.
#[derive(Clone, Debug)]
pub struct ObjectMetadata {
    pub name: String,
    pub parents: Vec<String>,
}

/// Storage backend holding uploaded binaries.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Streams `file` into storage and returns its id plus a browser link.
    async fn create_object(&self, metadata: ObjectMetadata, file: &ReceivedFile)
        -> Result<StoredObject>;
}

/// Spreadsheet backend that appends rows to a range.
#[async_trait]
pub trait TabularService: Send + Sync {
    async fn append_row(
        &self,
        spreadsheet_id: &str,
        range: &str,
        input: ValueInputOption,
        row: SpreadsheetRow,
    ) -> Result<()>;
}
