use axum::{
    extract::{
        multipart::{Field, MultipartError},
        FromRequest, Multipart, Request, State,
    },
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use log::{info, warn};
use serde_json::json;
use std::path::Path;
use tokio::io::AsyncWriteExt;

use crate::{
    backends::ObjectMetadata,
    error::UploadError,
    records::{ReceivedFile, SpreadsheetRow, StoredObject, UploadRequest, UploadResult, ValueInputOption},
    state::AppState,
    storage::{remove_temp_file, temp_path_for},
};

pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB per file
/// Whole-body ceiling: one capped file plus room for the text fields and part headers.
pub const MAX_BODY_SIZE: usize = MAX_FILE_SIZE as usize + 1024 * 1024;

const DEFAULT_MIME: &str = "application/octet-stream";

pub async fn health_check() -> &'static str {
    "OK"
}

/// `/api/upload` for every method: preflight, rejection, or the upload pipeline.
pub async fn upload(State(state): State<AppState>, request: Request) -> Response {
    match *request.method() {
        Method::OPTIONS => return (StatusCode::OK, Json(json!({}))).into_response(),
        Method::POST => {}
        _ => {
            let err = UploadError::MethodNotAllowed;
            err.log();
            return err.into_response();
        }
    }

    match run_pipeline(&state, request).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => {
            err.log();
            err.into_response()
        }
    }
}

async fn run_pipeline(state: &AppState, request: Request) -> Result<UploadResult, UploadError> {
    let form = parse_form(state, request).await?;

    let upload = match validate(form) {
        Ok(upload) => upload,
        Err(rejected) => {
            if let Some(file) = rejected.file {
                discard(&file).await;
            }
            return Err(UploadError::MissingFields);
        }
    };

    let stored = store_file(state, &upload).await?;
    append_record(state, &upload, &stored).await?;
    discard(&upload.file).await;

    info!(
        "Upload complete: {} ({} bytes) from {} -> {}",
        upload.file.original_filename, upload.file.size, upload.email, stored.web_view_link
    );
    Ok(UploadResult::uploaded(stored.web_view_link))
}

/// Form fields as they came off the wire; a repeated key keeps its first value.
#[derive(Debug, Default)]
pub struct RawForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub file: Option<ReceivedFile>,
}

async fn parse_form(state: &AppState, request: Request) -> Result<RawForm, UploadError> {
    let mut multipart = Multipart::from_request(request, state)
        .await
        .map_err(|e| UploadError::Parse(e.to_string()))?;

    let mut form = RawForm::default();
    let result = read_fields(&mut multipart, &mut form, &state.config.temp_dir).await;

    if let Err(err) = result {
        if let Some(file) = form.file.take() {
            discard(&file).await;
        }
        return Err(err);
    }
    Ok(form)
}

async fn read_fields(
    multipart: &mut Multipart,
    form: &mut RawForm,
    temp_dir: &Path,
) -> Result<(), UploadError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(key) = field.name().map(str::to_string) else {
            continue;
        };

        match key.as_str() {
            "name" | "email" => {
                let text = field.text().await.map_err(multipart_error)?;
                let slot = if key == "name" { &mut form.name } else { &mut form.email };
                if slot.is_none() {
                    *slot = Some(text);
                }
            }
            "file" if form.file.is_none() => {
                form.file = spool_file(field, temp_dir).await?;
            }
            _ => {}
        }
    }
    Ok(())
}

/// Hitting the body limit means the file was too big, not that the form was malformed.
fn multipart_error(err: MultipartError) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::FileTooLarge
    } else {
        UploadError::Parse(err.body_text())
    }
}

/// Writes a file part to the temp dir, enforcing `MAX_FILE_SIZE` as bytes arrive.
async fn spool_file(
    mut field: Field<'_>,
    temp_dir: &Path,
) -> Result<Option<ReceivedFile>, UploadError> {
    let original_filename = field.file_name().unwrap_or_default().to_string();
    if original_filename.is_empty() {
        // Browsers send an empty, unnamed part when no file was picked.
        return Ok(None);
    }
    let mime_type = field
        .content_type()
        .filter(|mime| !mime.is_empty())
        .unwrap_or(DEFAULT_MIME)
        .to_string();

    let path = temp_path_for(temp_dir, &original_filename);
    let mut out = tokio::fs::File::create(&path).await?;

    let copied = async {
        let mut size: u64 = 0;
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            size += chunk.len() as u64;
            if size > MAX_FILE_SIZE {
                return Err(UploadError::FileTooLarge);
            }
            out.write_all(&chunk).await?;
        }
        out.flush().await?;
        Ok::<u64, UploadError>(size)
    }
    .await;

    match copied {
        Ok(size) => Ok(Some(ReceivedFile {
            original_filename,
            mime_type,
            size,
            path,
        })),
        Err(err) => {
            drop(out);
            if let Err(e) = remove_temp_file(&path).await {
                warn!("Failed to remove partial upload {}: {}", path.display(), e);
            }
            Err(err)
        }
    }
}

/// Requires non-blank `name`, `email` and a received file; hands the form back otherwise.
pub fn validate(form: RawForm) -> Result<UploadRequest, RawForm> {
    let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
    if !present(&form.name) || !present(&form.email) || form.file.is_none() {
        return Err(form);
    }

    match form {
        RawForm {
            name: Some(name),
            email: Some(email),
            file: Some(file),
        } => Ok(UploadRequest { name, email, file }),
        other => Err(other),
    }
}

async fn store_file(state: &AppState, upload: &UploadRequest) -> Result<StoredObject, UploadError> {
    let metadata = ObjectMetadata {
        name: upload.file.original_filename.clone(),
        parents: vec![state.config.drive_folder_id.clone()],
    };
    state
        .storage
        .create_object(metadata, &upload.file)
        .await
        .map_err(UploadError::Storage)
}

async fn append_record(
    state: &AppState,
    upload: &UploadRequest,
    stored: &StoredObject,
) -> Result<(), UploadError> {
    let row = SpreadsheetRow::new(Utc::now(), &upload.name, &upload.email, &stored.web_view_link);
    state
        .tabular
        .append_row(
            &state.config.spreadsheet_id,
            &state.config.sheet_range,
            ValueInputOption::UserEntered,
            row,
        )
        .await
        .map_err(|source| UploadError::Append {
            stored: stored.clone(),
            source,
        })
}

async fn discard(file: &ReceivedFile) {
    if let Err(e) = remove_temp_file(&file.path).await {
        warn!("Failed to remove temp file {}: {}", file.path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn received() -> ReceivedFile {
        ReceivedFile {
            original_filename: "report.pdf".into(),
            mime_type: "application/pdf".into(),
            size: 3,
            path: PathBuf::from("temp/upload_0.pdf"),
        }
    }

    #[test]
    fn validate_accepts_complete_form() {
        let form = RawForm {
            name: Some("Jane Doe".into()),
            email: Some("jane@example.com".into()),
            file: Some(received()),
        };
        let upload = validate(form).unwrap();
        assert_eq!(upload.name, "Jane Doe");
        assert_eq!(upload.file.original_filename, "report.pdf");
    }

    #[test]
    fn validate_rejects_blank_and_missing_values() {
        let blank = RawForm {
            name: Some("   ".into()),
            email: Some("jane@example.com".into()),
            file: Some(received()),
        };
        let rejected = validate(blank).unwrap_err();
        assert!(rejected.file.is_some(), "spooled file is handed back for cleanup");

        let no_file = RawForm {
            name: Some("Jane".into()),
            email: Some("jane@example.com".into()),
            file: None,
        };
        assert!(validate(no_file).is_err());
        assert!(validate(RawForm::default()).is_err());
    }
}
