//! Upload form controller.
//!
//! The controller owns the form fields and drives a [`FormView`] through the
//! submit lifecycle: validate, mark busy, send once, render the outcome, and
//! always release the busy state afterwards.

use anyhow::{Context, Result};
use log::{debug, error};
use std::{
    path::{Path, PathBuf},
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
};

mod terminal;
mod transport;

pub use terminal::TerminalView;
pub use transport::{HttpTransport, UploadPayload, UploadReply, UploadTransport};

pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB
pub const SIZE_ERROR: &str = "File size must be less than 10MB";
pub const SUCCESS_MESSAGE: &str = "File uploaded successfully!";
pub const FALLBACK_ERROR: &str = "Upload failed";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
    Info,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Success => "success",
            MessageKind::Error => "error",
            MessageKind::Info => "info",
        }
    }
}

/// A file picked for upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

impl SelectedFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        if !metadata.is_file() {
            anyhow::bail!("{} is not a file", path.display());
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file.bin".to_string());
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size: metadata.len(),
            mime_type,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormFields {
    pub name: String,
    pub email: String,
    pub file: Option<SelectedFile>,
}

/// Rendering surface for the form: message area, submit control, file input.
pub trait FormView {
    fn show_message(&self, text: &str, kind: MessageKind);
    fn clear_message(&self);
    /// Disables the submit control and shows the busy indicator, or undoes both.
    fn set_busy(&self, busy: bool);
    fn clear_file_input(&self);
    fn reset_form(&self);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Uploaded { file_url: Option<String> },
    /// Another submission is still in flight.
    Rejected,
    /// Stopped client-side before any request was made.
    Invalid(String),
    Failed(String),
}

/// Clears the in-flight flag however `submit` exits.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct Busy<'a, V: FormView>(&'a V);

impl<'a, V: FormView> Busy<'a, V> {
    fn enter(view: &'a V) -> Self {
        view.set_busy(true);
        Self(view)
    }
}

impl<V: FormView> Drop for Busy<'_, V> {
    fn drop(&mut self) {
        self.0.set_busy(false);
    }
}

pub struct FormController<V, T> {
    view: V,
    transport: T,
    fields: Mutex<FormFields>,
    in_flight: AtomicBool,
}

impl<V: FormView, T: UploadTransport> FormController<V, T> {
    pub fn new(view: V, transport: T) -> Self {
        Self {
            view,
            transport,
            fields: Mutex::new(FormFields::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn fields(&self) -> FormFields {
        self.lock_fields().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.lock_fields().name = name.into();
    }

    pub fn set_email(&self, email: impl Into<String>) {
        self.lock_fields().email = email.into();
    }

    /// File-input change: keeps the file and reports it, or rejects it when too large.
    pub fn select_file(&self, file: SelectedFile) -> bool {
        if file.size > MAX_FILE_SIZE {
            self.view.show_message(SIZE_ERROR, MessageKind::Error);
            self.clear_file_input();
            return false;
        }

        self.view.show_message(
            &format!("Selected: {} ({})", file.name, format_file_size(file.size)),
            MessageKind::Info,
        );
        self.lock_fields().file = Some(file);
        true
    }

    pub fn submit(&self) -> SubmitOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Submit ignored: upload already in progress");
            return SubmitOutcome::Rejected;
        }
        let _in_flight = InFlight(&self.in_flight);

        self.view.clear_message();
        let fields = self.fields();

        if fields.file.as_ref().is_some_and(|f| f.size > MAX_FILE_SIZE) {
            self.view
                .show_message(&format!("Error: {}", SIZE_ERROR), MessageKind::Error);
            self.clear_file_input();
            return SubmitOutcome::Invalid(SIZE_ERROR.to_string());
        }

        let _busy = Busy::enter(&self.view);
        match self.transport.send(&fields) {
            Ok(reply) if reply.is_success() => {
                self.view.show_message(SUCCESS_MESSAGE, MessageKind::Success);
                self.reset_form();
                SubmitOutcome::Uploaded {
                    file_url: reply.payload.and_then(|p| p.file_url),
                }
            }
            Ok(reply) => {
                let reason = reply
                    .payload
                    .and_then(|p| p.error)
                    .unwrap_or_else(|| FALLBACK_ERROR.to_string());
                self.fail(reason)
            }
            Err(e) => self.fail(format!("{:#}", e)),
        }
    }

    fn fail(&self, reason: String) -> SubmitOutcome {
        error!("Upload error: {}", reason);
        self.view
            .show_message(&format!("Error: {}", reason), MessageKind::Error);
        SubmitOutcome::Failed(reason)
    }

    fn clear_file_input(&self) {
        self.lock_fields().file = None;
        self.view.clear_file_input();
    }

    fn reset_form(&self) {
        *self.lock_fields() = FormFields::default();
        self.view.reset_form();
    }

    fn lock_fields(&self) -> MutexGuard<'_, FormFields> {
        // Fields are plain data; a panic elsewhere cannot leave them half-written.
        self.fields.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// `0 Bytes`, `512 Bytes`, `1.5 KB`, `2 MB`: base 1024, at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
