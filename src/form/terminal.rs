use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use std::{sync::Mutex, time::Duration};

use super::{FormView, MessageKind};

/// Renders the form on a terminal: messages on stderr, a spinner while busy.
#[derive(Default)]
pub struct TerminalView {
    spinner: Mutex<Option<ProgressBar>>,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FormView for TerminalView {
    fn show_message(&self, text: &str, kind: MessageKind) {
        debug!("message ({}): {}", kind.as_str(), text);
        eprintln!("{}", text);
    }

    fn clear_message(&self) {}

    fn set_busy(&self, busy: bool) {
        let mut spinner = match self.spinner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if busy {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} {elapsed}") {
                bar.set_style(style);
            }
            bar.set_message("Uploading...");
            bar.enable_steady_tick(Duration::from_millis(120));
            *spinner = Some(bar);
        } else if let Some(bar) = spinner.take() {
            bar.finish_and_clear();
        }
    }

    fn clear_file_input(&self) {
        debug!("file input cleared");
    }

    fn reset_form(&self) {
        debug!("form reset");
    }
}
