use std::fmt;

use crate::constants::DISPLAY_NAME_MAX;
use crate::models::{ExtractionResult, FileView, SelectedFile, SessionView, Statistics};
use crate::services::ocr::ExtractionError;
use crate::services::preview::{format_file_size, truncate_name, ObjectUrl};
use crate::services::text::{TextStats, TextTransform};

/// Everything the user can do to a session.
#[derive(Debug)]
pub enum Event {
    Select {
        file: SelectedFile,
        preview: Option<ObjectUrl>,
    },
    ExtractStarted,
    ExtractFinished(Result<ExtractionResult, ExtractionError>),
    Edit(String),
    Transform(TextTransform),
    ToggleOriginal,
    DismissError,
    ClearAll,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Select { .. } => "select",
            Event::ExtractStarted => "extract_started",
            Event::ExtractFinished(_) => "extract_finished",
            Event::Edit(_) => "edit",
            Event::Transform(_) => "transform",
            Event::ToggleOriginal => "toggle_original",
            Event::DismissError => "dismiss_error",
            Event::ClearAll => "clear_all",
        }
    }

    /// Events accepted while an extraction is outstanding.
    fn allowed_while_loading(&self) -> bool {
        matches!(self, Event::ExtractFinished(_) | Event::DismissError)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    Busy,
    NoFile,
    NotLoading,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Busy => write!(f, "Text extraction is already in progress"),
            SessionError::NoFile => write!(f, "Select an image first"),
            SessionError::NotLoading => write!(f, "No extraction is in progress"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Orchestrator state for one browser session.
#[derive(Debug, Default)]
pub struct Session {
    selected_file: Option<SelectedFile>,
    preview: Option<ObjectUrl>,
    extracted_text: String,
    original_text: Option<String>,
    statistics: Option<Statistics>,
    loading: bool,
    error: Option<String>,
    /// Set once an extraction succeeds; the editor stays open even if the
    /// user deletes every character.
    has_result: bool,
    /// Sequence number of the last client edit applied.
    edit_seq: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&mut self, event: Event) -> Result<(), SessionError> {
        if self.loading && !event.allowed_while_loading() {
            log::debug!("Rejected {} while extraction is running", event.name());
            return Err(SessionError::Busy);
        }

        match event {
            Event::Select { file, preview } => {
                self.selected_file = Some(file);
                // Replacing the guard revokes the previous preview URL.
                self.preview = preview;
                self.clear_result();
                self.error = None;
            }
            Event::ExtractStarted => {
                if self.selected_file.is_none() {
                    return Err(SessionError::NoFile);
                }
                self.loading = true;
                self.error = None;
            }
            Event::ExtractFinished(outcome) => {
                if !self.loading {
                    return Err(SessionError::NotLoading);
                }
                self.loading = false;
                match outcome {
                    Ok(result) if result.text.trim().is_empty() => {
                        self.clear_result();
                        self.error = Some(ExtractionError::NoText.to_string());
                    }
                    Ok(result) => {
                        self.has_result = true;
                        self.extracted_text = result.text;
                        self.original_text = result.original_text;
                        self.statistics = result.statistics;
                    }
                    Err(err) => {
                        log::warn!("Extraction failed: {}", err);
                        self.clear_result();
                        self.error = Some(err.to_string());
                    }
                }
            }
            Event::Edit(text) => self.extracted_text = text,
            Event::Transform(transform) => {
                self.extracted_text = transform.apply(&self.extracted_text);
            }
            Event::ToggleOriginal => {
                if self.can_toggle_original() {
                    if let Some(original) = self.original_text.take() {
                        self.original_text =
                            Some(std::mem::replace(&mut self.extracted_text, original));
                    }
                }
            }
            Event::DismissError => self.error = None,
            Event::ClearAll => {
                // Edits still in flight from before the reset must stay stale.
                *self = Session {
                    edit_seq: self.edit_seq,
                    ..Session::default()
                }
            }
        }

        Ok(())
    }

    /// Applies an edit tagged by the client with an increasing sequence number.
    /// Edits that arrive after a newer one has been applied are dropped and
    /// reported as `false`.
    pub fn edit_in_order(&mut self, text: String, seq: u64) -> Result<bool, SessionError> {
        if seq <= self.edit_seq {
            return Ok(false);
        }
        self.dispatch(Event::Edit(text))?;
        self.edit_seq = seq;
        Ok(true)
    }

    fn clear_result(&mut self) {
        self.has_result = false;
        self.extracted_text.clear();
        self.original_text = None;
        self.statistics = None;
    }

    pub fn can_toggle_original(&self) -> bool {
        match &self.original_text {
            Some(original) => {
                !original.is_empty()
                    && !self.extracted_text.is_empty()
                    && *original != self.extracted_text
            }
            None => false,
        }
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_ref()
    }

    pub fn extracted_text(&self) -> &str {
        &self.extracted_text
    }

    pub fn original_text(&self) -> Option<&str> {
        self.original_text.as_deref()
    }

    pub fn statistics(&self) -> Option<&Statistics> {
        self.statistics.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn preview_url(&self) -> Option<String> {
        self.preview.as_ref().map(ObjectUrl::url)
    }

    pub fn stats(&self) -> TextStats {
        TextStats::of(&self.extracted_text)
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            file: self.selected_file.as_ref().map(|file| FileView {
                name: file.name.clone(),
                display_name: truncate_name(&file.name, DISPLAY_NAME_MAX),
                mime: file.mime.clone(),
                size: file.size(),
                size_label: format_file_size(file.size()),
                preview_url: self.preview_url(),
            }),
            text: self.extracted_text.clone(),
            has_result: self.has_result,
            edit_seq: self.edit_seq,
            has_original: self.original_text.is_some(),
            can_toggle_original: self.can_toggle_original(),
            stats: self.stats().into(),
            statistics: self.statistics.clone(),
            loading: self.loading,
            error: self.error.clone(),
        }
    }
}
