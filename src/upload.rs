//! Upload state: the selected package and the transient upload feedback.

use crate::validation::{validate, ExtensionSet, SelectedFile};
use log::debug;

/// Holds the currently selected package and the state of its upload.
#[derive(Debug, Default)]
pub struct UploadState {
    selected: Option<SelectedFile>,
    dragging: bool,
    upload_progress: u8,
    error: Option<String>,
}

impl UploadState {
    /// Creates an empty upload state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the file and selects it if it is valid.
    ///
    /// On failure the previous selection is cleared and the validation error is recorded.
    pub fn select(&mut self, file: SelectedFile, extensions: ExtensionSet) -> bool {
        let validation = validate(Some(&file), extensions);
        if validation.is_valid() {
            self.set_selected_file(file);
            true
        } else {
            self.clear();
            self.error = validation.error().map(str::to_owned);
            false
        }
    }

    /// Replaces the selected file. Only called with files that passed validation.
    pub fn set_selected_file(&mut self, file: SelectedFile) {
        debug!("selected `{}` ({} bytes)", file.name(), file.size());
        self.selected = Some(file);
        self.upload_progress = 0;
        self.error = None;
    }

    /// Resets the file, the progress and the error.
    pub fn clear(&mut self) {
        self.selected = None;
        self.upload_progress = 0;
        self.error = None;
    }

    /// Sets the drag feedback flag.
    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    /// Sets the upload progress, capped at 100.
    pub fn set_upload_progress(&mut self, progress: u8) {
        self.upload_progress = progress.min(100);
    }

    /// Records a user facing error.
    pub fn set_error<S: Into<String>>(&mut self, error: S) {
        self.error = Some(error.into());
    }

    /// Gets the selected file.
    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    /// Returns whether something is being dragged over the drop area.
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Gets the upload progress.
    pub fn upload_progress(&self) -> u8 {
        self.upload_progress
    }

    /// Gets the current error.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
