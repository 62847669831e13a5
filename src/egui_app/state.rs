//! Shared state types for the egui UI.

use std::path::PathBuf;

use crate::classifier::Prediction;

/// Lifecycle of the single outstanding prediction request.
///
/// Modeled as one enum so a prediction and an error can never be populated at
/// the same time.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestState {
    /// No request issued for the current selection.
    #[default]
    Idle,
    /// A request is in flight; submission is disabled.
    Loading,
    /// The service returned a prediction.
    Succeeded(Prediction),
    /// The request failed; holds the user-facing message.
    Failed(String),
}

impl RequestState {
    /// True while a request is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// The image the user picked for upload. Replaced, never merged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedImage {
    /// Absolute path of the picked file.
    pub path: PathBuf,
    /// Display name shown next to the form.
    pub file_name: String,
}

impl SelectedImage {
    /// Build from a picker path, deriving the display name.
    pub fn from_path(path: PathBuf) -> Self {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, file_name }
    }
}

/// Top-level UI model consumed by the egui renderer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UploadUiState {
    /// Currently selected image, if any.
    pub selected: Option<SelectedImage>,
    /// Lifecycle of the prediction request for the current selection.
    pub request: RequestState,
    /// Whether the explanation panel is open; only meaningful in `Succeeded`.
    pub explanation_open: bool,
}

impl UploadUiState {
    /// Whether the submit control is enabled.
    pub fn can_submit(&self) -> bool {
        self.selected.is_some() && !self.request.is_loading()
    }

    /// Replace the selection and reset all request-derived state.
    pub fn reset_for_new_selection(&mut self, image: SelectedImage) {
        self.selected = Some(image);
        self.request = RequestState::Idle;
        self.explanation_open = false;
    }
}
