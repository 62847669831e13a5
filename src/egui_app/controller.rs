//! Maintains app state and bridges the prediction client to the egui UI.

use std::path::PathBuf;

use rfd::FileDialog;

use crate::classifier::PredictError;
use crate::config::AppConfig;
use crate::egui_app::jobs::{ControllerJobs, JobMessage, PredictJob, PredictJobResult};
use crate::egui_app::state::{RequestState, SelectedImage, UploadUiState};

/// Drives the upload/predict lifecycle and owns the UI state.
pub struct EguiController {
    /// State consumed by the renderer.
    pub ui: UploadUiState,
    config: AppConfig,
    jobs: ControllerJobs,
}

impl EguiController {
    /// Create a controller from loaded configuration.
    pub fn new(config: AppConfig) -> Self {
        Self {
            ui: UploadUiState::default(),
            config,
            jobs: ControllerJobs::new(),
        }
    }

    /// Pick an image via the native file dialog.
    ///
    /// The extension filter is advisory; the service validates content.
    pub fn select_image_via_dialog(&mut self) {
        let Some(path) = FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg"])
            .pick_file()
        else {
            return;
        };
        self.select_image_from_path(path);
    }

    /// Select an image from a known path, replacing any prior selection.
    ///
    /// Resets the request lifecycle to `Idle`, closes the explanation panel,
    /// and invalidates any in-flight request so a stale response cannot
    /// overwrite state for the new selection.
    pub fn select_image_from_path(&mut self, path: PathBuf) {
        self.jobs.bump_generation();
        let image = SelectedImage::from_path(path);
        tracing::info!("Selected image {}", image.file_name);
        self.ui.reset_for_new_selection(image);
    }

    /// Submit the selected image to the prediction service.
    ///
    /// Without a selection this fails locally with no network activity. At
    /// most one request runs per selection; the submit control is disabled
    /// while `Loading`.
    pub fn submit(&mut self) {
        if self.ui.request.is_loading() {
            return;
        }
        let Some(selected) = self.ui.selected.clone() else {
            self.ui.request = RequestState::Failed(PredictError::NoFileSelected.user_message());
            return;
        };

        tracing::info!("Uploading {} for prediction", selected.file_name);
        self.ui.request = RequestState::Loading;
        self.ui.explanation_open = false;
        self.jobs.begin_predict(PredictJob {
            generation: self.jobs.current_generation(),
            url: self.config.service.predict_url.clone(),
            path: selected.path,
            max_upload_bytes: self.config.service.max_upload_bytes,
        });
    }

    /// Flip the explanation panel; only reachable while a prediction is shown.
    pub fn toggle_explanation_panel(&mut self) {
        if !matches!(self.ui.request, RequestState::Succeeded(_)) {
            return;
        }
        self.ui.explanation_open = !self.ui.explanation_open;
    }

    /// True while any prediction worker is still running.
    pub fn request_pending(&self) -> bool {
        self.jobs.predict_in_progress()
    }

    /// Drain completed background work into UI state.
    pub fn poll_background_jobs(&mut self) {
        loop {
            let message = match self.jobs.try_recv_message() {
                Ok(message) => message,
                Err(
                    std::sync::mpsc::TryRecvError::Empty
                    | std::sync::mpsc::TryRecvError::Disconnected,
                ) => break,
            };
            match message {
                JobMessage::PredictFinished(result) => {
                    self.jobs.predict_finished();
                    self.apply_predict_result(result);
                }
            }
        }
    }

    fn apply_predict_result(&mut self, message: PredictJobResult) {
        if message.generation != self.jobs.current_generation() {
            tracing::debug!("Dropping prediction result for a superseded selection");
            return;
        }
        match message.result {
            Ok(prediction) => {
                tracing::info!(
                    "Prediction received: {} ({})",
                    prediction.class,
                    prediction.confidence
                );
                self.ui.request = RequestState::Succeeded(prediction);
                self.ui.explanation_open = false;
            }
            Err(err) => {
                tracing::error!("Prediction failed: {err}");
                self.ui.request = RequestState::Failed(err.user_message());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Confidence, Prediction};

    fn controller() -> EguiController {
        EguiController::new(AppConfig::default())
    }

    fn prediction() -> Prediction {
        Prediction {
            class: "Benign".to_string(),
            confidence: Confidence::Number(0.92),
            explanation: "<b>ok</b>".to_string(),
        }
    }

    fn finished(generation: u64, result: Result<Prediction, PredictError>) -> PredictJobResult {
        PredictJobResult { generation, result }
    }

    #[test]
    fn submit_without_selection_fails_locally() {
        let mut controller = controller();
        controller.submit();
        assert_eq!(
            controller.ui.request,
            RequestState::Failed("Please select a file first".to_string())
        );
        assert!(!controller.request_pending());
    }

    #[test]
    fn success_result_populates_prediction_with_panel_closed() {
        let mut controller = controller();
        controller.select_image_from_path("scan.png".into());
        controller.ui.request = RequestState::Loading;
        let generation = controller.jobs.current_generation();
        controller.apply_predict_result(finished(generation, Ok(prediction())));
        assert_eq!(controller.ui.request, RequestState::Succeeded(prediction()));
        assert!(!controller.ui.explanation_open);
    }

    #[test]
    fn failure_result_carries_user_message() {
        let mut controller = controller();
        controller.select_image_from_path("scan.png".into());
        controller.ui.request = RequestState::Loading;
        let generation = controller.jobs.current_generation();
        controller.apply_predict_result(finished(
            generation,
            Err(PredictError::Status {
                code: 400,
                message: Some("Invalid image".to_string()),
            }),
        ));
        assert_eq!(
            controller.ui.request,
            RequestState::Failed("Invalid image".to_string())
        );
    }

    #[test]
    fn stale_result_is_dropped_after_reselection() {
        let mut controller = controller();
        controller.select_image_from_path("a.png".into());
        controller.ui.request = RequestState::Loading;
        let stale = controller.jobs.current_generation();

        controller.select_image_from_path("b.png".into());
        controller.apply_predict_result(finished(stale, Ok(prediction())));
        assert_eq!(controller.ui.request, RequestState::Idle);
        assert!(!controller.ui.explanation_open);
    }

    #[test]
    fn panel_toggle_is_an_idempotent_pair_and_gated_on_success() {
        let mut controller = controller();
        controller.toggle_explanation_panel();
        assert!(!controller.ui.explanation_open);

        controller.ui.request = RequestState::Succeeded(prediction());
        controller.toggle_explanation_panel();
        assert!(controller.ui.explanation_open);
        controller.toggle_explanation_panel();
        assert!(!controller.ui.explanation_open);
    }

    #[test]
    fn reselecting_after_success_returns_to_idle() {
        let mut controller = controller();
        controller.select_image_from_path("a.png".into());
        controller.ui.request = RequestState::Succeeded(prediction());
        controller.ui.explanation_open = true;

        controller.select_image_from_path("b.png".into());
        assert_eq!(controller.ui.request, RequestState::Idle);
        assert!(!controller.ui.explanation_open);
        assert!(controller.ui.can_submit());
    }
}
