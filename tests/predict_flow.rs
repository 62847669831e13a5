//! End-to-end upload/predict lifecycle against a local one-shot HTTP mock.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use mammoguard::classifier::Confidence;
use mammoguard::config::AppConfig;
use mammoguard::egui_app::controller::EguiController;
use mammoguard::egui_app::state::RequestState;
use mammoguard::test_support::serve_once;

fn controller_for(url: String) -> EguiController {
    let mut config = AppConfig::default();
    config.service.predict_url = url;
    EguiController::new(config)
}

fn write_image(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"fake image bytes").unwrap();
    path
}

/// Poll background jobs until the request leaves `Loading`.
fn wait_for_completion(controller: &mut EguiController) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while controller.ui.request.is_loading() {
        assert!(Instant::now() < deadline, "prediction did not complete");
        controller.poll_background_jobs();
        thread::sleep(Duration::from_millis(20));
    }
}

#[test]
fn select_submit_success_toggle_then_reselect_resets() {
    let url = serve_once(
        "200 OK",
        r#"{"class": "Malignant", "confidence": 0.87, "explanation": "**See a specialist** promptly"}"#,
    );
    let dir = tempfile::tempdir().unwrap();
    let mut controller = controller_for(url);

    controller.select_image_from_path(write_image(&dir, "case_a.png"));
    assert_eq!(controller.ui.request, RequestState::Idle);

    controller.submit();
    assert!(controller.ui.request.is_loading());
    assert!(!controller.ui.can_submit());
    wait_for_completion(&mut controller);

    let RequestState::Succeeded(prediction) = controller.ui.request.clone() else {
        panic!("expected success, got {:?}", controller.ui.request);
    };
    assert_eq!(prediction.class, "Malignant");
    assert_eq!(prediction.confidence, Confidence::Number(0.87));
    assert!(!controller.ui.explanation_open);

    controller.toggle_explanation_panel();
    assert!(controller.ui.explanation_open);

    controller.select_image_from_path(write_image(&dir, "case_b.png"));
    assert_eq!(controller.ui.request, RequestState::Idle);
    assert!(!controller.ui.explanation_open);
    assert!(controller.ui.can_submit());
}

#[test]
fn failure_body_error_field_becomes_inline_message() {
    let url = serve_once("400 Bad Request", r#"{"error": "Invalid image"}"#);
    let dir = tempfile::tempdir().unwrap();
    let mut controller = controller_for(url);

    controller.select_image_from_path(write_image(&dir, "broken.jpg"));
    controller.submit();
    wait_for_completion(&mut controller);

    assert_eq!(
        controller.ui.request,
        RequestState::Failed("Invalid image".to_string())
    );
}

#[test]
fn failure_without_error_field_uses_generic_message() {
    let url = serve_once("502 Bad Gateway", r#"{"status": "down"}"#);
    let dir = tempfile::tempdir().unwrap();
    let mut controller = controller_for(url);

    controller.select_image_from_path(write_image(&dir, "scan.png"));
    controller.submit();
    wait_for_completion(&mut controller);

    assert_eq!(
        controller.ui.request,
        RequestState::Failed("Error processing the image".to_string())
    );
}

#[test]
fn submit_without_selection_makes_no_request() {
    // Unroutable endpoint: any network attempt would surface as a transport error.
    let mut controller = controller_for("http://127.0.0.1:9/predict".to_string());
    controller.submit();
    assert_eq!(
        controller.ui.request,
        RequestState::Failed("Please select a file first".to_string())
    );
    assert!(!controller.request_pending());
}

#[test]
fn reselecting_during_flight_drops_the_stale_response() {
    let url = serve_once(
        "200 OK",
        r#"{"class": "Benign", "confidence": 0.99, "explanation": ""}"#,
    );
    let dir = tempfile::tempdir().unwrap();
    let mut controller = controller_for(url);

    controller.select_image_from_path(write_image(&dir, "first.png"));
    controller.submit();
    controller.select_image_from_path(write_image(&dir, "second.png"));

    // The in-flight result for first.png must not overwrite the fresh state.
    let deadline = Instant::now() + Duration::from_secs(10);
    while controller.request_pending() {
        assert!(Instant::now() < deadline, "worker did not finish");
        controller.poll_background_jobs();
        thread::sleep(Duration::from_millis(20));
    }
    controller.poll_background_jobs();
    assert_eq!(controller.ui.request, RequestState::Idle);
    assert!(!controller.ui.explanation_open);
}
