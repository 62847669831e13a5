//! Library exports for reuse in integration tests.
/// Application directory helpers.
pub mod app_dirs;
/// Prediction service client.
pub mod classifier;
/// Persisted application configuration.
pub mod config;
/// Shared egui UI modules.
pub mod egui_app;
/// Sanitizing formatter for model explanation text.
pub mod explanation;
/// Logging setup.
pub mod logging;
#[doc(hidden)]
pub mod test_support;
