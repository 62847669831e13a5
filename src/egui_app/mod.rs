//! egui UI: state model, controller, and renderer.

pub mod controller;
pub mod jobs;
pub mod state;
pub mod ui;
