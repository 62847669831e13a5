//! Client for the remote mammography classification service.

pub mod api;

pub use api::{Confidence, PredictError, Prediction};
