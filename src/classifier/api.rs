//! HTTP client for the mammography prediction endpoint.

use std::fmt;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use serde::Deserialize;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Multipart field name the service expects the image under.
const UPLOAD_FIELD: &str = "file";

/// Fallback shown for request failures without a service-supplied message.
pub const GENERIC_ERROR_MESSAGE: &str = "Error processing the image";

/// Message shown when submitting without a selected file.
pub const NO_FILE_MESSAGE: &str = "Please select a file first";

/// Classification result returned by the service.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Prediction {
    /// Predicted class label, e.g. "Benign" or "Malignant".
    pub class: String,
    /// Confidence as reported by the service.
    pub confidence: Confidence,
    /// Explanatory text; untrusted model output, formatted before display.
    pub explanation: String,
}

/// Confidence value; the service reports either a number or a string.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Confidence {
    Number(f64),
    Text(String),
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// Failures of a prediction attempt.
///
/// `Display` carries the diagnostic detail that goes to the logs;
/// [`PredictError::user_message`] derives the inline text shown in the UI.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("No file selected")]
    NoFileSelected,
    #[error("Image is {size} bytes; the upload limit is {max} bytes")]
    TooLarge { size: u64, max: u64 },
    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Service returned HTTP {code}")]
    Status { code: u16, message: Option<String> },
    #[error("Malformed prediction response: {0}")]
    MalformedResponse(String),
}

impl PredictError {
    /// Inline message surfaced to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::NoFileSelected => NO_FILE_MESSAGE.to_string(),
            Self::TooLarge { size, max } => format!(
                "Image is {:.1} MB; the upload limit is {:.1} MB",
                *size as f64 / (1024.0 * 1024.0),
                *max as f64 / (1024.0 * 1024.0),
            ),
            Self::ReadFile { path, .. } => {
                format!("Could not read {}", path.display())
            }
            Self::Status {
                message: Some(message),
                ..
            } => message.clone(),
            Self::Transport(_) | Self::Status { message: None, .. } | Self::MalformedResponse(_) => {
                GENERIC_ERROR_MESSAGE.to_string()
            }
        }
    }
}

/// Return a shared HTTP client with consistent timeouts.
///
/// Construction happens once; if it fails, every call reports the same
/// transport error instead of panicking.
fn client() -> Result<&'static reqwest::blocking::Client, PredictError> {
    static CLIENT: OnceLock<Result<reqwest::blocking::Client, String>> = OnceLock::new();
    CLIENT
        .get_or_init(|| {
            reqwest::blocking::Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .timeout(REQUEST_TIMEOUT)
                .build()
                .map_err(|err| err.to_string())
        })
        .as_ref()
        .map_err(|err| PredictError::Transport(err.clone()))
}

/// Upload the image at `path` to `url` and return the parsed prediction.
///
/// Blocking; callers run this on a worker thread. No retries.
pub fn predict(url: &str, path: &Path, max_upload_bytes: u64) -> Result<Prediction, PredictError> {
    let bytes = read_image_bytes(path, max_upload_bytes)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    let part = reqwest::blocking::multipart::Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(mime_for_path(path))
        .map_err(|err| PredictError::Transport(err.to_string()))?;
    let form = reqwest::blocking::multipart::Form::new().part(UPLOAD_FIELD, part);

    let response = client()?
        .post(url)
        .multipart(form)
        .send()
        .map_err(|err| {
            tracing::error!("Prediction request failed: {err}");
            PredictError::Transport(err.to_string())
        })?;

    let status = response.status();
    let body = response
        .text()
        .map_err(|err| PredictError::Transport(err.to_string()))?;
    if !status.is_success() {
        tracing::error!("Prediction service returned HTTP {status}: {body}");
        return Err(status_error(status.as_u16(), &body));
    }
    parse_prediction_response(&body)
}

fn read_image_bytes(path: &Path, max_upload_bytes: u64) -> Result<Vec<u8>, PredictError> {
    let metadata = std::fs::metadata(path).map_err(|source| PredictError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    if metadata.len() > max_upload_bytes {
        return Err(PredictError::TooLarge {
            size: metadata.len(),
            max: max_upload_bytes,
        });
    }
    std::fs::read(path).map_err(|source| PredictError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Deserialize)]
struct PredictionWire {
    class: Option<String>,
    confidence: Option<Confidence>,
    explanation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBodyWire {
    error: Option<String>,
    message: Option<String>,
}

fn status_error(code: u16, body: &str) -> PredictError {
    let message = serde_json::from_str::<ErrorBodyWire>(body.trim())
        .ok()
        .and_then(|wire| wire.error.or(wire.message));
    PredictError::Status { code, message }
}

fn parse_prediction_response(body: &str) -> Result<Prediction, PredictError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(PredictError::MalformedResponse(
            "Empty response body".to_string(),
        ));
    }
    let wire: PredictionWire = serde_json::from_str(trimmed)
        .map_err(|err| PredictError::MalformedResponse(err.to_string()))?;
    let (Some(class), Some(confidence)) = (wire.class, wire.confidence) else {
        return Err(PredictError::MalformedResponse(
            "Missing class/confidence in response".to_string(),
        ));
    };
    Ok(Prediction {
        class,
        confidence,
        explanation: wire.explanation.unwrap_or_default(),
    })
}
