//! Sketch-to-design generation: request types, the client seam and the
//! submit/poll workflow.

mod http;
mod workflow;

pub use http::HttpGenerationClient;
pub use workflow::{
    CancelHandle, DEFAULT_POLL_INTERVAL, GenerationState, GenerationStatus, GenerationWorkflow,
};

use crate::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only failure reason surfaced to callers.
pub const GENERIC_FAILURE: &str = "Failed to generate design";

/// Errors surfaced by the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("Missing prompt or sketchImage")]
    MissingInput,
    #[error("Failed to generate design")]
    Failed,
    #[error("generation canceled")]
    Canceled,
    #[error("no previous request to retry")]
    NothingToRetry,
}

/// Result type for workflow operations.
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Transport-level errors from a [`GenerationClient`]. The workflow logs
/// these and reports [`GenerationError::Failed`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("endpoint returned HTTP {0}")]
    Status(u16),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("{0}")]
    Other(String),
}

/// Result type for client calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// A prompt plus the sketch it describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub prompt: String,
    pub sketch_image: String,
}

impl GenerationRequest {
    /// Build a request, rejecting absent or blank inputs.
    pub fn new(prompt: Option<&str>, sketch_image: Option<&str>) -> GenerationResult<Self> {
        match (non_blank(prompt), non_blank(sketch_image)) {
            (Some(prompt), Some(sketch_image)) => Ok(Self {
                prompt: prompt.to_string(),
                sketch_image: sketch_image.to_string(),
            }),
            _ => Err(GenerationError::MissingInput),
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

/// Generated image(s) in a prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionOutput {
    Single(String),
    Many(Vec<String>),
}

impl PredictionOutput {
    /// The image to display: the value itself, or the first list element.
    pub fn first(&self) -> Option<&str> {
        let url = match self {
            PredictionOutput::Single(url) => Some(url.as_str()),
            PredictionOutput::Many(urls) => urls.first().map(String::as_str),
        };
        url.filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PredictionUrls {
    #[serde(default)]
    pub get: Option<String>,
}

/// Response body from the generation endpoint or a poll URL.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub output: Option<PredictionOutput>,
    #[serde(default)]
    pub urls: Option<PredictionUrls>,
}

/// What a prediction means for the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictionState {
    Succeeded(String),
    /// Still running. `poll_url` is set when the response names where to poll.
    Pending { poll_url: Option<String> },
    Failed,
}

impl Prediction {
    pub fn state(&self) -> PredictionState {
        let first_output = || self.output.as_ref().and_then(PredictionOutput::first);
        match self.status.as_deref() {
            Some("failed") | Some("canceled") => PredictionState::Failed,
            Some("succeeded") | None => match first_output() {
                Some(url) => PredictionState::Succeeded(url.to_string()),
                None => PredictionState::Failed,
            },
            Some(_) => PredictionState::Pending {
                poll_url: self.urls.as_ref().and_then(|u| u.get.clone()),
            },
        }
    }
}

/// Remote generation service.
pub trait GenerationClient: Send + Sync {
    /// Send a new request.
    fn submit<'a>(&'a self, request: &'a GenerationRequest) -> BoxFuture<'a, ClientResult<Prediction>>;

    /// Fetch the current state of a running prediction.
    fn poll<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ClientResult<Prediction>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Prediction {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_missing_input() {
        assert_eq!(
            GenerationRequest::new(Some("gown"), None),
            Err(GenerationError::MissingInput)
        );
        assert_eq!(
            GenerationRequest::new(Some("   "), Some("data:image/png;base64,xx")),
            Err(GenerationError::MissingInput)
        );
        assert!(GenerationRequest::new(Some("gown"), Some("data:image/png;base64,xx")).is_ok());
    }

    #[test]
    fn test_request_wire_names() {
        let request = GenerationRequest::new(Some("p"), Some("s")).unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["prompt"], "p");
        assert_eq!(json["sketchImage"], "s");
    }

    #[test]
    fn test_direct_output() {
        assert_eq!(
            parse(r#"{"output":"https://x/img.png"}"#).state(),
            PredictionState::Succeeded("https://x/img.png".into())
        );
    }

    #[test]
    fn test_list_output_takes_first() {
        assert_eq!(
            parse(r#"{"status":"succeeded","output":["https://x/a.png","https://x/b.png"]}"#).state(),
            PredictionState::Succeeded("https://x/a.png".into())
        );
    }

    #[test]
    fn test_pending_with_poll_url() {
        assert_eq!(
            parse(r#"{"status":"starting","output":null,"urls":{"get":"https://x/poll"}}"#).state(),
            PredictionState::Pending {
                poll_url: Some("https://x/poll".into())
            }
        );
        assert_eq!(
            parse(r#"{"status":"processing"}"#).state(),
            PredictionState::Pending { poll_url: None }
        );
    }

    #[test]
    fn test_failure_shapes() {
        assert_eq!(parse(r#"{"status":"failed"}"#).state(), PredictionState::Failed);
        assert_eq!(parse(r#"{"status":"canceled"}"#).state(), PredictionState::Failed);
        assert_eq!(parse(r#"{"status":"succeeded"}"#).state(), PredictionState::Failed);
        assert_eq!(parse(r#"{"detail":"nope"}"#).state(), PredictionState::Failed);
        assert_eq!(parse(r#"{"output":[]}"#).state(), PredictionState::Failed);
    }
}
