//! Submit-then-poll state machine.

use super::{
    ClientError, GenerationClient, GenerationError, GenerationRequest, GenerationResult,
    PredictionState, GENERIC_FAILURE,
};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, watch};

/// Default wait between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Where a generation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    #[default]
    Idle,
    Submitting,
    Polling,
    Succeeded,
    Failed,
    Canceled,
}

impl GenerationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GenerationStatus::Succeeded | GenerationStatus::Failed | GenerationStatus::Canceled
        )
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GenerationStatus::Idle => "idle",
            GenerationStatus::Submitting => "submitting",
            GenerationStatus::Polling => "polling",
            GenerationStatus::Succeeded => "succeeded",
            GenerationStatus::Failed => "failed",
            GenerationStatus::Canceled => "canceled",
        };
        f.write_str(name)
    }
}

/// Snapshot published to observers on every transition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct GenerationState {
    pub status: GenerationStatus,
    /// Result image URI once succeeded.
    pub result: Option<String>,
    /// Generic failure reason once failed.
    pub error: Option<String>,
    /// Status polls performed for the current request.
    pub polls: u32,
}

#[derive(Debug, Default)]
struct CancelInner {
    canceled: AtomicBool,
    notify: Notify,
}

/// Cooperative cancellation flag for a running generation.
///
/// Checked before every poll; a pending poll wait is woken immediately.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    inner: Arc<CancelInner>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.inner.canceled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_canceled(&self) -> bool {
        self.inner.canceled.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.inner.canceled.store(false, Ordering::SeqCst);
    }

    /// Sleep for `duration`, returning early (with `false`) on cancel.
    async fn sleep(&self, duration: Duration) -> bool {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_canceled() {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => !self.is_canceled(),
            _ = notified => false,
        }
    }
}

/// Drives one generation at a time against a [`GenerationClient`].
///
/// `submit` and `retry` take `&mut self`, so a workflow can never have two
/// requests in flight.
pub struct GenerationWorkflow<C> {
    client: C,
    poll_interval: Duration,
    state: watch::Sender<GenerationState>,
    cancel: CancelHandle,
    last_request: Option<GenerationRequest>,
}

impl<C: GenerationClient> GenerationWorkflow<C> {
    pub fn new(client: C) -> Self {
        let (state, _) = watch::channel(GenerationState::default());
        Self {
            client,
            poll_interval: DEFAULT_POLL_INTERVAL,
            state,
            cancel: CancelHandle::default(),
            last_request: None,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Current state.
    pub fn state(&self) -> GenerationState {
        self.state.borrow().clone()
    }

    /// Receive every state transition.
    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.state.subscribe()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn last_request(&self) -> Option<&GenerationRequest> {
        self.last_request.as_ref()
    }

    /// Submit a prompt and sketch. Missing inputs fail without touching the
    /// network or the state.
    pub async fn submit(
        &mut self,
        prompt: Option<&str>,
        sketch_image: Option<&str>,
    ) -> GenerationResult<String> {
        let request = GenerationRequest::new(prompt, sketch_image)?;
        self.last_request = Some(request.clone());
        self.run(&request).await
    }

    /// Submit a prepared request.
    pub async fn submit_request(&mut self, request: GenerationRequest) -> GenerationResult<String> {
        let request = GenerationRequest::new(Some(&request.prompt), Some(&request.sketch_image))?;
        self.last_request = Some(request.clone());
        self.run(&request).await
    }

    /// Re-submit the last prompt/sketch pair.
    pub async fn retry(&mut self) -> GenerationResult<String> {
        let request = self
            .last_request
            .clone()
            .ok_or(GenerationError::NothingToRetry)?;
        log::info!("retrying generation");
        self.run(&request).await
    }

    async fn run(&mut self, request: &GenerationRequest) -> GenerationResult<String> {
        self.cancel.reset();
        self.publish(GenerationState {
            status: GenerationStatus::Submitting,
            ..GenerationState::default()
        });

        let first = match self.client.submit(request).await {
            Ok(prediction) => prediction,
            Err(e) => return self.fail(&e),
        };
        let mut poll_url = match first.state() {
            PredictionState::Succeeded(url) => return self.succeed(url),
            PredictionState::Failed => {
                return self.fail(&ClientError::Other(format!(
                    "endpoint reported failure: {:?}",
                    first.status
                )));
            }
            PredictionState::Pending { poll_url: Some(url) } => url,
            PredictionState::Pending { poll_url: None } => {
                return self.fail(&ClientError::Other(
                    "pending response without a poll URL".to_string(),
                ));
            }
        };

        self.state.send_modify(|s| s.status = GenerationStatus::Polling);
        log::debug!("polling {}", poll_url);

        loop {
            if self.cancel.is_canceled() || !self.cancel.sleep(self.poll_interval).await {
                return self.canceled();
            }
            let prediction = match self.client.poll(&poll_url).await {
                Ok(prediction) => prediction,
                Err(e) => return self.fail(&e),
            };
            self.state.send_modify(|s| s.polls += 1);
            match prediction.state() {
                PredictionState::Succeeded(url) => return self.succeed(url),
                PredictionState::Failed => {
                    return self.fail(&ClientError::Other(format!(
                        "prediction ended with status {:?}",
                        prediction.status
                    )));
                }
                PredictionState::Pending { poll_url: next } => {
                    if let Some(next) = next {
                        poll_url = next;
                    }
                }
            }
        }
    }

    fn publish(&self, state: GenerationState) {
        self.state.send_replace(state);
    }

    fn succeed(&self, url: String) -> GenerationResult<String> {
        log::info!("generation succeeded: {}", url);
        self.state.send_modify(|s| {
            s.status = GenerationStatus::Succeeded;
            s.result = Some(url.clone());
            s.error = None;
        });
        Ok(url)
    }

    fn fail(&self, cause: &ClientError) -> GenerationResult<String> {
        log::warn!("generation failed: {}", cause);
        self.state.send_modify(|s| {
            s.status = GenerationStatus::Failed;
            s.result = None;
            s.error = Some(GENERIC_FAILURE.to_string());
        });
        Err(GenerationError::Failed)
    }

    fn canceled(&self) -> GenerationResult<String> {
        log::info!("generation canceled");
        self.state.send_modify(|s| s.status = GenerationStatus::Canceled);
        Err(GenerationError::Canceled)
    }
}
