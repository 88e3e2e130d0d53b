//! Streaming client for the analysis endpoint.
//!
//! `ChatClient::analyze` runs one request on its own tokio task, feeds the
//! response body through the SSE decoders and hands typed events to the
//! caller. The returned handle cancels it synchronously.

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use serde_json::json;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::AppConfig;
use crate::error::{parse_error_detail, ClientError};
use crate::events::{parse_frame, StreamEvent};
use crate::sse::{FrameDecoder, Utf8Decoder};

/// Lifecycle of one `analyze` invocation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Requesting,
    Streaming,
    Completed,
    Aborted,
    Failed,
}

impl StreamState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamState::Completed | StreamState::Aborted | StreamState::Failed
        )
    }
}

#[derive(Clone, Debug)]
pub struct ChatClient {
    http: Client,
    endpoint: Url,
}

impl ChatClient {
    /// Client for `{base_url}/chat/analyze` with default settings
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut config = AppConfig::default();
        config.api.base_url = base_url.to_string();
        Self::from_config(&config)
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(config.api.connect_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.analyze_url()?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Start streaming the analysis of `message`.
    ///
    /// Events are passed to `on_event` in arrival order. `on_error` is called
    /// at most once, for a non-success status or a transport failure, and
    /// never after [`AnalysisHandle::cancel`]. Dropping the handle does not
    /// cancel the request.
    ///
    /// Must be called from within a tokio runtime.
    pub fn analyze<E, R>(&self, message: &str, on_event: E, on_error: R) -> AnalysisHandle
    where
        E: FnMut(StreamEvent) + Send + 'static,
        R: FnOnce(ClientError) + Send + 'static,
    {
        let token = CancellationToken::new();
        let task = tokio::spawn(run_analysis(
            self.http.clone(),
            self.endpoint.clone(),
            message.to_string(),
            token.clone(),
            on_event,
            on_error,
        ));

        AnalysisHandle { token, task }
    }
}

/// Handle to one in-flight analysis
#[derive(Debug)]
pub struct AnalysisHandle {
    token: CancellationToken,
    task: JoinHandle<StreamState>,
}

/// Cloneable cancel trigger detached from the task handle
#[derive(Clone, Debug)]
pub struct Canceller(CancellationToken);

impl Canceller {
    pub fn cancel(&self) {
        self.0.cancel();
    }
}

impl AnalysisHandle {
    /// Abort the request. Idempotent; silent towards the callbacks.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn canceller(&self) -> Canceller {
        Canceller(self.token.clone())
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the task and return its terminal state
    pub async fn join(self) -> StreamState {
        match self.task.await {
            Ok(state) => state,
            Err(e) => {
                error!("❌ [STREAM] Analysis task ended abnormally: {}", e);
                StreamState::Failed
            }
        }
    }
}

async fn run_analysis<E, R>(
    http: Client,
    endpoint: Url,
    message: String,
    token: CancellationToken,
    mut on_event: E,
    on_error: R,
) -> StreamState
where
    E: FnMut(StreamEvent) + Send + 'static,
    R: FnOnce(ClientError) + Send + 'static,
{
    let mut state = StreamState::Idle;
    let result = drive(&http, endpoint, &message, &token, &mut state, &mut on_event).await;

    let state = match result {
        Ok(()) => state,
        Err(e) if token.is_cancelled() => {
            debug!("[STREAM] Suppressing error after cancel: {}", e);
            StreamState::Aborted
        }
        Err(e) => {
            error!("❌ [STREAM] Analysis failed in {:?}: {}", state, e);
            on_error(e);
            StreamState::Failed
        }
    };

    debug_assert!(state.is_terminal(), "analysis ended in {:?}", state);
    info!("📡 [STREAM] Analysis finished: {:?}", state);
    state
}

async fn drive<E>(
    http: &Client,
    endpoint: Url,
    message: &str,
    token: &CancellationToken,
    state: &mut StreamState,
    on_event: &mut E,
) -> Result<(), ClientError>
where
    E: FnMut(StreamEvent),
{
    *state = StreamState::Requesting;
    info!("📡 [STREAM] POST {} ({} chars)", endpoint, message.len());

    let request = http
        .post(endpoint)
        .json(&json!({ "message": message }))
        .send();

    let response = tokio::select! {
        biased;
        _ = token.cancelled() => {
            *state = StreamState::Aborted;
            return Ok(());
        }
        response = request => response?,
    };

    let status = response.status();
    if !status.is_success() {
        let body = tokio::select! {
            biased;
            _ = token.cancelled() => {
                *state = StreamState::Aborted;
                return Ok(());
            }
            body = response.text() => body.unwrap_or_default(),
        };
        return Err(ClientError::Http {
            status: status.as_u16(),
            detail: parse_error_detail(&body),
        });
    }

    *state = StreamState::Streaming;
    debug!("[STREAM] Response {} - reading event stream", status);

    let mut body = Box::pin(response.bytes_stream());
    let mut text = Utf8Decoder::new();
    let mut frames = FrameDecoder::new();

    loop {
        let chunk = tokio::select! {
            biased;
            _ = token.cancelled() => {
                *state = StreamState::Aborted;
                return Ok(());
            }
            chunk = body.next() => chunk,
        };

        let Some(chunk) = chunk else {
            if frames.pending() > 0 || text.has_pending() {
                warn!(
                    "⚠️ [SSE] Stream ended with {} undelimited bytes, dropping them",
                    frames.pending()
                );
            }
            *state = StreamState::Completed;
            return Ok(());
        };

        let decoded = text.decode(&chunk?);
        for frame in frames.feed(&decoded) {
            let Some(event) = parse_frame(&frame) else {
                continue;
            };
            if token.is_cancelled() {
                *state = StreamState::Aborted;
                return Ok(());
            }
            debug!("[SSE] Event '{}'", event.kind());
            on_event(event);
        }
    }
}
