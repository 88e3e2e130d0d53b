use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::bus::{EventBus, TranscriptEvent};
use crate::client::{AnalysisHandle, ChatClient};
use crate::constants::chat::BUS_CAPACITY;
use crate::error::ClientError;
use crate::events::StreamEvent;
use crate::transcript::{ApplyOutcome, ChatMessage, MessageId, Submission, Transcript};

/// A submitted turn whose analysis is streaming
#[derive(Debug)]
pub struct ActiveTurn {
    pub submission: Submission,
    pub handle: AnalysisHandle,
}

/// Chat state shared between the UI and the streaming tasks.
///
/// All transcript writes go through one mutex; each turn only ever touches
/// its own placeholder.
#[derive(Clone)]
pub struct ChatSession {
    client: ChatClient,
    transcript: Arc<Mutex<Transcript>>,
    bus: EventBus,
}

impl ChatSession {
    pub fn new(client: ChatClient, welcome: Option<&str>) -> Self {
        let transcript = match welcome {
            Some(text) => Transcript::with_welcome(text),
            None => Transcript::new(),
        };

        Self {
            client,
            transcript: Arc::new(Mutex::new(transcript)),
            bus: EventBus::new(BUS_CAPACITY),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TranscriptEvent> {
        self.bus.subscribe()
    }

    /// Submit `input` and start streaming its analysis.
    ///
    /// Returns `None` (and changes nothing) for blank input.
    pub fn send(&self, input: &str) -> Option<ActiveTurn> {
        let submission = lock(&self.transcript).submit(input)?;
        let id = submission.assistant_id;

        info!("💬 [SESSION] New turn {} -> '{}'", id, submission.text);
        self.bus.publish(TranscriptEvent::Appended(submission.user_id)).ok();
        self.bus.publish(TranscriptEvent::Appended(id)).ok();

        let (transcript, bus) = (Arc::clone(&self.transcript), self.bus.clone());
        let on_event = move |event: StreamEvent| {
            let outcome = lock(&transcript).apply(id, &event);
            notify(&bus, id, outcome);
        };

        let (transcript, bus) = (Arc::clone(&self.transcript), self.bus.clone());
        let on_error = move |err: ClientError| {
            let outcome = lock(&transcript).fail(id, &err.to_string());
            notify(&bus, id, outcome);
        };

        let handle = self.client.analyze(&submission.text, on_event, on_error);
        Some(ActiveTurn { submission, handle })
    }

    pub fn snapshot(&self) -> Vec<ChatMessage> {
        lock(&self.transcript).messages().to_vec()
    }

    pub fn message(&self, id: MessageId) -> Option<ChatMessage> {
        lock(&self.transcript).get(id).cloned()
    }

    pub fn is_streaming(&self) -> bool {
        lock(&self.transcript).is_streaming()
    }

    /// Transcript as pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&*lock(&self.transcript))
    }
}

fn lock(transcript: &Mutex<Transcript>) -> MutexGuard<'_, Transcript> {
    transcript.lock().unwrap_or_else(PoisonError::into_inner)
}

fn notify(bus: &EventBus, id: MessageId, outcome: ApplyOutcome) {
    let event = match outcome {
        ApplyOutcome::Updated => TranscriptEvent::Updated(id),
        ApplyOutcome::Finished => TranscriptEvent::Finished(id),
        ApplyOutcome::Ignored => {
            debug!("[SESSION] Event for {} had no effect", id);
            return;
        }
    };
    bus.publish(event).ok();
}
