use crate::transcript::MessageId;
use tokio::sync::broadcast;

/// Transcript change notifications for renderers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TranscriptEvent {
    Appended(MessageId),
    Updated(MessageId),
    Finished(MessageId),
}

impl TranscriptEvent {
    pub fn id(&self) -> MessageId {
        match self {
            TranscriptEvent::Appended(id)
            | TranscriptEvent::Updated(id)
            | TranscriptEvent::Finished(id) => *id,
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<TranscriptEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TranscriptEvent> {
        self.tx.subscribe()
    }

    /// Returns the number of receivers; `Err` only means nobody listens
    pub fn publish(
        &self,
        event: TranscriptEvent,
    ) -> Result<usize, broadcast::error::SendError<TranscriptEvent>> {
        self.tx.send(event)
    }
}
