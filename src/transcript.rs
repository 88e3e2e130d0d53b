//! Chat transcript state and the event reducer.
//!
//! Messages are created on submission, mutated by id while their stream is
//! open, and frozen by the first terminal event.

use std::fmt::{self, Write};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::constants::status;
use crate::events::{format_number, AnalysisResult, DecisionEntry, StreamEvent};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_streaming: bool,
}

impl ChatMessage {
    fn new(role: Role, content: String, is_streaming: bool) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content,
            created_at: Utc::now(),
            is_streaming,
        }
    }
}

/// Ids created by one submission
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub user_id: MessageId,
    pub assistant_id: MessageId,
    /// Trimmed text that was recorded and should be sent
    pub text: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Placeholder content changed, still streaming
    Updated,
    /// Placeholder reached its terminal state
    Finished,
    /// Unknown id, or the placeholder was already finished
    Ignored,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transcript seeded with a system greeting
    pub fn with_welcome(text: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::new(Role::System, text.into(), false)],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn get(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Any assistant placeholder still open
    pub fn is_streaming(&self) -> bool {
        self.messages.iter().any(|m| m.is_streaming)
    }

    /// Record a user turn and its streaming placeholder.
    ///
    /// Whitespace-only input creates nothing and returns `None`.
    pub fn submit(&mut self, input: &str) -> Option<Submission> {
        let text = input.trim();
        if text.is_empty() {
            return None;
        }

        let user = ChatMessage::new(Role::User, text.to_string(), false);
        let assistant = ChatMessage::new(Role::Assistant, String::new(), true);
        let submission = Submission {
            user_id: user.id,
            assistant_id: assistant.id,
            text: text.to_string(),
        };

        self.messages.push(user);
        self.messages.push(assistant);
        Some(submission)
    }

    /// Fold one stream event into the placeholder `id`
    pub fn apply(&mut self, id: MessageId, event: &StreamEvent) -> ApplyOutcome {
        let Some(message) = self.open_placeholder(id, event.kind()) else {
            return ApplyOutcome::Ignored;
        };

        match event {
            StreamEvent::Start => {
                message.content = status::STARTING.to_string();
                ApplyOutcome::Updated
            }
            StreamEvent::Progress { status, analysis } => {
                message.content = match analysis.as_deref() {
                    Some(a) if !a.is_empty() => format!("{}\n\n{}", status, a),
                    _ => status.clone(),
                };
                ApplyOutcome::Updated
            }
            StreamEvent::Complete { result } => {
                message.content = render_analysis(result);
                message.is_streaming = false;
                ApplyOutcome::Finished
            }
            StreamEvent::Error { message: text } => {
                message.content = format!("{}{}", status::ERROR_PREFIX, text);
                message.is_streaming = false;
                ApplyOutcome::Finished
            }
        }
    }

    /// Terminate the placeholder with a transport failure
    pub fn fail(&mut self, id: MessageId, error_message: &str) -> ApplyOutcome {
        let Some(message) = self.open_placeholder(id, "transport failure") else {
            return ApplyOutcome::Ignored;
        };
        message.content = format!("{}{}", status::ERROR_PREFIX, error_message);
        message.is_streaming = false;
        ApplyOutcome::Finished
    }

    fn open_placeholder(&mut self, id: MessageId, what: &str) -> Option<&mut ChatMessage> {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == id) else {
            debug!("[CHAT] Dropping {} for unknown message {}", what, id);
            return None;
        };
        if !message.is_streaming {
            warn!("⚠️ [CHAT] Dropping {} for finished message {}", what, id);
            return None;
        }
        Some(message)
    }
}

/// Human-readable summary of a completed analysis
pub fn render_analysis(result: &AnalysisResult) -> String {
    let mut out = format!("{}\n\n", status::COMPLETE_HEADER);

    if !result.decisions.is_empty() {
        out.push_str(status::DECISIONS_HEADER);
        out.push('\n');
        for (ticker, entry) in &result.decisions {
            match entry {
                DecisionEntry::Structured(decision) => {
                    let _ = writeln!(out, "\n{}:", ticker);
                    if let Some(action) = &decision.action {
                        let _ = writeln!(out, "  Action: {}", action);
                    }
                    if let Some(quantity) = &decision.quantity {
                        let _ = writeln!(out, "  Quantity: {}", quantity);
                    }
                    if let Some(reasoning) = &decision.reasoning {
                        let _ = writeln!(out, "  Reasoning: {}", reasoning);
                    }
                }
                DecisionEntry::Raw(value) => {
                    let _ = writeln!(out, "\n{}: {}", ticker, display_raw(value));
                }
            }
        }
    }

    if !result.analyst_signals.is_empty() {
        let _ = writeln!(out, "\n\n{}", status::SIGNALS_HEADER);
        for report in &result.analyst_signals {
            let _ = writeln!(out, "\n{}:", report.analyst);
            for signal in &report.signals {
                let label = signal.signal.as_deref().unwrap_or(status::MISSING_SIGNAL);
                let _ = writeln!(out, "  {}: {}", signal.ticker, label);
                if let Some(confidence) = &signal.confidence {
                    let _ = writeln!(out, "    Confidence: {}", confidence);
                }
            }
        }
    }

    out
}

fn display_raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
        other => other.to_string(),
    }
}
