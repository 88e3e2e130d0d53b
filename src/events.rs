use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::constants::{protocol, status};
use crate::sse::RawFrame;

/// A typed event of the analysis stream
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    Start,
    Progress {
        status: String,
        analysis: Option<String>,
    },
    Complete {
        result: AnalysisResult,
    },
    Error {
        message: String,
    },
}

impl StreamEvent {
    /// Complete and Error end the stream for the placeholder
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete { .. } | StreamEvent::Error { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Start => protocol::EVENT_START,
            StreamEvent::Progress { .. } => protocol::EVENT_PROGRESS,
            StreamEvent::Complete { .. } => protocol::EVENT_COMPLETE,
            StreamEvent::Error { .. } => protocol::EVENT_ERROR,
        }
    }
}

/// Decisions and analyst signals of a finished analysis, in payload order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnalysisResult {
    pub decisions: Vec<(String, DecisionEntry)>,
    pub analyst_signals: Vec<AnalystReport>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DecisionEntry {
    Structured(Decision),
    /// Scalar decision value, rendered inline
    Raw(Value),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Decision {
    pub action: Option<String>,
    /// As sent; numeric strings keep their original text
    pub quantity: Option<String>,
    pub reasoning: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnalystReport {
    pub analyst: String,
    pub signals: Vec<TickerSignal>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickerSignal {
    pub ticker: String,
    /// `signal`, falling back to `action`
    pub signal: Option<String>,
    pub confidence: Option<String>,
}

impl AnalysisResult {
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let decisions = obj
            .get("decisions")
            .map(entries)
            .unwrap_or_default()
            .into_iter()
            .map(|(ticker, v)| (ticker, DecisionEntry::from_value(v)))
            .collect();

        let analyst_signals = obj
            .get("analyst_signals")
            .map(entries)
            .unwrap_or_default()
            .into_iter()
            .map(|(analyst, v)| AnalystReport::from_value(&analyst, v))
            .collect();

        Self {
            decisions,
            analyst_signals,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty() && self.analyst_signals.is_empty()
    }
}

impl DecisionEntry {
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(obj) => DecisionEntry::Structured(Decision {
                action: text_field(obj, "action"),
                quantity: text_field(obj, "quantity"),
                reasoning: text_field(obj, "reasoning"),
            }),
            // Arrays carry none of the decision fields: header only
            Value::Array(_) => DecisionEntry::Structured(Decision::default()),
            other => DecisionEntry::Raw(other.clone()),
        }
    }
}

impl AnalystReport {
    fn from_value(analyst: &str, value: &Value) -> Self {
        let signals = entries(value)
            .into_iter()
            .map(|(ticker, v)| TickerSignal::from_value(&ticker, v))
            .collect();

        Self {
            analyst: analyst.to_string(),
            signals,
        }
    }
}

impl TickerSignal {
    fn from_value(ticker: &str, value: &Value) -> Self {
        let empty = Map::new();
        let obj = value.as_object().unwrap_or(&empty);

        Self {
            ticker: ticker.to_string(),
            signal: text_field(obj, "signal").or_else(|| text_field(obj, "action")),
            confidence: text_field(obj, "confidence"),
        }
    }
}

/// Map one frame to at most one event.
///
/// Payloads that are not JSON, or are `null` where fields are read, are
/// logged and dropped; unknown event types are ignored.
pub fn parse_frame(frame: &RawFrame) -> Option<StreamEvent> {
    let payload: Value = if frame.data.is_empty() {
        Value::Object(Map::new())
    } else {
        match serde_json::from_str(&frame.data) {
            Ok(v) => v,
            Err(e) => {
                warn!(
                    "⚠️ [SSE] Failed to parse '{}' event payload: {}",
                    frame.event_type, e
                );
                return None;
            }
        }
    };

    // A literal `null` has no fields to read; only `start` needs none
    if payload.is_null()
        && matches!(
            frame.event_type.as_str(),
            protocol::EVENT_PROGRESS | protocol::EVENT_COMPLETE | protocol::EVENT_ERROR
        )
    {
        warn!("⚠️ [SSE] Dropping '{}' event with null payload", frame.event_type);
        return None;
    }

    let empty = Map::new();
    let fields = payload.as_object().unwrap_or(&empty);

    match frame.event_type.as_str() {
        protocol::EVENT_START => Some(StreamEvent::Start),
        protocol::EVENT_PROGRESS => Some(StreamEvent::Progress {
            status: text_field(fields, "status")
                .or_else(|| text_field(fields, "agent"))
                .unwrap_or_else(|| status::PROCESSING.to_string()),
            analysis: text_field(fields, "analysis"),
        }),
        protocol::EVENT_COMPLETE => {
            // Some backend versions wrap the result in `data`, some don't.
            let body = fields
                .get("data")
                .filter(|v| is_truthy(v))
                .unwrap_or(&payload);
            Some(StreamEvent::Complete {
                result: AnalysisResult::from_value(body),
            })
        }
        protocol::EVENT_ERROR => Some(StreamEvent::Error {
            message: text_field(fields, "message")
                .unwrap_or_else(|| status::GENERIC_ERROR.to_string()),
        }),
        other => {
            debug!("[SSE] Ignoring '{}' event", other);
            None
        }
    }
}

/// JSON value as the backend's JavaScript consumers would test it
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A present, truthy field rendered as text
fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    let value = obj.get(key).filter(|v| is_truthy(v))?;
    Some(match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
        other => other.to_string(),
    })
}

/// Keyed entries of an object, or index-keyed entries of an array
fn entries(value: &Value) -> Vec<(String, &Value)> {
    match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    }
}

/// Integral values print without a fractional part (`10`, not `10.0`)
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
