//! HedgeChat - streaming client for the AI hedge fund analysis chat
//!
//! This library provides the Server-Sent-Events decoding, the typed analysis
//! events, the cancellable streaming client and the chat transcript they
//! feed.

pub mod bus;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod session;
pub mod sse;
pub mod tickers;
pub mod transcript;

// Re-export commonly used types
pub use bus::{EventBus, TranscriptEvent};
pub use client::{AnalysisHandle, ChatClient, StreamState};
pub use config::AppConfig;
pub use error::ClientError;
pub use events::{parse_frame, AnalysisResult, StreamEvent};
pub use session::{ActiveTurn, ChatSession};
pub use sse::{FrameDecoder, RawFrame, Utf8Decoder};
pub use transcript::{ChatMessage, MessageId, Role, Transcript};

#[cfg(test)]
mod bus_tests;
#[cfg(test)]
mod events_tests;
