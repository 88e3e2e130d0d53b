//! Application-wide constants and protocol literals
//!
//! This module centralizes the wire names and user-facing strings so the
//! parser and the transcript agree on them.

/// Server-Sent-Events framing and event names
pub mod protocol {
    /// Frames are separated by a blank line
    pub const FRAME_DELIMITER: &str = "\n\n";

    /// Event type used when a frame carries no `event:` line
    pub const DEFAULT_EVENT_TYPE: &str = "message";

    pub const EVENT_PREFIX: &str = "event:";
    pub const DATA_PREFIX: &str = "data:";

    pub const EVENT_START: &str = "start";
    pub const EVENT_PROGRESS: &str = "progress";
    pub const EVENT_COMPLETE: &str = "complete";
    pub const EVENT_ERROR: &str = "error";
}

/// Text shown in the assistant placeholder
pub mod status {
    pub const STARTING: &str = "Starting analysis...";

    /// Progress status when neither `status` nor `agent` is present
    pub const PROCESSING: &str = "Processing...";

    /// Error message when an `error` event has no `message`
    pub const GENERIC_ERROR: &str = "An error occurred";

    pub const ERROR_PREFIX: &str = "Error: ";

    pub const COMPLETE_HEADER: &str = "Analysis Complete!";
    pub const DECISIONS_HEADER: &str = "Trading Decisions:";
    pub const SIGNALS_HEADER: &str = "Analyst Signals:";

    /// Signal label when a ticker entry has neither `signal` nor `action`
    pub const MISSING_SIGNAL: &str = "N/A";
}

/// Analysis backend defaults
pub mod api {
    pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
    pub const ANALYZE_PATH: &str = "/chat/analyze";

    /// Environment variable overriding the configured base URL
    pub const BASE_URL_ENV: &str = "HEDGE_API_URL";

    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
}

/// Chat front-end defaults
pub mod chat {
    pub const WELCOME_MESSAGE: &str = "Welcome to AI Hedge Fund! Ask me about any stock ticker, for example: \"Analyze AAPL\" or \"What do you think about MSFT and GOOGL?\"";

    /// Capacity of the transcript change broadcast
    pub const BUS_CAPACITY: usize = 256;
}
