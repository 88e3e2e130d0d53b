//! Ticker extraction from free text.
//!
//! Mirrors the rule the analysis backend applies before running a request,
//! so the front-end can warn early instead of waiting for a 400.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

/// Uppercase words that match the ticker shape but are ordinary English
const COMMON_WORDS: &[&str] = &[
    "I", "A", "AM", "AN", "AS", "AT", "BE", "BY", "DO", "GO", "HE", "IF", "IN", "IS", "IT", "ME",
    "MY", "NO", "OF", "ON", "OR", "SO", "TO", "UP", "US", "WE", "THE", "AND", "FOR", "ARE", "BUT",
    "NOT", "YOU", "ALL", "CAN", "HER", "WAS", "ONE", "OUR", "OUT", "DAY", "GET", "HAS", "HIM",
    "HIS", "HOW", "ITS", "MAY", "NEW", "NOW", "OLD", "SEE", "TWO", "WAY", "WHO", "BOY", "DID",
    "HAD", "LET", "PUT", "SAY", "SHE", "TOO", "USE", "YET", "BUY", "SELL", "STOCK", "STOCKS",
    "SHARE", "SHARES",
];

fn ticker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // 1-5 letters, optionally a class suffix like BRK.B
    PATTERN.get_or_init(|| Regex::new(r"\b([A-Z]{1,5}(?:\.[A-Z])?)\b").expect("valid ticker regex"))
}

/// Unique candidate tickers in order of first appearance
pub fn extract_tickers(text: &str) -> Vec<String> {
    let upper = text.to_uppercase();
    let mut seen = HashSet::new();

    ticker_pattern()
        .captures_iter(&upper)
        .map(|c| c[1].to_string())
        .filter(|t| !COMMON_WORDS.contains(&t.as_str()))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
