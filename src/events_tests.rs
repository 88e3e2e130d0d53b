//! Unit tests for Events - frame to typed event mapping and payload probing.

#[cfg(test)]
mod events_tests {
    use crate::events::*;
    use crate::sse::RawFrame;
    use serde_json::json;

    fn parse(event_type: &str, data: &str) -> Option<StreamEvent> {
        parse_frame(&RawFrame {
            event_type: event_type.to_string(),
            data: data.to_string(),
        })
    }

    fn progress_status(data: &str) -> String {
        match parse("progress", data) {
            Some(StreamEvent::Progress { status, .. }) => status,
            other => panic!("Expected Progress event, got {:?}", other),
        }
    }

    // ============= Start / Unknown Tests =============

    #[test]
    fn test_start_event() {
        assert_eq!(parse("start", ""), Some(StreamEvent::Start));
        assert_eq!(parse("start", "{\"type\":\"start\"}"), Some(StreamEvent::Start));
    }

    #[test]
    fn test_unknown_event_types_ignored() {
        assert_eq!(parse("message", "{}"), None);
        assert_eq!(parse("heartbeat", ""), None);
        assert_eq!(parse("", "{}"), None);
    }

    // ============= Malformed Payload Tests =============

    #[test]
    fn test_malformed_payloads_yield_nothing() {
        for data in ["{", "not json", "{\"status\": }", "[1,", "nul", "{'a': 1}"] {
            for event_type in ["start", "progress", "complete", "error"] {
                assert_eq!(parse(event_type, data), None, "{} / {}", event_type, data);
            }
        }
    }

    #[test]
    fn test_non_object_json_treated_as_empty() {
        assert_eq!(
            parse("progress", "[1, 2]"),
            Some(StreamEvent::Progress {
                status: "Processing...".to_string(),
                analysis: None
            })
        );
        assert_eq!(
            parse("error", "\"boom\""),
            Some(StreamEvent::Error {
                message: "An error occurred".to_string()
            })
        );
    }

    #[test]
    fn test_null_payload_dropped_where_fields_are_read() {
        for event_type in ["progress", "complete", "error"] {
            assert_eq!(parse(event_type, "null"), None, "{}", event_type);
            assert_eq!(parse(event_type, " null "), None, "{}", event_type);
        }
        assert_eq!(parse("start", "null"), Some(StreamEvent::Start));
    }

    // ============= Progress Fallback Tests =============

    #[test]
    fn test_progress_uses_status_first() {
        assert_eq!(
            progress_status(r#"{"status": "Fetching AAPL", "agent": "ben_graham"}"#),
            "Fetching AAPL"
        );
    }

    #[test]
    fn test_progress_falls_back_to_agent() {
        assert_eq!(progress_status(r#"{"agent": "ben_graham"}"#), "ben_graham");
        assert_eq!(progress_status(r#"{"status": "", "agent": "ben_graham"}"#), "ben_graham");
        assert_eq!(progress_status(r#"{"status": null, "agent": "ben_graham"}"#), "ben_graham");
    }

    #[test]
    fn test_progress_falls_back_to_literal() {
        assert_eq!(progress_status("{}"), "Processing...");
        assert_eq!(progress_status(""), "Processing...");
        assert_eq!(progress_status(r#"{"status": "", "agent": ""}"#), "Processing...");
    }

    #[test]
    fn test_progress_analysis_verbatim() {
        let event = parse(
            "progress",
            r#"{"status": "Done", "analysis": "P/E looks stretched\nbut margins hold"}"#,
        );
        assert_eq!(
            event,
            Some(StreamEvent::Progress {
                status: "Done".to_string(),
                analysis: Some("P/E looks stretched\nbut margins hold".to_string()),
            })
        );
    }

    #[test]
    fn test_progress_ignores_extra_fields() {
        let event = parse(
            "progress",
            r#"{"type":"progress","agent":"risk","ticker":"AAPL","status":"Checking","timestamp":"2025-01-01T00:00:00Z","analysis":null}"#,
        );
        assert_eq!(
            event,
            Some(StreamEvent::Progress {
                status: "Checking".to_string(),
                analysis: None
            })
        );
    }

    // ============= Error Tests =============

    #[test]
    fn test_error_message() {
        assert_eq!(
            parse("error", r#"{"message": "rate limited"}"#),
            Some(StreamEvent::Error {
                message: "rate limited".to_string()
            })
        );
    }

    #[test]
    fn test_error_default_message() {
        assert_eq!(
            parse("error", "{}"),
            Some(StreamEvent::Error {
                message: "An error occurred".to_string()
            })
        );
    }

    // ============= Complete Tests =============

    fn complete(data: &str) -> AnalysisResult {
        match parse("complete", data) {
            Some(StreamEvent::Complete { result }) => result,
            other => panic!("Expected Complete event, got {:?}", other),
        }
    }

    #[test]
    fn test_complete_wrapped_in_data() {
        let result = complete(
            r#"{"type":"complete","data":{"decisions":{"AAPL":{"action":"buy","quantity":10,"reasoning":"strong fundamentals"}}}}"#,
        );
        assert_eq!(
            result.decisions,
            vec![(
                "AAPL".to_string(),
                DecisionEntry::Structured(Decision {
                    action: Some("buy".to_string()),
                    quantity: Some("10".to_string()),
                    reasoning: Some("strong fundamentals".to_string()),
                })
            )]
        );
    }

    #[test]
    fn test_complete_unwrapped_payload() {
        let result = complete(r#"{"decisions":{"MSFT":{"action":"hold"}}}"#);
        assert_eq!(result.decisions.len(), 1);
        assert_eq!(result.decisions[0].0, "MSFT");
    }

    #[test]
    fn test_complete_falsy_wrapper_uses_whole_payload() {
        let result = complete(r#"{"data": null, "decisions":{"NVDA":"hold"}}"#);
        assert_eq!(
            result.decisions,
            vec![("NVDA".to_string(), DecisionEntry::Raw(json!("hold")))]
        );
    }

    #[test]
    fn test_complete_empty_payload() {
        assert!(complete("").is_empty());
        assert!(complete("{}").is_empty());
    }

    #[test]
    fn test_complete_preserves_key_order() {
        let result = complete(
            r#"{"decisions":{"TSLA":{"action":"sell"},"AAPL":{"action":"buy"},"MSFT":{"action":"hold"}}}"#,
        );
        let tickers: Vec<_> = result.decisions.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(tickers, vec!["TSLA", "AAPL", "MSFT"]);
    }

    #[test]
    fn test_complete_analyst_signals() {
        let result = complete(
            r#"{"data":{"analyst_signals":{
                "warren_buffett_agent":{"AAPL":{"signal":"bullish","confidence":85.5},"MSFT":{"action":"neutral"}},
                "risk_management_agent":{"AAPL":{"remaining_position_limit":20000}}
            }}}"#,
        );

        assert_eq!(result.analyst_signals.len(), 2);
        let buffett = &result.analyst_signals[0];
        assert_eq!(buffett.analyst, "warren_buffett_agent");
        assert_eq!(buffett.signals[0].signal.as_deref(), Some("bullish"));
        assert_eq!(buffett.signals[0].confidence.as_deref(), Some("85.5"));
        assert_eq!(buffett.signals[1].signal.as_deref(), Some("neutral"));
        assert_eq!(buffett.signals[1].confidence, None);

        let risk = &result.analyst_signals[1];
        assert_eq!(risk.signals[0].ticker, "AAPL");
        assert_eq!(risk.signals[0].signal, None);
    }

    #[test]
    fn test_zero_quantity_is_absent() {
        let result = complete(r#"{"decisions":{"AAPL":{"action":"hold","quantity":0}}}"#);
        match &result.decisions[0].1 {
            DecisionEntry::Structured(d) => assert_eq!(d.quantity, None),
            other => panic!("Expected structured decision, got {:?}", other),
        }
    }

    #[test]
    fn test_string_quantity_kept_verbatim() {
        let result = complete(
            r#"{"decisions":{"AAPL":{"quantity":"10.50"},"MSFT":{"quantity":"all of it"},"NVDA":{"quantity":""}}}"#,
        );
        let quantities: Vec<_> = result
            .decisions
            .iter()
            .map(|(_, entry)| match entry {
                DecisionEntry::Structured(d) => d.quantity.clone(),
                other => panic!("Expected structured decision, got {:?}", other),
            })
            .collect();
        assert_eq!(
            quantities,
            vec![Some("10.50".to_string()), Some("all of it".to_string()), None]
        );
    }

    #[test]
    fn test_array_decision_is_structured_without_fields() {
        let result = complete(r#"{"decisions":{"AAPL":[1,2],"TSLA":null}}"#);
        assert_eq!(
            result.decisions,
            vec![
                ("AAPL".to_string(), DecisionEntry::Structured(Decision::default())),
                ("TSLA".to_string(), DecisionEntry::Raw(serde_json::Value::Null)),
            ]
        );
    }

    #[test]
    fn test_array_containers_use_index_keys() {
        let result = complete(
            r#"{"decisions":[{"action":"buy"}],"analyst_signals":{"x":[{"signal":"bullish"},"odd"]}}"#,
        );
        assert_eq!(result.decisions[0].0, "0");

        let signals = &result.analyst_signals[0].signals;
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].ticker, "0");
        assert_eq!(signals[0].signal.as_deref(), Some("bullish"));
        assert_eq!(signals[1].ticker, "1");
        assert_eq!(signals[1].signal, None);
    }

    // ============= Helper Tests =============

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(0.85), "0.85");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(1.5e20), "150000000000000000000");
    }

    #[test]
    fn test_terminal_events() {
        assert!(!StreamEvent::Start.is_terminal());
        assert!(StreamEvent::Error { message: String::new() }.is_terminal());
        assert!(StreamEvent::Complete { result: AnalysisResult::default() }.is_terminal());
    }
}
