//! `rate_limit_event` (and any other kind this crate does not model) must be
//! skipped rather than reported as a parse fault.

use claude_messages::{parse_message, Message};
use serde_json::json;

#[test]
fn rate_limit_event_is_skipped() {
    let data = json!({
        "type": "rate_limit_event",
        "rate_limit_info": {
            "status": "allowed_warning",
            "resetsAt": 1700000000,
            "rateLimitType": "five_hour",
            "utilization": 0.85,
            "isUsingOverage": false
        },
        "uuid": "550e8400-e29b-41d4-a716-446655440000",
        "session_id": "test-session-id"
    });

    assert!(parse_message(&data).unwrap().is_none());
}

#[test]
fn rejected_rate_limit_event_is_skipped() {
    let data = json!({
        "type": "rate_limit_event",
        "rate_limit_info": {
            "status": "rejected",
            "resetsAt": 1700003600,
            "rateLimitType": "seven_day",
            "isUsingOverage": false,
            "overageStatus": "rejected",
            "overageDisabledReason": "out_of_credits"
        },
        "uuid": "660e8400-e29b-41d4-a716-446655440001",
        "session_id": "test-session-id"
    });

    assert!(parse_message(&data).unwrap().is_none());
}

#[test]
fn unknown_message_type_is_skipped() {
    let data = json!({
        "type": "some_future_event_type",
        "uuid": "770e8400-e29b-41d4-a716-446655440002",
        "session_id": "test-session-id"
    });

    assert!(parse_message(&data).unwrap().is_none());
}

#[test]
fn known_message_types_still_parse() {
    let data = json!({
        "type": "assistant",
        "message": {
            "content": [{"type": "text", "text": "hello"}],
            "model": "claude-sonnet-4-6-20250929"
        }
    });

    match parse_message(&data).unwrap() {
        Some(Message::Assistant(msg)) => assert_eq!(msg.content[0].text(), Some("hello")),
        other => panic!("expected assistant message, got {other:?}"),
    }
}
