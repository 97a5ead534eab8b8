//! FCM v1 wire format
//!
//! `encode_message` turns a `PushMessage` and `PushTarget` into the request
//! envelope; `decode_response` turns whatever came back into a `PushResult`.
//! Neither function performs I/O or fails.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::models::{
    FcmMessage, FcmMessageContent, FcmNotification, Platform, PushMessage, PushResult, PushTarget,
};

/// Build the `{"message": {...}}` request body
pub fn encode_message(message: &PushMessage, target: &PushTarget, validate_only: bool) -> FcmMessage {
    let (token, topic, condition) = match target {
        PushTarget::Token(token) => (Some(token.clone()), None, None),
        PushTarget::Topic(topic) => (None, Some(topic.clone()), None),
        PushTarget::Condition(condition) => (None, None, Some(condition.clone())),
    };

    let data = if message.data().is_empty() {
        None
    } else {
        Some(stringify_data(message.data()))
    };

    FcmMessage {
        message: FcmMessageContent {
            token,
            topic,
            condition,
            notification: FcmNotification {
                title: message.title().to_string(),
                body: message.body().to_string(),
            },
            data,
            android: platform_override(message, Platform::Android),
            apns: platform_override(message, Platform::Apns),
            webpush: platform_override(message, Platform::Webpush),
        },
        validate_only,
    }
}

/// FCM requires every data value to be a string
fn stringify_data(data: &Map<String, Value>) -> BTreeMap<String, String> {
    data.iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}

/// Overrides that are not JSON objects are skipped
fn platform_override(message: &PushMessage, platform: Platform) -> Option<Value> {
    message
        .platform_override(platform)
        .filter(|value| value.is_object())
        .cloned()
}

/// Normalize an FCM HTTP response
pub fn decode_response(status: u16, body: &str) -> PushResult {
    let raw = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| match value {
            Value::Object(map) => Some(map),
            _ => None,
        });

    if (200..300).contains(&status) {
        let id = raw
            .as_ref()
            .and_then(|map| map.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string);

        return PushResult::ok(id, raw);
    }

    let error = raw
        .as_ref()
        .and_then(|map| map.get("error"))
        .and_then(Value::as_object);

    let (error_code, error_message) = match error {
        Some(error) => (
            error
                .get("status")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP_{}", status)),
            error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| "FCM v1 error".to_string()),
        ),
        None => (
            format!("HTTP_{}", status),
            if body.is_empty() {
                "HTTP error".to_string()
            } else {
                body.to_string()
            },
        ),
    };

    PushResult::failed(error_code, error_message, raw)
}
