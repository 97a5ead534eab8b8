//! Platform option builders for Android and APNs overrides
//!
//! Both types are plain values: every `with_*` consumes and returns `Self`, so
//! cloning a base and specializing it never affects the base. `to_value()`
//! produces the JSON object placed under `android` / `apns` in the FCM message.

use serde_json::{Map, Value};

/// Recursively merge `overlay` into `base`
///
/// Nested objects are merged key by key; any other value in `overlay`
/// (scalars and arrays included) replaces the value in `base`.
pub fn deep_merge(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        if let (Some(Value::Object(existing)), Value::Object(incoming)) =
            (base.get_mut(key), value)
        {
            deep_merge(existing, incoming);
            continue;
        }
        base.insert(key.clone(), value.clone());
    }
}

fn merged(base: &Map<String, Value>, overlay: &Map<String, Value>) -> Map<String, Value> {
    let mut out = base.clone();
    deep_merge(&mut out, overlay);
    out
}

fn replaced(base: &Map<String, Value>, overlay: &Map<String, Value>) -> Map<String, Value> {
    let mut out = base.clone();
    out.extend(overlay.iter().map(|(k, v)| (k.clone(), v.clone())));
    out
}

/// Android (`AndroidConfig`) overrides
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AndroidOptions {
    channel_id: Option<String>,
    priority: Option<String>,
    ttl: Option<u64>,
    collapse_key: Option<String>,
    notification: Map<String, Value>,
    data: Map<String, Value>,
    extra: Map<String, Value>,
}

impl AndroidOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notification channel; also written to `notification.channel_id`
    pub fn with_channel_id(mut self, channel_id: impl Into<String>) -> Self {
        let channel_id = channel_id.into();
        self.notification
            .insert("channel_id".to_string(), Value::String(channel_id.clone()));
        self.channel_id = Some(channel_id);
        self
    }

    /// `"normal"` or `"high"`
    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    /// Time to live in seconds
    pub fn with_ttl(mut self, seconds: u64) -> Self {
        self.ttl = Some(seconds);
        self
    }

    pub fn with_collapse_key(mut self, key: impl Into<String>) -> Self {
        self.collapse_key = Some(key.into());
        self
    }

    /// Deep-merge fields into `notification` (sound, color, icon, ...)
    pub fn with_notification(mut self, notification: Map<String, Value>) -> Self {
        deep_merge(&mut self.notification, &notification);
        self
    }

    /// Replace the Android-only data payload
    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    /// Deep-merge arbitrary top-level `AndroidConfig` fields
    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        deep_merge(&mut self.extra, &extra);
        self
    }

    pub fn channel_id(&self) -> Option<&str> {
        self.channel_id.as_deref()
    }

    pub fn priority(&self) -> Option<&str> {
        self.priority.as_deref()
    }

    pub fn ttl(&self) -> Option<u64> {
        self.ttl
    }

    pub fn collapse_key(&self) -> Option<&str> {
        self.collapse_key.as_deref()
    }

    pub fn notification(&self) -> &Map<String, Value> {
        &self.notification
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Combine with `other`; `other` wins on every field it sets
    pub fn merge(&self, other: &AndroidOptions) -> AndroidOptions {
        AndroidOptions {
            channel_id: other.channel_id.clone().or_else(|| self.channel_id.clone()),
            priority: other.priority.clone().or_else(|| self.priority.clone()),
            ttl: other.ttl.or(self.ttl),
            collapse_key: other
                .collapse_key
                .clone()
                .or_else(|| self.collapse_key.clone()),
            notification: merged(&self.notification, &other.notification),
            data: replaced(&self.data, &other.data),
            extra: merged(&self.extra, &other.extra),
        }
    }

    /// JSON object for the `android` key of an FCM message
    ///
    /// `ttl` is rendered as a protobuf duration string (`"3600s"`).
    pub fn to_value(&self) -> Value {
        let mut output = Map::new();

        if let Some(priority) = &self.priority {
            output.insert("priority".to_string(), Value::String(priority.clone()));
        }
        if let Some(ttl) = self.ttl {
            output.insert("ttl".to_string(), Value::String(format!("{}s", ttl)));
        }
        if let Some(collapse_key) = &self.collapse_key {
            output.insert(
                "collapse_key".to_string(),
                Value::String(collapse_key.clone()),
            );
        }
        if !self.notification.is_empty() {
            output.insert(
                "notification".to_string(),
                Value::Object(self.notification.clone()),
            );
        }
        if !self.data.is_empty() {
            output.insert("data".to_string(), Value::Object(self.data.clone()));
        }
        if !self.extra.is_empty() {
            deep_merge(&mut output, &self.extra);
        }

        // channel_id always ends up in the notification block
        if let Some(channel_id) = &self.channel_id {
            let notification = output
                .entry("notification")
                .or_insert_with(|| Value::Object(Map::new()));
            if !notification.is_object() {
                *notification = Value::Object(Map::new());
            }
            if let Value::Object(notification) = notification {
                notification.insert("channel_id".to_string(), Value::String(channel_id.clone()));
            }
        }

        Value::Object(output)
    }
}

impl From<AndroidOptions> for Value {
    fn from(options: AndroidOptions) -> Self {
        options.to_value()
    }
}

/// APNs (`ApnsConfig`) overrides
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApnsOptions {
    headers: Map<String, Value>,
    aps: Map<String, Value>,
    custom: Map<String, Value>,
}

impl ApnsOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// HTTP headers sent to APNs (`apns-priority`, `apns-push-type`, ...)
    pub fn with_headers(mut self, headers: Map<String, Value>) -> Self {
        deep_merge(&mut self.headers, &headers);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into(), Value::String(value.into()));
        self
    }

    /// Deep-merge into the `aps` dictionary
    pub fn with_aps(mut self, aps: Map<String, Value>) -> Self {
        deep_merge(&mut self.aps, &aps);
        self
    }

    /// Deep-merge custom top-level payload keys (siblings of `aps`)
    pub fn with_custom(mut self, custom: Map<String, Value>) -> Self {
        deep_merge(&mut self.custom, &custom);
        self
    }

    pub fn headers(&self) -> &Map<String, Value> {
        &self.headers
    }

    pub fn aps(&self) -> &Map<String, Value> {
        &self.aps
    }

    pub fn custom(&self) -> &Map<String, Value> {
        &self.custom
    }

    /// Combine with `other`; headers merge shallowly, `aps` and custom deeply
    pub fn merge(&self, other: &ApnsOptions) -> ApnsOptions {
        ApnsOptions {
            headers: replaced(&self.headers, &other.headers),
            aps: merged(&self.aps, &other.aps),
            custom: merged(&self.custom, &other.custom),
        }
    }

    /// JSON object for the `apns` key of an FCM message
    pub fn to_value(&self) -> Value {
        let mut output = Map::new();

        if !self.headers.is_empty() {
            output.insert("headers".to_string(), Value::Object(self.headers.clone()));
        }

        let mut payload = Map::new();
        if !self.aps.is_empty() {
            payload.insert("aps".to_string(), Value::Object(self.aps.clone()));
        }
        payload.extend(self.custom.iter().map(|(k, v)| (k.clone(), v.clone())));

        if !payload.is_empty() {
            output.insert("payload".to_string(), Value::Object(payload));
        }

        Value::Object(output)
    }
}

impl From<ApnsOptions> for Value {
    fn from(options: ApnsOptions) -> Self {
        options.to_value()
    }
}
