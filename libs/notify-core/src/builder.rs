use serde_json::{Map, Value};

use crate::models::{Platform, PushMessage};
use crate::platform::{AndroidOptions, ApnsOptions};

/// Accumulates message fields and platform options, then produces a frozen
/// `PushMessage` with every option builder converted to plain JSON
#[derive(Debug, Clone, Default)]
pub struct PushMessageBuilder {
    title: String,
    body: String,
    data: Map<String, Value>,
    android: Option<AndroidOptions>,
    apns: Option<ApnsOptions>,
    webpush: Option<Value>,
}

impl PushMessageBuilder {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn android(mut self, android: AndroidOptions) -> Self {
        self.android = Some(android);
        self
    }

    /// Set the Android channel on the current options (or fresh ones)
    pub fn android_channel_id(mut self, channel_id: impl Into<String>) -> Self {
        let android = self.android.take().unwrap_or_default();
        self.android = Some(android.with_channel_id(channel_id));
        self
    }

    pub fn apns(mut self, apns: ApnsOptions) -> Self {
        self.apns = Some(apns);
        self
    }

    /// Set `aps.priority` on the current APNs options (or fresh ones)
    pub fn apns_priority(mut self, priority: impl Into<String>) -> Self {
        let mut aps = Map::new();
        aps.insert("priority".to_string(), Value::String(priority.into()));

        let apns = self.apns.take().unwrap_or_default();
        self.apns = Some(apns.with_aps(aps));
        self
    }

    /// Raw `WebpushConfig` object
    pub fn webpush(mut self, webpush: Value) -> Self {
        self.webpush = Some(webpush);
        self
    }

    pub fn build(self) -> PushMessage {
        let mut message = PushMessage::new(self.title, self.body).with_data(self.data);

        if let Some(android) = self.android {
            message = message.with_platform_override(Platform::Android, android.to_value());
        }
        if let Some(apns) = self.apns {
            message = message.with_platform_override(Platform::Apns, apns.to_value());
        }
        if let Some(webpush) = self.webpush {
            message = message.with_platform_override(Platform::Webpush, webpush);
        }

        message
    }
}
