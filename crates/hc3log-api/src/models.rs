// Wire types for the HC3 REST API.
//
// Events are heterogeneous: the payload shape depends entirely on the
// `type` tag, ids arrive as numbers or strings depending on the event,
// and fields come and go between firmware versions. `RawEvent` therefore
// models only the identity/meta fields explicitly and flattens the rest,
// so nothing is lost between deserialization and display.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response from `GET /api/refreshStates`.
///
/// `last` is the server-assigned cursor into the event log; `events` is
/// absent when the hold timeout elapsed with nothing new.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    #[serde(default)]
    pub last: Option<u64>,
    #[serde(default)]
    pub events: Option<Vec<RawEvent>>,
}

/// One raw event record from the HC3 event stream.
///
/// Immutable once received. Identity fields (`type`, `id`, `deviceId`,
/// `timestamp`, `created`) are modeled explicitly; `data` carries the
/// type-dependent payload and `extra` catches any other top-level field
/// so the original JSON can be reconstructed for export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,

    /// Top-level id. HC3 sends numbers for devices and strings for
    /// variables, so this stays a `Value` until normalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(rename = "deviceId", default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<Value>,

    /// Unix epoch seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,

    /// Alternative epoch-seconds field used by some event kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,

    /// Type-dependent payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Any other top-level fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawEvent {
    /// The type tag, defaulting to `"Unknown"` for untyped records.
    pub fn type_tag(&self) -> &str {
        self.event_type.as_deref().unwrap_or("Unknown")
    }

    /// Epoch seconds from `timestamp`, falling back to `created`.
    pub fn epoch(&self) -> Option<i64> {
        self.timestamp.or(self.created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_event_preserves_unknown_fields() {
        let json = r#"{
            "type": "DeviceModifiedEvent",
            "id": 42,
            "timestamp": 1700000000,
            "sourceType": "user",
            "data": {"name": "Lamp"}
        }"#;
        let event: RawEvent = serde_json::from_str(json).expect("valid event");
        assert_eq!(event.type_tag(), "DeviceModifiedEvent");
        assert_eq!(event.epoch(), Some(1_700_000_000));
        assert_eq!(
            event.extra.get("sourceType"),
            Some(&Value::String("user".into()))
        );

        // Round-trips to the same top-level shape.
        let back = serde_json::to_value(&event).expect("serializable");
        assert_eq!(back.get("type"), Some(&Value::String("DeviceModifiedEvent".into())));
        assert_eq!(back.get("sourceType"), Some(&Value::String("user".into())));
    }

    #[test]
    fn refresh_response_tolerates_empty_body() {
        let resp: RefreshResponse = serde_json::from_str("{}").expect("valid");
        assert_eq!(resp.last, None);
        assert!(resp.events.is_none());
    }

    #[test]
    fn untyped_event_is_unknown() {
        let event: RawEvent = serde_json::from_str(r#"{"foo": 1}"#).expect("valid");
        assert_eq!(event.type_tag(), "Unknown");
        assert_eq!(event.epoch(), None);
    }
}
