// ── Normalized event types ──

use hc3log_api::RawEvent;

/// Placeholder rendered when no identifier can be resolved for an event.
/// Sentinel ids are never added to the id filter set.
pub const ID_SENTINEL: &str = "-";

/// Tone of a rendered value cell. The view layer maps `Good`/`Bad` to
/// green/red; the check/cross glyphs are already part of the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Plain,
    Good,
    Bad,
}

/// A display value: the short formatted text plus its tone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueCell {
    pub text: String,
    pub tone: Tone,
}

impl ValueCell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Plain,
        }
    }
}

/// Normalized, display-ready projection of one raw event.
///
/// Produced once at ingestion by [`normalize`](crate::normalize::normalize)
/// and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct EventRow {
    /// Type tag with the trailing `Event` suffix stripped.
    pub display_type: String,
    /// Resolved entity id, if any. Rendered as [`ID_SENTINEL`] when absent.
    pub id: Option<String>,
    /// Raw epoch seconds (`timestamp` or `created`), kept for sorting.
    pub timestamp: Option<i64>,
    /// Local `HH:MM:SS`, or `"-"` when no timestamp exists.
    pub time: String,
    /// Short formatted value for the table cell.
    pub short_value: ValueCell,
    /// Plain pretty serialization of the reduced payload, markup-free.
    pub full_value: String,
}

impl EventRow {
    /// The id as rendered in the table: resolved id or the sentinel.
    pub fn id_text(&self) -> &str {
        self.id.as_deref().unwrap_or(ID_SENTINEL)
    }
}

/// One ingested event: the raw record plus its normalized projection.
/// Immutable once appended to the store.
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub raw: RawEvent,
    pub row: EventRow,
}

impl EventRecord {
    /// The full type tag (with `Event` suffix), used for filtering and
    /// endpoint resolution.
    pub fn type_tag(&self) -> &str {
        self.raw.type_tag()
    }

    /// The raw event as ordered pretty JSON, for on-screen inspection.
    pub fn pretty_json(&self) -> String {
        match serde_json::to_value(&self.raw) {
            Ok(value) => crate::ordered_json::to_pretty_ordered(&value),
            Err(_) => self.row.full_value.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn pretty_json_orders_keys_and_keeps_every_field() {
        let raw: RawEvent = serde_json::from_str(
            r#"{"timestamp":100,"type":"DeviceModifiedEvent","id":7,"data":{"name":"Lamp","id":7}}"#,
        )
        .unwrap();
        let row = crate::normalize::normalize(&raw);
        let record = EventRecord { raw, row };

        let json = record.pretty_json();
        assert!(json.contains("\"type\": \"DeviceModifiedEvent\""));
        assert!(json.contains("\"timestamp\": 100"));
        // Priority ordering inside nested objects: id before name.
        let id_at = json.find("\"id\": 7").unwrap();
        let name_at = json.find("\"name\": \"Lamp\"").unwrap();
        assert!(id_at < name_at);
    }
}
