// ── In-memory event store ──

use std::sync::Arc;

use indexmap::IndexSet;

use crate::model::{EventRecord, ID_SENTINEL};

/// Outcome of appending one record: the stored record plus the type and id
/// if this append was the first time either was seen.
#[derive(Debug, Clone)]
pub struct Appended {
    pub record: Arc<EventRecord>,
    pub new_type: Option<String>,
    pub new_id: Option<String>,
}

/// Append-only store of normalized events for the current session.
///
/// Records keep their arrival order; the view layer derives any sorted
/// presentation without reordering the store itself. Known types and ids
/// are tracked in first-seen order for the filter panel.
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Arc<EventRecord>>,
    known_types: IndexSet<String>,
    known_ids: IndexSet<String>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, reporting any newly observed type or id.
    pub fn append(&mut self, record: EventRecord) -> Appended {
        let new_type = {
            let tag = record.type_tag();
            if self.known_types.contains(tag) {
                None
            } else {
                self.known_types.insert(tag.to_owned());
                Some(tag.to_owned())
            }
        };
        // The sentinel id is a rendering placeholder, never a filter entry.
        let new_id = match &record.row.id {
            Some(id) if id != ID_SENTINEL && !self.known_ids.contains(id) => {
                self.known_ids.insert(id.clone());
                Some(id.clone())
            }
            _ => None,
        };
        let record = Arc::new(record);
        self.events.push(Arc::clone(&record));
        Appended {
            record,
            new_type,
            new_id,
        }
    }

    /// All records in arrival order.
    pub fn all(&self) -> &[Arc<EventRecord>] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Event types observed this session, in first-seen order.
    pub fn known_types(&self) -> impl Iterator<Item = &str> {
        self.known_types.iter().map(String::as_str)
    }

    /// Entity ids observed this session, in first-seen order.
    pub fn known_ids(&self) -> impl Iterator<Item = &str> {
        self.known_ids.iter().map(String::as_str)
    }

    /// Drop all stored events and forget observed ids. Observed types are
    /// kept so the type filter panel survives a log clear.
    pub fn clear(&mut self) {
        self.events.clear();
        self.known_ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hc3log_api::RawEvent;
    use crate::normalize::normalize;

    fn record(json: &str) -> EventRecord {
        let raw: RawEvent = serde_json::from_str(json).expect("valid event");
        let row = normalize(&raw);
        EventRecord { raw, row }
    }

    #[test]
    fn append_preserves_arrival_order() {
        let mut store = EventStore::new();
        store.append(record(r#"{"type":"DeviceModifiedEvent","id":2}"#));
        store.append(record(r#"{"type":"DeviceModifiedEvent","id":1}"#));
        let ids: Vec<_> = store.all().iter().map(|r| r.row.id_text().to_owned()).collect();
        assert_eq!(ids, ["2", "1"]);
    }

    #[test]
    fn first_seen_types_and_ids_are_reported_once() {
        let mut store = EventStore::new();
        let first = store.append(record(r#"{"type":"SceneStartedEvent","id":9}"#));
        assert_eq!(first.new_type.as_deref(), Some("SceneStartedEvent"));
        assert_eq!(first.new_id.as_deref(), Some("9"));

        let second = store.append(record(r#"{"type":"SceneStartedEvent","id":9}"#));
        assert_eq!(second.new_type, None);
        assert_eq!(second.new_id, None);
    }

    #[test]
    fn sentinel_id_is_never_tracked() {
        let mut store = EventStore::new();
        let appended = store.append(record(r#"{"type":"WeatherChangedEvent","data":{"change":"Wind","newValue":3}}"#));
        assert_eq!(appended.new_id, None);
        assert_eq!(store.known_ids().count(), 0);
    }

    #[test]
    fn clear_keeps_types_but_drops_events_and_ids() {
        let mut store = EventStore::new();
        store.append(record(r#"{"type":"SceneStartedEvent","id":9}"#));
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.known_ids().count(), 0);
        assert_eq!(store.known_types().count(), 1);
    }
}
