// ── Event filtering ──
//
// Three independent criteria combined conjunctively: type visibility,
// id visibility, and a free-text value pattern. An event is shown only
// when every active criterion accepts it.

use std::collections::HashSet;

use regex::{Regex, RegexBuilder};

use crate::model::EventRecord;

/// How id filtering is interpreted.
///
/// `Deny` hides the listed ids and shows everything else, including events
/// with no id. `Allow` shows only the listed ids; an empty allow list
/// behaves as "show all".
#[derive(Debug, Clone)]
pub enum IdFilter {
    Deny(HashSet<String>),
    Allow(HashSet<String>),
}

impl Default for IdFilter {
    fn default() -> Self {
        Self::Deny(HashSet::new())
    }
}

impl IdFilter {
    pub fn accepts(&self, id: Option<&str>) -> bool {
        match self {
            Self::Deny(hidden) => id.is_none_or(|id| !hidden.contains(id)),
            Self::Allow(shown) => {
                shown.is_empty() || id.is_some_and(|id| shown.contains(id))
            }
        }
    }

    fn set_visible(&mut self, id: &str, visible: bool) {
        match self {
            Self::Deny(hidden) => {
                if visible {
                    hidden.remove(id);
                } else {
                    hidden.insert(id.to_owned());
                }
            }
            Self::Allow(shown) => {
                if visible {
                    shown.insert(id.to_owned());
                } else {
                    shown.remove(id);
                }
            }
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// The active filter state.
///
/// Newly observed event types are excluded by default: the table only ever
/// grows with types the user has opted into, so a burst of an unfamiliar
/// event type cannot flood the view.
#[derive(Debug, Default)]
pub struct FilterEngine {
    excluded_types: HashSet<String>,
    ids: IdFilter,
    pattern: Option<Regex>,
    pattern_error: bool,
    pattern_source: String,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type the first time it is observed. New types start
    /// excluded and must be enabled explicitly.
    pub fn register_type(&mut self, event_type: &str) {
        self.excluded_types.insert(event_type.to_owned());
    }

    pub fn set_type_visible(&mut self, event_type: &str, visible: bool) {
        if visible {
            self.excluded_types.remove(event_type);
        } else {
            self.excluded_types.insert(event_type.to_owned());
        }
    }

    pub fn is_type_visible(&self, event_type: &str) -> bool {
        !self.excluded_types.contains(event_type)
    }

    /// Show or hide every known type at once.
    pub fn set_all_types_visible(
        &mut self,
        types: impl Iterator<Item = impl Into<String>>,
        visible: bool,
    ) {
        if visible {
            self.excluded_types.clear();
        } else {
            self.excluded_types.extend(types.map(Into::into));
        }
    }

    pub fn set_id_visible(&mut self, id: &str, visible: bool) {
        self.ids.set_visible(id, visible);
    }

    pub fn is_id_visible(&self, id: &str) -> bool {
        self.ids.accepts(Some(id))
    }

    /// Update the value pattern. Matching is case-insensitive against the
    /// short rendered value. An empty pattern clears the criterion; an
    /// invalid one also clears it but raises the error flag so the view
    /// can indicate the input is not being applied.
    pub fn set_pattern(&mut self, input: &str) {
        self.pattern_source = input.to_owned();
        if input.is_empty() {
            self.pattern = None;
            self.pattern_error = false;
            return;
        }
        match RegexBuilder::new(input).case_insensitive(true).build() {
            Ok(regex) => {
                self.pattern = Some(regex);
                self.pattern_error = false;
            }
            Err(_) => {
                self.pattern = None;
                self.pattern_error = true;
            }
        }
    }

    pub fn pattern_source(&self) -> &str {
        &self.pattern_source
    }

    pub fn pattern_error(&self) -> bool {
        self.pattern_error
    }

    /// Whether a record passes all three criteria.
    pub fn matches(&self, record: &EventRecord) -> bool {
        if self.excluded_types.contains(record.type_tag()) {
            return false;
        }
        if !self.ids.accepts(record.row.id.as_deref()) {
            return false;
        }
        match &self.pattern {
            Some(regex) => regex.is_match(&record.row.short_value.text),
            None => true,
        }
    }

    /// Reset only the id criterion, keeping type and pattern filters.
    /// Used when the log is cleared: the store forgets its observed ids,
    /// so stale deny entries must not silently hide ids that re-appear.
    pub fn reset_ids(&mut self) {
        self.ids.clear();
    }

    /// Reset every criterion: all types visible, all ids visible, no
    /// value pattern.
    pub fn clear(&mut self) {
        self.excluded_types.clear();
        self.ids.clear();
        self.pattern = None;
        self.pattern_error = false;
        self.pattern_source.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use hc3log_api::RawEvent;

    fn record(json: &str) -> EventRecord {
        let raw: RawEvent = serde_json::from_str(json).expect("valid event");
        let row = normalize(&raw);
        EventRecord { raw, row }
    }

    fn temp_event(id: u32, change: &str, value: f64) -> EventRecord {
        record(&format!(
            r#"{{"type":"WeatherChangedEvent","data":{{"change":"{change}","newValue":{value}}},"id":{id}}}"#
        ))
    }

    #[test]
    fn new_types_start_hidden_until_enabled() {
        let mut engine = FilterEngine::new();
        let event = record(r#"{"type":"SceneStartedEvent","id":3}"#);
        engine.register_type("SceneStartedEvent");
        assert!(!engine.matches(&event));
        engine.set_type_visible("SceneStartedEvent", true);
        assert!(engine.matches(&event));
    }

    #[test]
    fn criteria_combine_conjunctively() {
        let mut engine = FilterEngine::new();
        let event = temp_event(8, "temperature", 21.0);
        assert!(engine.matches(&event));

        engine.set_pattern("^temp");
        assert!(engine.matches(&event));

        engine.set_id_visible("8", false);
        assert!(!engine.matches(&event));

        engine.set_id_visible("8", true);
        engine.set_type_visible("WeatherChangedEvent", false);
        assert!(!engine.matches(&event));
    }

    #[test]
    fn pattern_is_case_insensitive() {
        let mut engine = FilterEngine::new();
        engine.set_pattern("^TEMP");
        assert!(engine.matches(&temp_event(1, "temperature", 21.0)));
        assert!(!engine.matches(&temp_event(1, "humidity", 40.0)));
    }

    #[test]
    fn invalid_pattern_shows_everything_and_flags_error() {
        let mut engine = FilterEngine::new();
        engine.set_pattern("(");
        assert!(engine.pattern_error());
        assert!(engine.matches(&temp_event(1, "humidity", 40.0)));
        engine.set_pattern("");
        assert!(!engine.pattern_error());
    }

    #[test]
    fn events_without_id_pass_a_deny_list() {
        let mut engine = FilterEngine::new();
        engine.set_id_visible("5", false);
        let event =
            record(r#"{"type":"WeatherChangedEvent","data":{"change":"Wind","newValue":2}}"#);
        assert!(engine.matches(&event));
    }

    #[test]
    fn empty_allow_list_shows_all() {
        let allow = IdFilter::Allow(HashSet::new());
        assert!(allow.accepts(Some("7")));
        assert!(allow.accepts(None));

        let allow = IdFilter::Allow(HashSet::from(["7".to_owned()]));
        assert!(allow.accepts(Some("7")));
        assert!(!allow.accepts(Some("8")));
        assert!(!allow.accepts(None));
    }

    #[test]
    fn reset_ids_keeps_type_and_pattern_criteria() {
        let mut engine = FilterEngine::new();
        engine.set_id_visible("8", false);
        engine.set_pattern("^temp");
        let event = temp_event(8, "temperature", 21.0);
        assert!(!engine.matches(&event));

        engine.reset_ids();
        assert!(engine.matches(&event));
        assert_eq!(engine.pattern_source(), "^temp");
        assert!(!engine.matches(&temp_event(8, "humidity", 40.0)));
    }

    #[test]
    fn clear_resets_all_criteria() {
        let mut engine = FilterEngine::new();
        engine.set_type_visible("WeatherChangedEvent", false);
        engine.set_id_visible("8", false);
        engine.set_pattern("nothing-matches-this");
        let event = temp_event(8, "temperature", 21.0);
        assert!(!engine.matches(&event));
        engine.clear();
        assert!(engine.matches(&event));
        assert!(engine.pattern_source().is_empty());
    }
}
