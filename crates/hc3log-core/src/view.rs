// ── View ordering ──
//
// Sorting is a presentation concern: the store keeps arrival order and the
// view derives a sorted copy of the visible rows when a sort is active.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::model::EventRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Type,
    Time,
    Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Current sort selection. Starts on time, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: SortColumn::Time,
            direction: SortDirection::Desc,
        }
    }
}

impl SortState {
    /// Activate a column: re-activating the current column flips the
    /// direction, switching columns starts ascending.
    pub fn activate(&mut self, column: SortColumn) {
        if self.column == column {
            self.direction = self.direction.toggled();
        } else {
            self.column = column;
            self.direction = SortDirection::Asc;
        }
    }
}

/// Stable sort of the visible rows. Equal keys keep their relative
/// arrival order in both directions.
pub fn sort_events(events: &mut [Arc<EventRecord>], sort: SortState) {
    let cmp = |a: &Arc<EventRecord>, b: &Arc<EventRecord>| -> Ordering {
        match sort.column {
            SortColumn::Type => {
                let a = a.row.display_type.to_lowercase();
                let b = b.row.display_type.to_lowercase();
                a.cmp(&b)
            }
            SortColumn::Time => {
                let a = a.row.timestamp.unwrap_or(0);
                let b = b.row.timestamp.unwrap_or(0);
                a.cmp(&b)
            }
            SortColumn::Id => {
                let a = a.row.id.as_deref().unwrap_or("");
                let b = b.row.id.as_deref().unwrap_or("");
                a.cmp(b)
            }
        }
    };
    match sort.direction {
        SortDirection::Asc => events.sort_by(cmp),
        SortDirection::Desc => events.sort_by(|a, b| cmp(b, a)),
    }
}

/// How the table should be refreshed after new events arrive.
///
/// While a sort is active a new row can land anywhere, so the visible set
/// is rebuilt whenever the user is following the tail or just requested a
/// re-sort. Otherwise rows only ever append at the end, which keeps the
/// scroll position untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPlan {
    Append,
    FullRender,
}

pub fn plan(sort_active: bool, auto_scroll: bool, needs_sort: bool) -> RenderPlan {
    if sort_active && (auto_scroll || needs_sort) {
        RenderPlan::FullRender
    } else {
        RenderPlan::Append
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use hc3log_api::RawEvent;

    fn record(json: &str) -> Arc<EventRecord> {
        let raw: RawEvent = serde_json::from_str(json).expect("valid event");
        let row = normalize(&raw);
        Arc::new(EventRecord { raw, row })
    }

    fn sample() -> Vec<Arc<EventRecord>> {
        vec![
            record(r#"{"type":"SceneStartedEvent","id":2,"timestamp":100}"#),
            record(r#"{"type":"DeviceModifiedEvent","id":1,"timestamp":300}"#),
            record(r#"{"type":"SceneStartedEvent","id":3,"timestamp":100}"#),
        ]
    }

    fn ids(events: &[Arc<EventRecord>]) -> Vec<String> {
        events.iter().map(|e| e.row.id_text().to_owned()).collect()
    }

    #[test]
    fn default_sort_is_time_descending() {
        let state = SortState::default();
        assert_eq!(state.column, SortColumn::Time);
        assert_eq!(state.direction, SortDirection::Desc);
    }

    #[test]
    fn time_sort_is_stable_for_equal_timestamps() {
        let mut events = sample();
        sort_events(
            &mut events,
            SortState {
                column: SortColumn::Time,
                direction: SortDirection::Asc,
            },
        );
        assert_eq!(ids(&events), ["2", "3", "1"]);
    }

    #[test]
    fn descending_is_the_exact_reverse_of_ascending() {
        // Distinct type keys; equal keys fall under the stability rule
        // and keep arrival order in both directions instead.
        let distinct = || {
            vec![
                record(r#"{"type":"SceneStartedEvent","id":2,"timestamp":100}"#),
                record(r#"{"type":"DeviceModifiedEvent","id":1,"timestamp":300}"#),
                record(r#"{"type":"RoomModifiedEvent","id":3,"timestamp":100}"#),
            ]
        };
        let mut asc = distinct();
        sort_events(
            &mut asc,
            SortState {
                column: SortColumn::Type,
                direction: SortDirection::Asc,
            },
        );
        assert_eq!(ids(&asc), ["1", "3", "2"]);

        let mut desc = distinct();
        sort_events(
            &mut desc,
            SortState {
                column: SortColumn::Type,
                direction: SortDirection::Desc,
            },
        );
        let mut reversed = ids(&asc);
        reversed.reverse();
        assert_eq!(ids(&desc), reversed);
    }

    #[test]
    fn equal_type_keys_keep_arrival_order_in_both_directions() {
        let mut asc = sample();
        sort_events(
            &mut asc,
            SortState {
                column: SortColumn::Type,
                direction: SortDirection::Asc,
            },
        );
        assert_eq!(ids(&asc), ["1", "2", "3"]);

        let mut desc = sample();
        sort_events(
            &mut desc,
            SortState {
                column: SortColumn::Type,
                direction: SortDirection::Desc,
            },
        );
        // The two SceneStartedEvent rows stay in arrival order (2, 3)
        // even with the comparator flipped.
        assert_eq!(ids(&desc), ["2", "3", "1"]);
    }

    #[test]
    fn activate_toggles_same_column_and_resets_on_switch() {
        let mut state = SortState::default();
        state.activate(SortColumn::Time);
        assert_eq!(state.direction, SortDirection::Asc);
        state.activate(SortColumn::Time);
        assert_eq!(state.direction, SortDirection::Desc);
        state.activate(SortColumn::Id);
        assert_eq!(state.column, SortColumn::Id);
        assert_eq!(state.direction, SortDirection::Asc);
    }

    #[test]
    fn missing_timestamps_sort_as_oldest() {
        let mut events = vec![
            record(r#"{"type":"DeviceModifiedEvent","id":1,"timestamp":50}"#),
            record(r#"{"type":"DeviceRemovedEvent","id":2}"#),
        ];
        sort_events(
            &mut events,
            SortState {
                column: SortColumn::Time,
                direction: SortDirection::Asc,
            },
        );
        assert_eq!(ids(&events), ["2", "1"]);
    }

    #[test]
    fn plan_rebuilds_only_while_sorted_and_following() {
        assert_eq!(plan(true, true, false), RenderPlan::FullRender);
        assert_eq!(plan(true, false, true), RenderPlan::FullRender);
        assert_eq!(plan(true, false, false), RenderPlan::Append);
        assert_eq!(plan(false, true, false), RenderPlan::Append);
    }
}
