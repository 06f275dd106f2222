// ── Event normalization ──
//
// Projects a raw controller event into its display-ready row exactly once,
// at ingestion. Rows are immutable afterwards.

use chrono::{Local, TimeZone};
use hc3log_api::RawEvent;
use serde_json::{Map, Value};

use crate::model::{EventRow, Tone, ValueCell, ID_SENTINEL};

/// Fields of the raw event that are rendered in their own columns and
/// therefore excluded from the value payload.
const COLUMN_FIELDS: [&str; 5] = ["type", "timestamp", "created", "id", "deviceId"];

/// Build the normalized row for a raw event.
pub fn normalize(raw: &RawEvent) -> EventRow {
    let timestamp = raw.epoch();
    let payload = reduced_payload(raw);
    EventRow {
        display_type: display_type(raw.type_tag()),
        id: resolve_id(raw),
        timestamp,
        time: format_time(timestamp),
        short_value: short_value(raw),
        full_value: full_value(&payload),
    }
}

/// Type tag with the trailing `Event` suffix stripped, for column display.
fn display_type(tag: &str) -> String {
    tag.strip_suffix("Event").unwrap_or(tag).to_owned()
}

/// Resolve an entity id by walking the known locations in order:
/// top-level `id`, top-level `deviceId`, then `data.id`, `data.deviceId`,
/// `data.deviceID`, `data.variableName`. Numeric zero is a valid id;
/// null and empty strings are not.
fn resolve_id(raw: &RawEvent) -> Option<String> {
    if let Some(id) = raw.id.as_ref().and_then(id_text) {
        return Some(id);
    }
    if let Some(id) = raw.device_id.as_ref().and_then(id_text) {
        return Some(id);
    }
    let data = raw.data.as_ref()?.as_object()?;
    for key in ["id", "deviceId", "deviceID", "variableName"] {
        if let Some(id) = data.get(key).and_then(id_text) {
            return Some(id);
        }
    }
    None
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Local wall-clock `HH:MM:SS`, or the sentinel when the event carries no
/// usable timestamp.
fn format_time(epoch: Option<i64>) -> String {
    match epoch.and_then(|secs| Local.timestamp_opt(secs, 0).single()) {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => ID_SENTINEL.to_owned(),
    }
}

/// The event minus its column fields: `data` (when present) plus any
/// unrecognized top-level fields, in arrival order.
fn reduced_payload(raw: &RawEvent) -> Map<String, Value> {
    let mut payload = Map::new();
    if let Some(data) = &raw.data {
        payload.insert("data".to_owned(), data.clone());
    }
    for (key, value) in &raw.extra {
        if !COLUMN_FIELDS.contains(&key.as_str()) {
            payload.insert(key.clone(), value.clone());
        }
    }
    payload
}

/// Full value shown in the detail tooltip: the single remaining scalar when
/// the payload reduces to one, otherwise pretty-printed JSON.
fn full_value(payload: &Map<String, Value>) -> String {
    if payload.len() == 1 {
        if let Some((_, value)) = payload.iter().next() {
            if !value.is_object() && !value.is_array() {
                return scalar_text(value);
            }
        }
    }
    serde_json::to_string_pretty(&Value::Object(payload.clone())).unwrap_or_default()
}

/// Short formatted value for the table cell, dispatched on event type.
fn short_value(raw: &RawEvent) -> ValueCell {
    let data = raw.data.as_ref().and_then(Value::as_object);
    match raw.type_tag() {
        "DevicePropertyUpdatedEvent" => device_property_update(data, raw),
        "PluginChangedViewEvent" => plugin_changed_view(data),
        "DeviceActionRanEvent" => device_action_ran(data),
        "PluginProcessCrashedEvent" => plugin_process_crashed(data),
        "WeatherChangedEvent" => weather_changed(data),
        "GlobalVariableAddedEvent" => global_variable_added(data),
        "GlobalVariableChangedEvent" => global_variable_changed(data),
        "GlobalVariableRemovedEvent" => ValueCell::plain(""),
        _ => generic_value(raw),
    }
}

fn device_property_update(data: Option<&Map<String, Value>>, raw: &RawEvent) -> ValueCell {
    let Some(data) = data else {
        return generic_value(raw);
    };
    let prop = data
        .get("property")
        .or_else(|| data.get("propertyName"))
        .and_then(Value::as_str);
    let value = data.get("value").or_else(|| data.get("newValue"));

    if prop == Some("icon") {
        let path = data
            .get("newValue")
            .and_then(|v| v.get("path"))
            .and_then(Value::as_str)
            .map(str::to_owned)
            .or_else(|| {
                data.get("newValue")
                    .and_then(Value::as_str)
                    .map(str::to_owned)
            })
            .or_else(|| value.map(scalar_text))
            .unwrap_or_default();
        return ValueCell::plain(format!("\u{1f5bc} icon: {path}"));
    }

    if let Some(prop @ ("lastChanged" | "lastBreached")) = prop {
        let text = value
            .and_then(Value::as_i64)
            .and_then(|secs| Local.timestamp_opt(secs, 0).single())
            .map_or_else(String::new, |dt| dt.format("%b %-d, %H:%M:%S").to_string());
        return ValueCell::plain(format!("\u{1f550} {prop}: {text}"));
    }

    if let Some(prop @ ("value" | "state")) = prop {
        let good = match value {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n > 0.0),
            _ => false,
        };
        let glyph = if good { '\u{2713}' } else { '\u{2717}' };
        let tone = if good { Tone::Good } else { Tone::Bad };
        let text = value.map(scalar_text).unwrap_or_default();
        return ValueCell {
            text: format!("{glyph} {prop}: {text}"),
            tone,
        };
    }

    match (prop, value) {
        (Some(prop), Some(value)) => ValueCell::plain(format!("{prop}: {}", scalar_text(value))),
        _ => ValueCell::plain(compact_json(&Value::Object(data.clone()))),
    }
}

fn plugin_changed_view(data: Option<&Map<String, Value>>) -> ValueCell {
    let component = field_text(data, "componentName");
    let property = field_text(data, "propertyName");
    let new_value = field_text(data, "newValue");
    ValueCell::plain(format!("{component}/{property}/{new_value}"))
}

fn device_action_ran(data: Option<&Map<String, Value>>) -> ValueCell {
    let action = field_text(data, "actionName");
    let args = match data.and_then(|d| d.get("args")) {
        Some(Value::Array(items)) => items
            .iter()
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => scalar_text(other),
        None => String::new(),
    };
    ValueCell::plain(format!("{action}({args})"))
}

fn plugin_process_crashed(data: Option<&Map<String, Value>>) -> ValueCell {
    let error = data
        .and_then(|d| d.get("error"))
        .map(scalar_text)
        .unwrap_or_else(|| "Unknown error".to_owned());
    ValueCell {
        text: error,
        tone: Tone::Bad,
    }
}

fn weather_changed(data: Option<&Map<String, Value>>) -> ValueCell {
    let change = field_text(data, "change");
    let new_value = field_text(data, "newValue");
    ValueCell::plain(format!("{change}: {new_value}"))
}

fn global_variable_added(data: Option<&Map<String, Value>>) -> ValueCell {
    let text = data
        .and_then(|d| d.get("value").or_else(|| d.get("newValue")))
        .map(scalar_text)
        .unwrap_or_default();
    ValueCell::plain(text)
}

fn global_variable_changed(data: Option<&Map<String, Value>>) -> ValueCell {
    ValueCell::plain(field_text(data, "newValue"))
}

/// Generic fallback: the reduced payload as compact JSON, or the single
/// remaining scalar by itself.
fn generic_value(raw: &RawEvent) -> ValueCell {
    let payload = reduced_payload(raw);
    if payload.len() == 1 {
        if let Some((_, value)) = payload.iter().next() {
            if !value.is_object() && !value.is_array() {
                return ValueCell::plain(scalar_text(value));
            }
        }
    }
    ValueCell::plain(compact_json(&Value::Object(payload)))
}

fn field_text(data: Option<&Map<String, Value>>, key: &str) -> String {
    data.and_then(|d| d.get(key))
        .map(scalar_text)
        .unwrap_or_default()
}

/// Bare text for a scalar: strings unquoted, everything else as JSON.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compact_json(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}
