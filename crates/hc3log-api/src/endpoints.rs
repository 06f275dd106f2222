// Event-type → resource endpoint mapping.
//
// Drives the on-demand "show details" lookup: given an event's type tag
// and resolved id, produce the REST path of the entity the event refers
// to. Weather is controller-global and has no id placeholder.

/// Endpoint template for an event type, with `<id>` as the placeholder.
fn endpoint_template(event_type: &str) -> Option<&'static str> {
    Some(match event_type {
        "AlarmPartitionArmedEvent"
        | "AlarmPartitionBreachedEvent"
        | "AlarmPartitionModifiedEvent"
        | "HomeArmStateChangedEvent" => "/alarms/v1/partitions/<id>",

        "WeatherChangedEvent" => "/weather",

        "GlobalVariableChangedEvent"
        | "GlobalVariableAddedEvent"
        | "GlobalVariableRemovedEvent" => "/globalVariables/<id>",

        "DevicePropertyUpdatedEvent"
        | "CentralSceneEvent"
        | "SceneActivationEvent"
        | "AccessControlEvent"
        | "PluginChangedViewEvent"
        | "DeviceRemovedEvent"
        | "DeviceChangedRoomEvent"
        | "DeviceCreatedEvent"
        | "DeviceModifiedEvent"
        | "PluginProcessCrashedEvent"
        | "QuickAppFilesChangedEvent"
        | "DeviceActionRanEvent" => "/devices/<id>",

        "CustomEvent" => "/customEvents/<id>",

        "SceneStartedEvent"
        | "SceneFinishedEvent"
        | "SceneRunningInstancesEvent"
        | "SceneRemovedEvent"
        | "SceneModifiedEvent"
        | "SceneCreatedEvent" => "/scenes/<id>",

        "ActiveProfileChangedEvent" => "/profiles/<id>",

        "ClimateZoneChangedEvent" | "ClimateZoneSetpointChangedEvent" => "/panels/climate/<id>",

        "NotificationCreatedEvent"
        | "NotificationRemovedEvent"
        | "NotificationUpdatedEvent" => "/notificationCenter/<id>",

        "RoomCreatedEvent" | "RoomRemovedEvent" | "RoomModifiedEvent" => "/rooms/<id>",

        "SectionCreatedEvent" | "SectionRemovedEvent" | "SectionModifiedEvent" => "/sections/<id>",

        _ => return None,
    })
}

/// Resolve the detail-lookup path for an event, substituting the id.
///
/// Returns `None` for event types with no backing resource. Weather has
/// no id placeholder, so the id is ignored for it.
pub fn detail_path(event_type: &str, id: &str) -> Option<String> {
    let template = endpoint_template(event_type)?;
    if event_type == "WeatherChangedEvent" {
        return Some(template.to_string());
    }
    Some(template.replace("<id>", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_id_placeholder() {
        assert_eq!(
            detail_path("DevicePropertyUpdatedEvent", "57"),
            Some("/devices/57".into())
        );
        assert_eq!(
            detail_path("GlobalVariableChangedEvent", "myVar"),
            Some("/globalVariables/myVar".into())
        );
    }

    #[test]
    fn weather_ignores_id() {
        assert_eq!(detail_path("WeatherChangedEvent", "9"), Some("/weather".into()));
    }

    #[test]
    fn unknown_type_has_no_endpoint() {
        assert_eq!(detail_path("SomethingElseEvent", "1"), None);
    }
}
