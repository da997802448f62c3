//! JSON Schemas for tool inputs.

use netwatch_types::{MAX_HOURS, MIN_HOURS};
use serde_json::{json, Map, Value};

fn filter_properties() -> Map<String, Value> {
    let properties = json!({
        "timeWindowHours": {
            "type": "integer",
            "minimum": MIN_HOURS,
            "maximum": MAX_HOURS,
            "default": 24,
            "description": "Time range in hours"
        },
        "sensorIp": {
            "type": "string",
            "description": "Only include traffic seen by this sensor address"
        },
        "sensorName": {
            "type": "string",
            "description": "Only include traffic seen by this sensor"
        }
    });
    match properties {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Schema shared by the full load and refresh tools.
pub fn filter_schema() -> Value {
    json!({
        "type": "object",
        "properties": filter_properties(),
    })
}

/// Schema for the drilldown tool.
pub fn detail_schema() -> Value {
    let mut properties = filter_properties();
    properties.insert(
        "applicationName".to_string(),
        json!({
            "type": "string",
            "minLength": 1,
            "description": "Application to drill into"
        }),
    );
    json!({
        "type": "object",
        "properties": properties,
        "required": ["applicationName"],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_schema_requires_application() {
        let schema = detail_schema();
        assert_eq!(schema["required"][0], "applicationName");
        assert_eq!(schema["properties"]["timeWindowHours"]["maximum"], 168);
        assert!(filter_schema().get("required").is_none());
    }
}
