//! Data structures for check-execution events as they travel through the
//! monitoring pipeline.
//!
//! The model follows the backend's JSON event format (snake_case keys, names
//! under `metadata.name`). Only the fields the mutator reads are typed; every
//! other field is kept in a flattened pass-through map so that an event
//! survives a deserialize → mutate → serialize round trip unchanged.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Fields of an object this crate does not interpret.
pub type Passthrough = BTreeMap<String, Value>;

/// Treats an explicit JSON `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Identity and annotations shared by entities and checks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ObjectMeta {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    /// Free-form annotations; also the source of per-event config overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

impl ObjectMeta {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Looks up a single annotation value.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations
            .as_ref()
            .and_then(|a| a.get(key))
            .map(String::as_str)
    }
}

/// The monitored thing (host, service, proxy) that produced the event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: ObjectMeta,
    #[serde(flatten)]
    pub extra: Passthrough,
}

impl Entity {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::named(name),
            extra: Passthrough::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

/// Result of a single check execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Check {
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: ObjectMeta,
    /// Exit status of the check command (0 = OK, 1 = warning, 2 = critical, ...).
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: u32,
    /// Backend-assigned state, e.g. "passing", "failing" or "flapping".
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
    /// Number of consecutive executions with the current status.
    #[serde(default, deserialize_with = "null_as_default")]
    pub occurrences: i64,
    /// Highest `occurrences` value reached in the current non-OK streak.
    #[serde(default, deserialize_with = "null_as_default")]
    pub occurrences_watermark: i64,
    #[serde(flatten)]
    pub extra: Passthrough,
}

impl Check {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

/// A key/value pair attached to a metric point.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricTag {
    pub name: String,
    pub value: String,
}

impl MetricTag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One timestamped numeric sample.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetricPoint {
    pub name: String,
    pub value: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<MetricTag>,
}

/// The metric collection carried by an event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Metrics {
    #[serde(default, deserialize_with = "null_as_default")]
    pub points: Vec<MetricPoint>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

/// A check-execution event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Event {
    /// Seconds since the Unix epoch.
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<Entity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<Check>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

impl Event {
    pub fn has_check(&self) -> bool {
        self.check.is_some()
    }

    pub fn has_metrics(&self) -> bool {
        self.metrics.is_some()
    }

    /// Name of the originating entity, empty when the event carries none.
    pub fn entity_name(&self) -> &str {
        self.entity.as_ref().map_or("", Entity::name)
    }

    /// Number of metric points currently attached.
    pub fn point_count(&self) -> usize {
        self.metrics.as_ref().map_or(0, |m| m.points.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_from_backend_json() {
        let event: Event = serde_json::from_value(json!({
            "timestamp": 1000,
            "entity": {
                "entity_class": "agent",
                "metadata": { "name": "host01", "namespace": "default" }
            },
            "check": {
                "metadata": { "name": "disk", "annotations": { "team": "ops" } },
                "status": 1,
                "state": "failing",
                "occurrences": 3,
                "occurrences_watermark": 4,
                "output": "WARNING: 91% used"
            }
        }))
        .expect("Deserialization failed");

        assert_eq!(event.timestamp, 1000);
        assert_eq!(event.entity_name(), "host01");
        let check = event.check.as_ref().expect("check present");
        assert_eq!(check.name(), "disk");
        assert_eq!(check.status, 1);
        assert_eq!(check.state, "failing");
        assert_eq!(check.occurrences, 3);
        assert_eq!(check.occurrences_watermark, 4);
        assert_eq!(check.metadata.annotation("team"), Some("ops"));
        assert_eq!(check.extra.get("output"), Some(&json!("WARNING: 91% used")));
        assert!(!event.has_metrics());
    }

    #[test]
    fn null_check_and_metrics_are_absent() {
        let event: Event = serde_json::from_value(json!({
            "timestamp": 5,
            "entity": { "metadata": { "name": "host01" } },
            "check": null,
            "metrics": null
        }))
        .expect("Deserialization failed");

        assert!(!event.has_check());
        assert!(!event.has_metrics());
        assert_eq!(event.point_count(), 0);
    }

    #[test]
    fn null_tags_and_points_become_empty() {
        let metrics: Metrics = serde_json::from_value(json!({
            "handlers": ["influxdb"],
            "points": [ { "name": "cpu", "value": 0.5, "timestamp": 1, "tags": null } ]
        }))
        .expect("Deserialization failed");

        assert_eq!(metrics.points.len(), 1);
        assert!(metrics.points[0].tags.is_empty());

        let empty: Metrics =
            serde_json::from_value(json!({ "points": null })).expect("Deserialization failed");
        assert!(empty.points.is_empty());
    }

    #[test]
    fn null_counters_and_metadata_become_zero() {
        let event: Event = serde_json::from_value(json!({
            "timestamp": null,
            "entity": { "metadata": null },
            "check": {
                "metadata": null,
                "status": null,
                "state": null,
                "occurrences": null,
                "occurrences_watermark": null
            }
        }))
        .expect("Deserialization failed");

        assert_eq!(event.timestamp, 0);
        assert_eq!(event.entity_name(), "");
        let check = event.check.expect("check present");
        assert_eq!(check.name(), "");
        assert_eq!(check.status, 0);
        assert_eq!(check.state, "");
        assert_eq!(check.occurrences, 0);
        assert_eq!(check.occurrences_watermark, 0);
    }

    #[test]
    fn unknown_fields_survive_roundtrip() {
        let input = json!({
            "id": "3f9c",
            "timestamp": 1000,
            "entity": { "metadata": { "name": "host01" }, "system": { "os": "linux" } },
            "check": {
                "metadata": { "name": "disk" },
                "status": 2,
                "state": "failing",
                "occurrences": 1,
                "occurrences_watermark": 1,
                "interval": 60
            },
            "metrics": { "handlers": ["influxdb"], "points": [] }
        });

        let event: Event = serde_json::from_value(input.clone()).expect("Deserialization failed");
        let output = serde_json::to_value(&event).expect("Serialization failed");

        assert_eq!(output["id"], json!("3f9c"));
        assert_eq!(output["entity"]["system"], json!({ "os": "linux" }));
        assert_eq!(output["check"]["interval"], json!(60));
        assert_eq!(output["metrics"]["handlers"], json!(["influxdb"]));
        assert_eq!(output["check"]["occurrences_watermark"], json!(1));
    }

    #[test]
    fn absent_check_is_not_serialized() {
        let event = Event {
            timestamp: 1,
            entity: Some(Entity::named("host01")),
            ..Event::default()
        };

        let serialized = serde_json::to_string(&event).expect("Serialization failed");
        assert!(!serialized.contains("\"check\""));
        assert!(!serialized.contains("\"metrics\""));
        assert!(serialized.contains("\"name\":\"host01\""));
    }
}
