//! Mutator configuration and its per-event annotation overrides.

use crate::error::ConfigError;
use crate::event::Event;
use serde::{Deserialize, Serialize};

/// Plugin name, also the last component of the annotation keyspace.
pub const PLUGIN_NAME: &str = "sensu-check-status-metric-mutator";
/// Annotation prefix under which events may override option values.
pub const ANNOTATION_KEYSPACE: &str = "sensu.io/plugins/sensu-check-status-metric-mutator/config";
/// Option path of the metric name template.
pub const METRIC_NAME_TEMPLATE_PATH: &str = "metric-name-template";
pub const DEFAULT_METRIC_NAME_TEMPLATE: &str = "{{.Check.Name}}.status";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub metric_name_template: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metric_name_template: DEFAULT_METRIC_NAME_TEMPLATE.to_string(),
        }
    }
}

impl Config {
    pub fn new(metric_name_template: impl Into<String>) -> Self {
        Self {
            metric_name_template: metric_name_template.into(),
        }
    }

    /// Fails iff the template is empty. Syntax is only checked at render time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.metric_name_template.is_empty() {
            return Err(ConfigError::TemplateRequired);
        }
        Ok(())
    }

    /// Returns the effective config for one event.
    ///
    /// Annotations named `<ANNOTATION_KEYSPACE>/<option path>` replace the
    /// configured value. Entity annotations are applied first and check
    /// annotations second, so a check annotation wins over an entity one.
    /// The result is not validated; callers re-run [`Config::validate`].
    pub fn with_annotation_overrides(&self, event: &Event) -> Config {
        let key = annotation_key(METRIC_NAME_TEMPLATE_PATH);
        let mut effective = self.clone();

        let sources = [
            event.entity.as_ref().map(|e| &e.metadata),
            event.check.as_ref().map(|c| &c.metadata),
        ];
        for meta in sources.into_iter().flatten() {
            if let Some(value) = meta.annotation(&key) {
                effective.metric_name_template = value.to_string();
            }
        }

        effective
    }
}

/// Full annotation key for an option path.
pub fn annotation_key(path: &str) -> String {
    format!("{ANNOTATION_KEYSPACE}/{path}")
}
