//! Turns a check event into a status metric point.
//!
//! The [`Mutator`] renders the metric name, builds the point and appends it to
//! the event's metric collection. Validation and rendering finish before the
//! event is touched, so a failed mutation never leaves a partial point behind.

use crate::config::Config;
use crate::error::{MutationError, Result};
use crate::event::{Check, Event, MetricPoint, MetricTag, Metrics};
use crate::template::{FieldPathRenderer, TemplateRenderer};

pub const TAG_ENTITY: &str = "entity";
pub const TAG_CHECK: &str = "check";
pub const TAG_STATE: &str = "state";
pub const TAG_OCCURRENCES: &str = "occurrences";
pub const TAG_OCCURRENCES_WATERMARK: &str = "occurrences_watermark";

#[derive(Debug, Clone, Default)]
pub struct Mutator<R = FieldPathRenderer> {
    renderer: R,
}

impl Mutator {
    /// A mutator using the `{{.Check.Name}}`-style field-path renderer.
    pub fn field_path() -> Self {
        Self::new(FieldPathRenderer)
    }
}

impl<R: TemplateRenderer> Mutator<R> {
    pub fn new(renderer: R) -> Self {
        Self { renderer }
    }

    /// Appends the status point and hands the event back.
    pub fn mutate(&self, mut event: Event, config: &Config) -> Result<Event> {
        self.mutate_in_place(&mut event, config)?;
        Ok(event)
    }

    /// Like [`Mutator::mutate`], but leaves the event with the caller.
    ///
    /// On error the event is unchanged.
    pub fn mutate_in_place(&self, event: &mut Event, config: &Config) -> Result<()> {
        let check = event.check.as_ref().ok_or(MutationError::MissingCheck)?;
        let name = self.renderer.render(&config.metric_name_template, event)?;
        let point = status_point(name, event.timestamp, event.entity_name(), check);

        #[cfg(feature = "telemetry")]
        tracing::debug!(
            metric = %point.name,
            value = point.value,
            timestamp = point.timestamp,
            "appending check status point"
        );

        event
            .metrics
            .get_or_insert_with(Metrics::default)
            .points
            .push(point);
        Ok(())
    }
}

/// The five descriptive tags, in their fixed order.
pub fn status_tags(entity_name: &str, check: &Check) -> Vec<MetricTag> {
    vec![
        MetricTag::new(TAG_ENTITY, entity_name),
        MetricTag::new(TAG_CHECK, check.name()),
        MetricTag::new(TAG_STATE, check.state.as_str()),
        MetricTag::new(TAG_OCCURRENCES, check.occurrences.to_string()),
        MetricTag::new(
            TAG_OCCURRENCES_WATERMARK,
            check.occurrences_watermark.to_string(),
        ),
    ]
}

/// A point whose value is the check's exit status.
pub fn status_point(
    name: String,
    timestamp: i64,
    entity_name: &str,
    check: &Check,
) -> MetricPoint {
    MetricPoint {
        name,
        value: f64::from(check.status),
        timestamp,
        tags: status_tags(entity_name, check),
    }
}
