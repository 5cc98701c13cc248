//! Check status metric mutator.
//!
//! Derives a metric point from a check-execution event: the point's value is
//! the check's exit status, its name comes from a configurable template and
//! five tags describe where it came from. The point is appended to the
//! event's metrics so downstream metric handlers can store check health as a
//! time series.

pub mod config;
pub mod error;
pub mod event;
pub mod mutator;
pub mod template;

pub use config::{Config, DEFAULT_METRIC_NAME_TEMPLATE};
pub use error::{ConfigError, MutationError, TemplateError};
pub use event::{Check, Entity, Event, MetricPoint, MetricTag, Metrics, ObjectMeta};
pub use mutator::Mutator;
pub use template::{FieldPathRenderer, TemplateRenderer, TemplateSyntax, TeraRenderer};

/// Validates `config` and mutates one event, the way the plugin host runs
/// the pair: annotation overrides first, then validation, then mutation.
pub fn execute<R: TemplateRenderer>(
    mutator: &Mutator<R>,
    config: &Config,
    event: Event,
) -> error::Result<Event> {
    let effective = config.with_annotation_overrides(&event);
    effective.validate()?;
    mutator.mutate(event, &effective)
}
