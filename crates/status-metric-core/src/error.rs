use thiserror::Error;

/// Startup-time configuration problems. Fatal: no event is processed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("metric name template is required (--metric-name-template or METRIC_NAME_TEMPLATE)")]
    TemplateRequired,
}

/// Failures while turning a template into a metric name.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template syntax error at byte {offset}: {reason}")]
    Syntax { offset: usize, reason: &'static str },
    #[error("can't evaluate field {path}: not present on event")]
    MissingField { path: String },
    #[error("field {path} is not a scalar value")]
    NotScalar { path: String },
    #[error("unknown template syntax: {0} (expected \"field-path\" or \"tera\")")]
    UnknownSyntax(String),
    #[error("template context: {0}")]
    Context(#[from] serde_json::Error),
    #[error("{0}")]
    Engine(String),
}

/// Per-event failures of the mutator. The event must not be forwarded.
#[derive(Debug, Error)]
pub enum MutationError {
    #[error("event has no check data")]
    MissingCheck,
    #[error("failed to evaluate metric name template: {0}")]
    TemplateRender(#[from] TemplateError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, MutationError>;
