//! Rendering of metric name templates against an event.
//!
//! The mutator only needs `render(template, event) -> String`; the
//! [`TemplateRenderer`] trait is that seam. Two implementations ship with the
//! crate:
//!
//! - [`FieldPathRenderer`] understands `{{.Check.Name}}`-style field paths,
//!   the syntax of the plugin's default template.
//! - [`TeraRenderer`] hands the template to the `tera` engine with the event
//!   as context (`{{ check.metadata.name }}`), for filters and conditionals.

use crate::error::TemplateError;
use crate::event::Event;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Renders a template string against an event.
pub trait TemplateRenderer {
    fn render(&self, template: &str, event: &Event) -> Result<String, TemplateError>;
}

impl<R: TemplateRenderer + ?Sized> TemplateRenderer for &R {
    fn render(&self, template: &str, event: &Event) -> Result<String, TemplateError> {
        (**self).render(template, event)
    }
}

impl<R: TemplateRenderer + ?Sized> TemplateRenderer for Box<R> {
    fn render(&self, template: &str, event: &Event) -> Result<String, TemplateError> {
        (**self).render(template, event)
    }
}

/// Selects one of the bundled renderers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateSyntax {
    #[default]
    FieldPath,
    Tera,
}

impl TemplateSyntax {
    pub fn renderer(self) -> Box<dyn TemplateRenderer> {
        match self {
            TemplateSyntax::FieldPath => Box::new(FieldPathRenderer),
            TemplateSyntax::Tera => Box::new(TeraRenderer),
        }
    }
}

impl fmt::Display for TemplateSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TemplateSyntax::FieldPath => "field-path",
            TemplateSyntax::Tera => "tera",
        })
    }
}

impl FromStr for TemplateSyntax {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "field-path" | "fieldpath" | "go" => Ok(TemplateSyntax::FieldPath),
            "tera" => Ok(TemplateSyntax::Tera),
            other => Err(TemplateError::UnknownSyntax(other.to_string())),
        }
    }
}

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Field-path templates: literal text plus `{{ .Path.To.Field }}` actions.
///
/// Segments match JSON keys case-insensitively and ignoring underscores, so
/// `.Check.OccurrencesWatermark` finds `check.occurrences_watermark`. When a
/// segment is missing on an object, its `metadata` member is searched as
/// well, which makes `.Check.Name` resolve `check.metadata.name`.
/// Fields of the event schema that are absent from the event render as
/// their zero value, a key missing from `labels` or `annotations` renders as
/// `<no value>`. Names outside the schema are errors.
/// `{{-` and `-}}` trim the whitespace of the literal text before or after
/// the action.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldPathRenderer;

impl TemplateRenderer for FieldPathRenderer {
    fn render(&self, template: &str, event: &Event) -> Result<String, TemplateError> {
        let mut context = serde_json::to_value(event)?;
        with_schema_defaults(&mut context);
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        let mut offset = 0;
        let mut trim_next = false;

        while let Some(start) = rest.find(OPEN) {
            let body_start = start + OPEN.len();
            let body_len = rest[body_start..].find(CLOSE).ok_or(TemplateError::Syntax {
                offset: offset + start,
                reason: "unclosed action",
            })?;
            let mut body = &rest[body_start..body_start + body_len];

            let mut literal = &rest[..start];
            if trim_next {
                literal = literal.trim_start();
            }
            if let Some(trimmed) = body.strip_prefix("- ") {
                body = trimmed;
                literal = literal.trim_end();
            }
            out.push_str(literal);

            trim_next = false;
            if let Some(trimmed) = body.strip_suffix(" -") {
                body = trimmed;
                trim_next = true;
            }

            let path = parse_field_path(body.trim(), offset + start)?;
            out.push_str(&resolve(&context, &path)?);

            let consumed = body_start + body_len + CLOSE.len();
            offset += consumed;
            rest = &rest[consumed..];
        }

        out.push_str(if trim_next { rest.trim_start() } else { rest });
        Ok(out)
    }
}

/// Splits `.A.B.C` into its segments.
fn parse_field_path(action: &str, offset: usize) -> Result<Vec<&str>, TemplateError> {
    if action.is_empty() {
        return Err(TemplateError::Syntax {
            offset,
            reason: "missing value for command",
        });
    }
    let path = action.strip_prefix('.').ok_or(TemplateError::Syntax {
        offset,
        reason: "only field paths starting with '.' are supported",
    })?;
    if path.is_empty() {
        return Ok(Vec::new());
    }

    let segments: Vec<&str> = path.split('.').collect();
    let valid = |s: &&str| !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_');
    if !segments.iter().all(valid) {
        return Err(TemplateError::Syntax {
            offset,
            reason: "malformed field path",
        });
    }
    Ok(segments)
}

fn normalize(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn lookup<'a>(object: &'a Map<String, Value>, segment: &str) -> Option<&'a Value> {
    let wanted = normalize(segment);
    let direct = object
        .get(segment)
        .or_else(|| object.iter().find(|(k, _)| normalize(k) == wanted).map(|(_, v)| v));

    direct.or_else(|| match object.get("metadata") {
        Some(Value::Object(meta)) => meta
            .get(segment)
            .or_else(|| meta.iter().find(|(k, _)| normalize(k) == wanted).map(|(_, v)| v)),
        _ => None,
    })
}

fn resolve(context: &Value, path: &[&str]) -> Result<String, TemplateError> {
    let display = || format!(".{}", path.join("."));
    let mut current = context;
    let mut in_free_form_map = false;

    for (i, segment) in path.iter().enumerate() {
        let found = match current {
            Value::Object(object) => lookup(object, segment),
            _ => None,
        };
        current = match found {
            Some(value) => value,
            None if in_free_form_map && i + 1 == path.len() => return Ok(NO_VALUE.to_string()),
            None => return Err(TemplateError::MissingField { path: display() }),
        };
        in_free_form_map = FREE_FORM_MAPS.contains(&normalize(segment).as_str());
    }

    match current {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Err(TemplateError::MissingField { path: display() }),
        Value::Array(_) | Value::Object(_) => Err(TemplateError::NotScalar { path: display() }),
    }
}

/// Rendered for a key missing from a free-form map.
const NO_VALUE: &str = "<no value>";
/// Schema fields whose keys are user-defined.
const FREE_FORM_MAPS: &[&str] = &["labels", "annotations"];

#[derive(Clone, Copy)]
enum Zero {
    Str,
    Int,
    Bool,
    List,
    Map,
}

impl Zero {
    fn value(self) -> Value {
        match self {
            Zero::Str => Value::String(String::new()),
            Zero::Int => Value::from(0),
            Zero::Bool => Value::Bool(false),
            Zero::List => Value::Array(Vec::new()),
            Zero::Map => Value::Object(Map::new()),
        }
    }
}

const EVENT_FIELDS: &[(&str, Zero)] = &[
    ("id", Zero::Str),
    ("timestamp", Zero::Int),
    ("sequence", Zero::Int),
];

const OBJECT_META_FIELDS: &[(&str, Zero)] = &[
    ("name", Zero::Str),
    ("namespace", Zero::Str),
    ("created_by", Zero::Str),
    ("labels", Zero::Map),
    ("annotations", Zero::Map),
];

const ENTITY_FIELDS: &[(&str, Zero)] = &[
    ("entity_class", Zero::Str),
    ("user", Zero::Str),
    ("subscriptions", Zero::List),
    ("last_seen", Zero::Int),
    ("deregister", Zero::Bool),
    ("redact", Zero::List),
    ("sensu_agent_version", Zero::Str),
];

const CHECK_FIELDS: &[(&str, Zero)] = &[
    ("command", Zero::Str),
    ("output", Zero::Str),
    ("proxy_entity_name", Zero::Str),
    ("status", Zero::Int),
    ("state", Zero::Str),
    ("occurrences", Zero::Int),
    ("occurrences_watermark", Zero::Int),
    ("interval", Zero::Int),
    ("cron", Zero::Str),
    ("ttl", Zero::Int),
    ("timeout", Zero::Int),
    ("issued", Zero::Int),
    ("executed", Zero::Int),
    ("duration", Zero::Int),
    ("last_ok", Zero::Int),
    ("total_state_change", Zero::Int),
    ("low_flap_threshold", Zero::Int),
    ("high_flap_threshold", Zero::Int),
    ("publish", Zero::Bool),
    ("round_robin", Zero::Bool),
    ("stdin", Zero::Bool),
    ("discard_output", Zero::Bool),
    ("handlers", Zero::List),
    ("subscriptions", Zero::List),
    ("silenced", Zero::List),
    ("output_metric_format", Zero::Str),
];

fn fill(object: &mut Map<String, Value>, fields: &[(&str, Zero)]) {
    for (key, zero) in fields {
        let slot = object.entry(*key).or_insert(Value::Null);
        if slot.is_null() {
            *slot = zero.value();
        }
    }
}

/// Fills absent or null schema fields of the render context with zero values.
/// A missing entity or check stays missing.
fn with_schema_defaults(context: &mut Value) {
    let Value::Object(event) = context else {
        return;
    };
    fill(event, EVENT_FIELDS);

    for (key, fields) in [("entity", ENTITY_FIELDS), ("check", CHECK_FIELDS)] {
        if let Some(Value::Object(object)) = event.get_mut(key) {
            fill(object, fields);
            let meta = object
                .entry("metadata")
                .or_insert_with(|| Value::Object(Map::new()));
            if meta.is_null() {
                *meta = Value::Object(Map::new());
            }
            if let Value::Object(meta) = meta {
                fill(meta, OBJECT_META_FIELDS);
            }
        }
    }
}

/// Renders with `tera`, using the serialized event as context.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeraRenderer;

impl TemplateRenderer for TeraRenderer {
    fn render(&self, template: &str, event: &Event) -> Result<String, TemplateError> {
        let context = tera::Context::from_serialize(event).map_err(engine_error)?;
        tera::Tera::one_off(template, &context, false).map_err(engine_error)
    }
}

/// Flattens tera's nested error chain into one message.
fn engine_error(err: tera::Error) -> TemplateError {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    TemplateError::Engine(message)
}
