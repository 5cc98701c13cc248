//! CLI for the check status metric mutator.
//!
//! Reads one event as JSON from stdin, appends a metric point carrying the
//! check's status and writes the event back to stdout, ready for a metrics
//! handler. Diagnostics go to stderr so stdout only ever carries the event.

use anyhow::{Context, Result};
use clap::Parser;
use status_metric_core::config::PLUGIN_NAME;
use status_metric_core::{
    execute, Config, Event, Mutator, TemplateSyntax, DEFAULT_METRIC_NAME_TEMPLATE,
};
use std::io::{self, Read, Write};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = PLUGIN_NAME, author, version, about = "Sensu Check Status Metric Mutator", long_about = None)]
struct Cli {
    /// Template for naming the metric point for the check status
    #[arg(
        short = 't',
        long,
        env = "METRIC_NAME_TEMPLATE",
        default_value = DEFAULT_METRIC_NAME_TEMPLATE
    )]
    metric_name_template: String,

    /// Template syntax: "field-path" ({{.Check.Name}}) or "tera" ({{ check.metadata.name }})
    #[arg(long, env = "METRIC_NAME_TEMPLATE_SYNTAX", default_value_t = TemplateSyntax::FieldPath)]
    template_syntax: TemplateSyntax,

    /// Ignore option overrides from entity and check annotations
    #[arg(long)]
    no_annotation_overrides: bool,
}

impl Cli {
    fn config(&self) -> Config {
        Config::new(self.metric_name_template.clone())
    }
}

/// Installs a stderr `fmt` subscriber filtered by `RUST_LOG` (default: warn).
fn initialize_logging() -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .try_init()
        .context("Failed to initialize logging")
}

fn read_event(mut input: impl Read) -> Result<Event> {
    let mut raw = String::new();
    input
        .read_to_string(&mut raw)
        .context("Failed to read event from stdin")?;
    if raw.trim().is_empty() {
        anyhow::bail!("no event on stdin");
    }
    serde_json::from_str(&raw).context("Failed to parse event JSON")
}

fn run(cli: &Cli, input: impl Read, mut output: impl Write) -> Result<()> {
    let config = cli.config();
    config.validate().context("Invalid configuration")?;

    let event = read_event(input)?;
    tracing::debug!(
        entity = event.entity_name(),
        points = event.point_count(),
        "received event"
    );

    let mutator = Mutator::new(cli.template_syntax.renderer());
    let mutated = if cli.no_annotation_overrides {
        mutator.mutate(event, &config)
    } else {
        execute(&mutator, &config, event)
    };
    let mutated = mutated.map_err(|e| {
        tracing::error!(error = %e, "event rejected");
        e
    })?;

    serde_json::to_writer(&mut output, &mutated).context("Failed to serialize event")?;
    writeln!(output)?;
    output.flush()?;

    tracing::info!(points = mutated.point_count(), "event mutated");
    Ok(())
}

/// Parses arguments; usage errors exit with 1 like every other failure,
/// `--help` and `--version` still exit with 0.
fn parse_args() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    }
}

fn main() -> Result<()> {
    let cli = parse_args();
    initialize_logging()?;
    run(&cli, io::stdin().lock(), io::stdout().lock())
}
