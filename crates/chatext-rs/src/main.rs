//! Render a conversation trace to HTML and optionally drive its widget.
//!
//! # Examples
//!
//! ```sh
//! # Render a trace file
//! chatext render trace.json
//!
//! # Pipe a trace, pick an option and press submit, dump everything as JSON
//! echo '{"type":"ext_select","payload":{"options":"Yes,No"}}' \
//!   | chatext render --choose No --submit --format json
//!
//! # Override renderer settings
//! chatext render trace.json --config chatext.json --all --strict
//!
//! # List the extension catalog with payload schemas
//! chatext catalog
//! ```

use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use chatext::prelude::*;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Render conversation traces with the built-in chat extensions.
#[derive(Parser)]
#[command(name = "chatext")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render one trace into a fresh container and print the result
    Render(RenderArgs),
    /// Print registered extensions in dispatch order with their payload schemas
    Catalog(CatalogArgs),
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Trace JSON file (reads stdin when omitted)
    file: Option<PathBuf>,

    // ── Configuration ──────────────────────────────────────────
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Render with every matching extension instead of the first
    #[arg(long)]
    all: bool,

    /// Validate payloads against extension schemas before rendering
    #[arg(long)]
    strict: bool,

    // ── Interaction ────────────────────────────────────────────
    /// Choose this option in the rendered select control
    #[arg(long)]
    choose: Option<String>,

    /// Press the rendered submit button
    #[arg(long)]
    submit: bool,

    // ── Output ─────────────────────────────────────────────────
    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Html)]
    format: Format,

    /// Include debug-level diagnostics
    #[arg(long, short)]
    verbose: bool,
}

#[derive(clap::Args)]
struct CatalogArgs {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Html,
    Json,
}

// ── Output types ───────────────────────────────────────────────────

#[derive(Serialize)]
struct RenderOutput {
    html: String,
    outcomes: Vec<OutcomeSummary>,
    reports: Vec<InteractionReport>,
    diagnostics: Vec<LogLine>,
}

#[derive(Serialize)]
struct OutcomeSummary {
    extension: &'static str,
    key: &'static str,
    rendered: bool,
    /// HTML of this extension's subtree only.
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl OutcomeSummary {
    fn new(outcome: &DispatchOutcome, container: &Container) -> Self {
        Self {
            extension: outcome.extension,
            key: outcome.key,
            rendered: outcome.is_rendered(),
            html: outcome.root().map(|root| container.node_html(root)),
            error: outcome.result.as_ref().err().map(|e| e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct CatalogEntry {
    name: &'static str,
    key: &'static str,
    schema: serde_json::Value,
}

// ── Commands ───────────────────────────────────────────────────────

fn load_config(path: Option<&PathBuf>) -> Result<ExtensionConfig, String> {
    match path {
        Some(path) => ExtensionConfig::from_path(path),
        None => Ok(ExtensionConfig::default()),
    }
}

fn read_trace(file: Option<&PathBuf>) -> Result<Trace, String> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("failed to read stdin: {e}"))?;
            buf
        }
    };
    serde_json::from_str(&raw).map_err(|e| format!("invalid trace JSON: {e}"))
}

fn render(args: &RenderArgs, diagnostics: &DiagnosticBuffer) -> Result<String, String> {
    let mut config = load_config(args.config.as_ref())?;
    if args.all {
        config = config.with_dispatch(DispatchMode::All);
    }
    if args.strict {
        config = config.with_payload_validation(true);
    }
    let trace = read_trace(args.file.as_ref())?;

    let registry = ExtensionRegistry::builtin(&config);
    let recorder = RecordingChannel::new();
    let channel: Arc<dyn InteractionChannel> = Arc::new(LoggingChannel::new(recorder.clone()));
    let mut container = Container::new();

    let outcomes = registry.dispatch(&trace, &mut container, &channel);
    if outcomes.is_empty() {
        warn!("No extension matched trace type {:?}", trace.kind);
    }

    if args.choose.is_some() || args.submit {
        let handle = outcomes
            .iter()
            .filter_map(DispatchOutcome::root)
            .find_map(|root| SelectHandle::locate(&container, root));
        match handle {
            Some(handle) => {
                if let Some(value) = &args.choose
                    && !handle.choose(&mut container, value)
                {
                    return Err(format!(
                        "no option {value:?}; available: {}",
                        handle.options(&container).join(", ")
                    ));
                }
                if args.submit {
                    handle.submit(&mut container);
                }
            }
            None => warn!("--choose/--submit ignored: no select control was rendered"),
        }
    }

    let floor = if args.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };
    let lines = diagnostics.drain_at_least(floor);
    let reports = recorder.take();
    let html = container.to_html();

    match args.format {
        Format::Html => {
            for line in &lines {
                eprintln!("{line}");
            }
            for report in &reports {
                let json = serde_json::to_string(report).map_err(|e| e.to_string())?;
                eprintln!("report: {json}");
            }
            Ok(format!("{html}\n"))
        }
        Format::Json => {
            let output = RenderOutput {
                html,
                outcomes: outcomes
                    .iter()
                    .map(|outcome| OutcomeSummary::new(outcome, &container))
                    .collect(),
                reports,
                diagnostics: lines,
            };
            serde_json::to_string_pretty(&output)
                .map(|json| format!("{json}\n"))
                .map_err(|e| e.to_string())
        }
    }
}

fn catalog(args: &CatalogArgs) -> Result<String, String> {
    let config = load_config(args.config.as_ref())?;
    let registry = ExtensionRegistry::builtin(&config);
    let entries: Vec<CatalogEntry> = registry
        .iter()
        .map(|ext| CatalogEntry {
            name: ext.name(),
            key: ext.key(),
            schema: ext.payload_schema(),
        })
        .collect();
    serde_json::to_string_pretty(&entries)
        .map(|json| format!("{json}\n"))
        .map_err(|e| e.to_string())
}

fn main() {
    let cli = Cli::parse();

    let (layer, diagnostics) = DiagnosticLayer::new();
    tracing_subscriber::registry().with(layer).init();

    let result = match &cli.command {
        Command::Render(args) => render(args, &diagnostics),
        Command::Catalog(args) => catalog(args),
    };

    match result {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
