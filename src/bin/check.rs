//! Dialect Check CLI
//!
//! Loads MAVLink dialects with their includes, runs every validator and
//! prints a per-file summary.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use mavlib_gen::config::ReportFormat;
use mavlib_gen::{collect_dialects, DialectFile, DialectLoader, MavlibConfig, ResolvedDialects};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mavlib-check")]
#[command(about = "Validate MAVLink dialects and their include trees")]
struct Cli {
    /// Dialect files to load (defaults to the configured paths)
    paths: Vec<PathBuf>,

    /// Load every *.xml under this directory
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Config file layered over the default locations
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Summary format
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Write the include graph as Graphviz DOT
    #[arg(long)]
    dot: Option<PathBuf>,

    /// Largest message id accepted
    #[arg(long)]
    max_message_id: Option<u32>,

    /// Write the effective configuration as TOML and exit
    #[arg(long)]
    save_config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Serialize)]
struct FileReport<'a> {
    filename: &'a str,
    path: String,
    sha256: Option<&'a str>,
    dependencies: &'a [String],
    messages: Vec<MessageReport<'a>>,
    enums: usize,
}

#[derive(Serialize)]
struct MessageReport<'a> {
    id: u32,
    name: &'a str,
    length: usize,
    base_length: usize,
    crc_extra: u8,
}

#[derive(Serialize)]
struct Report<'a> {
    bundle_hash: String,
    files: Vec<FileReport<'a>>,
}

fn main() {
    let cli = Cli::parse();

    let config = match MavlibConfig::load_from(cli.config.as_deref().and_then(|p| p.to_str())) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(cli, config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli, mut config: MavlibConfig) -> anyhow::Result<()> {
    if let Some(max) = cli.max_message_id {
        config.validation.max_message_id = max;
    }
    if let Some(format) = cli.format {
        config.report.format = match format {
            Format::Text => ReportFormat::Text,
            Format::Json => ReportFormat::Json,
        };
    }
    if cli.dot.is_some() {
        config.report.dot = cli.dot.clone();
    }

    if let Some(path) = &cli.save_config {
        let path = path.to_str().context("config path is not valid UTF-8")?;
        config.save(path).with_context(|| format!("writing {}", path))?;
        println!("Configuration written to {}", path);
        return Ok(());
    }

    let mut paths = cli.paths.clone();
    if let Some(dir) = cli.dir.clone().or_else(|| config.dialect_directory()) {
        paths.extend(collect_dialects(&dir).with_context(|| format!("scanning {}", dir.display()))?);
    }
    if paths.is_empty() {
        paths = config.dialects.paths.clone();
    }
    if paths.is_empty() {
        bail!("no dialect files given (pass paths, --dir, or set [dialects] in mavlib.toml)");
    }

    let resolved = DialectLoader::from_config(&config).load(&paths)?;

    match config.report.format {
        ReportFormat::Text => print_text(&resolved),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report(&resolved))?),
    }

    if let Some(dot_path) = &config.report.dot {
        std::fs::write(dot_path, resolved.graph().to_dot())
            .with_context(|| format!("writing {}", dot_path.display()))?;
        tracing::info!("Include graph written to {}", dot_path.display());
    }

    Ok(())
}

fn file_report(file: &DialectFile) -> FileReport<'_> {
    FileReport {
        filename: file.filename(),
        path: file.absolute_path().display().to_string(),
        sha256: file.digest().map(|d| d.as_str()),
        dependencies: file.dependencies().unwrap_or(&[]),
        messages: file
            .dialect()
            .messages
            .iter()
            .map(|m| MessageReport {
                id: m.id(),
                name: m.name(),
                length: m.byte_length(),
                base_length: m.base_byte_length(),
                crc_extra: m.crc_extra().value(),
            })
            .collect(),
        enums: file.dialect().enums.len(),
    }
}

fn report(resolved: &ResolvedDialects) -> Report<'_> {
    Report {
        bundle_hash: resolved.bundle_hash().to_string(),
        files: resolved.generation_order().into_iter().map(file_report).collect(),
    }
}

fn print_text(resolved: &ResolvedDialects) {
    for file in resolved.generation_order() {
        let summary = file_report(file);
        println!("{} ({})", summary.filename, summary.path);
        if !summary.dependencies.is_empty() {
            println!("  includes: {}", summary.dependencies.join(", "));
        }
        println!("  {} messages, {} enums", summary.messages.len(), summary.enums);
        for message in &summary.messages {
            println!(
                "    {:>5} {:<32} len={:<4} crc_extra={}",
                message.id, message.name, message.length, message.crc_extra
            );
        }
    }
    println!();
    println!("{} files, bundle {}", resolved.len(), resolved.bundle_hash());
}
