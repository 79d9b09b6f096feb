use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use csharp_normalizer::config::NormalizerConfig;
use csharp_normalizer::driver::{Driver, Mode, Request, Response, Status, parse_json};
use csharp_normalizer::ir::Node;
use csharp_normalizer::logging::init_logger;
use csharp_normalizer::server;

/// Normalizes C# syntax trees into semantic UAST.
#[derive(Debug, Parser)]
#[command(name = "csharp-normalizer", version)]
struct Args {
    /// Log level filter (otherwise RUST_LOG, or "info")
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Disable ANSI colors in log output
    #[arg(long, global = true)]
    no_color: bool,

    /// Also write debug logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// JSON configuration overriding the built-in tables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// How far trees are transformed
    #[arg(long, global = true, value_enum, default_value_t = Mode::Semantic)]
    mode: Mode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read JSON-lines requests from stdin and write responses to stdout.
    Serve,
    /// Transform native tree files and print the responses.
    Normalize {
        /// JSON files holding either a bare tree or a `{"content", "ast"}` request.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
}

fn read_request(path: &Path) -> Result<Request> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let value: serde_json::Value =
        parse_json(&text).with_context(|| format!("parsing {}", path.display()))?;
    if value.get("ast").is_some() {
        return serde_json::from_value(value)
            .with_context(|| format!("parsing request {}", path.display()));
    }
    Ok(Request {
        content: None,
        ast: Node::from(value),
    })
}

fn render(response: &Response, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(response)?
    } else {
        serde_json::to_string(response)?
    };
    Ok(text)
}

fn normalize_files(driver: &Driver, files: &[PathBuf], pretty: bool) -> Result<bool> {
    // Trees may be deeper than the main thread stack allows; keep them on driver workers.
    let rendered = driver.install(|| -> Result<Vec<(Status, String)>> {
        let requests = files
            .iter()
            .map(|f| read_request(f))
            .collect::<Result<Vec<_>>>()?;
        driver
            .handle_batch(&requests)
            .iter()
            .map(|r| Ok((r.status, render(r, pretty)?)))
            .collect()
    })?;

    let mut out = BufWriter::new(io::stdout().lock());
    let mut all_ok = true;
    for (file, (status, text)) in files.iter().zip(&rendered) {
        if *status == Status::Error {
            all_ok = false;
            error!(file = %file.display(), "normalization failed");
        }
        out.write_all(text.as_bytes())?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    info!(files = files.len(), "normalized");
    Ok(all_ok)
}

fn run(args: Args) -> Result<bool> {
    let config = NormalizerConfig::load_or_default(args.config.as_deref())?;
    let driver = Driver::new(config, args.mode);
    match args.command {
        Command::Serve => {
            let stdin = io::stdin();
            server::serve(&driver, stdin.lock(), io::stdout().lock())?;
            Ok(true)
        }
        Command::Normalize { files, pretty } => normalize_files(&driver, &files, pretty),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let _guard = match init_logger(args.no_color, args.log_level.as_deref(), args.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };
    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
