use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use serde_json::{Value as JsonValue, json};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use sift::Engine;
use sift::config::AppConfig;
use sift::debug::{DebugHandler, annotate};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML, JSON or TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Synonym table (YAML mapping of term to alternate terms)
    #[arg(short, long, global = true)]
    pub synonyms: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the syntax tree of a filter as JSON
    Parse { filter: String },

    /// Check a text against a filter (exit code 0 on match)
    Text {
        filter: String,
        /// Text to check (default: stdin)
        text: Option<String>,
    },

    /// Check records (JSON array or JSON lines) against a filter
    Records {
        filter: String,
        /// Records file, or - for stdin
        #[arg(short, long, default_value = "-")]
        input: PathBuf,
        /// Evaluate on a single thread
        #[arg(long)]
        sequential: bool,
    },

    /// Answer a debug page request body
    Debug {
        /// Request file, or - for stdin
        #[arg(short, long, default_value = "-")]
        request: PathBuf,
    },
}

pub fn run(cli: Cli) -> Result<ExitCode> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let synonyms = cli.synonyms.or(config.synonyms);

    match cli.command {
        Command::Parse { filter } => {
            let tree = Engine::default().parse(&filter);
            println!("{}", serde_json::to_string_pretty(&tree)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Text { filter, text } => {
            let engine = Engine::new(synonyms.as_deref());
            let text = match text {
                Some(text) => text,
                None => strip_newline(read_source(Path::new("-"))?),
            };
            let matched = engine.check(&text, &engine.parse(&filter));
            println!("{matched}");
            Ok(exit_code(matched))
        }
        Command::Records {
            filter,
            input,
            sequential,
        } => {
            let engine = Engine::new(synonyms.as_deref());
            let tree = engine.parse(&filter);
            let records = parse_records(&read_source(&input)?)?;
            let parallel = config.parallel && !sequential;
            tracing::info!(
                "Checking {} records ({})",
                records.len(),
                if parallel { "parallel" } else { "sequential" }
            );

            let results = if parallel {
                records
                    .par_iter()
                    .map(|record| annotate(&engine, &tree, record))
                    .collect::<Result<Vec<_>, _>>()?
            } else {
                records
                    .iter()
                    .map(|record| annotate(&engine, &tree, record))
                    .collect::<Result<Vec<_>, _>>()?
            };

            let matches = results.iter().filter(|r| r["result"] == true).count();
            tracing::info!("{} of {} records matched", matches, results.len());

            let mut out = std::io::stdout().lock();
            serde_json::to_writer(&mut out, &json!({ "results": results }))?;
            writeln!(out)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Debug { request } => {
            let body = read_source(&request)?;
            let response = DebugHandler::new(synonyms).handle(&body);
            println!("{}", serde_json::to_string(&response)?);
            Ok(exit_code(response.status == 200))
        }
    }
}

/// Read a whole file, or stdin for `-`.
pub fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("CLI: Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("CLI: Failed to read {:?}", path))
}

/// Records as a JSON array, or one JSON value per line.
pub fn parse_records(content: &str) -> Result<Vec<JsonValue>> {
    if content.trim_start().starts_with('[') {
        return serde_json::from_str(content).context("CLI: Invalid JSON array of records");
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("CLI: Invalid JSON record on line {}", i + 1))
        })
        .collect()
}

fn strip_newline(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
