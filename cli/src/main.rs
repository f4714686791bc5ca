//! `hunkrank` binary: read a unified diff, print its prompt-ready form.
//!
//! ```text
//! diff (file | stdin) -> config + flags -> prioritize -> stdout
//!                                                     -> stats (stderr, --stats)
//! ```
//!
//! Logs go to stderr so stdout stays clean for piping into a prompt.

mod args;

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use hunkrank_config::HunkrankConfig;
use hunkrank_diff::{LspSymbols, NoSymbols, format_for_prompt, prioritize_with};

use crate::args::Cli;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

fn read_diff(cli: &Cli) -> Result<String> {
    match cli.diff.as_deref() {
        Some(path) if !cli.reads_stdin() => fs::read_to_string(path)
            .with_context(|| format!("Failed to read diff from {}", path.display())),
        _ => {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read diff from stdin")?;
            Ok(raw)
        }
    }
}

/// An explicit `--config` must load; the default location is best-effort.
fn load_config(explicit: Option<&Path>) -> Result<HunkrankConfig> {
    if let Some(path) = explicit {
        return HunkrankConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }
    Ok(HunkrankConfig::load().ok().flatten().unwrap_or_default())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let raw = read_diff(&cli)?;
    let config = load_config(cli.config.as_deref())?;

    let mut options = config.options(cli.work_dir.clone());
    cli.apply(&mut options);
    tracing::debug!(?options, no_lsp = cli.no_lsp, "Resolved options");

    let result = if cli.no_lsp || !config.lsp_enabled() {
        prioritize_with(&raw, &options, &NoSymbols).await
    } else {
        prioritize_with(&raw, &options, &LspSymbols::new(config.registry())).await
    };

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(format_for_prompt(&result).as_bytes())
        .and_then(|()| stdout.flush())
        .context("Failed to write prompt to stdout")?;

    if cli.stats {
        eprintln!("{}", result.stats);
    }

    Ok(())
}
