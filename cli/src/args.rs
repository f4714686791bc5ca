use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use hunkrank_diff::Options;

/// Keep the hunks that matter most in a unified diff and summarize the rest.
#[derive(Debug, Parser)]
#[command(name = "hunkrank", version)]
pub struct Cli {
    /// Diff file to read; stdin when omitted or `-`
    pub diff: Option<PathBuf>,

    /// Config file (default: $HUNKRANK_CONFIG or ~/.hunkrank/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory that diff paths are relative to
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Changed-line budget for the high-priority section
    #[arg(long, value_name = "N")]
    pub max_lines: Option<usize>,

    /// Omit the "[Also modified]" summary
    #[arg(long)]
    pub no_summary: bool,

    /// Deadline for all language server lookups, in milliseconds
    #[arg(long, value_name = "MS")]
    pub lsp_timeout_ms: Option<u64>,

    /// Score without language servers
    #[arg(long)]
    pub no_lsp: bool,

    /// Print diff statistics to stderr
    #[arg(long)]
    pub stats: bool,
}

impl Cli {
    /// Whether the diff comes from stdin.
    pub fn reads_stdin(&self) -> bool {
        self.diff.as_deref().is_none_or(|path| path.as_os_str() == "-")
    }

    /// Apply command-line overrides on top of configured options.
    pub fn apply(&self, options: &mut Options) {
        if let Some(lines) = self.max_lines {
            options.max_high_priority_lines = lines;
        }
        if self.no_summary {
            options.include_summary = false;
        }
        if let Some(ms) = self.lsp_timeout_ms {
            options.lsp_timeout = Duration::from_millis(ms);
        }
    }
}
