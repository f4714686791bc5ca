//! Rank hunks, keep the best under a line budget, summarize the rest.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::Instant;

use crate::parser::{count_hunk_lines, parse};
use crate::scorer::{categorize_file, score_file_diff};
use crate::symbols::{LspSymbols, SymbolSource};
use crate::types::{DiffStats, FileCategory, FileDiff, Hunk, PrioritizedDiff};

pub const DEFAULT_MAX_HIGH_PRIORITY_LINES: usize = 400;
pub const DEFAULT_LSP_TIMEOUT: Duration = Duration::from_secs(5);

const SUMMARY_HEADER: &str = "\n[Also modified]\n- ";
const SUMMARY_SEPARATOR: &str = "\n- ";
const MAX_SUMMARY_NAMES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Changed-line budget for the high-priority bucket. `0` means the default.
    pub max_high_priority_lines: usize,
    pub include_summary: bool,
    /// Shared by every symbol lookup in one run.
    pub lsp_timeout: Duration,
    /// Base for resolving diff paths; the process directory when `None`.
    pub work_dir: Option<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_high_priority_lines: DEFAULT_MAX_HIGH_PRIORITY_LINES,
            include_summary: true,
            lsp_timeout: DEFAULT_LSP_TIMEOUT,
            work_dir: None,
        }
    }
}

impl Options {
    fn budget(&self) -> usize {
        if self.max_high_priority_lines == 0 {
            DEFAULT_MAX_HIGH_PRIORITY_LINES
        } else {
            self.max_high_priority_lines
        }
    }
}

/// Prioritize `raw` using language servers from the builtin registry.
pub async fn prioritize(raw: &str, options: &Options) -> PrioritizedDiff {
    prioritize_with(raw, options, &LspSymbols::default()).await
}

/// Prioritize `raw`, taking symbol outlines from `source`.
///
/// Never fails. Input that parses to no files comes back unchanged in
/// `high_priority`.
pub async fn prioritize_with<S: SymbolSource>(
    raw: &str,
    options: &Options,
    source: &S,
) -> PrioritizedDiff {
    let mut files = parse(raw);
    if files.is_empty() {
        return PrioritizedDiff {
            high_priority: raw.to_string(),
            ..PrioritizedDiff::default()
        };
    }

    let deadline = Instant::now() + options.lsp_timeout;
    for file in &mut files {
        if file.hunks.is_empty() {
            continue;
        }
        let symbols = if Instant::now() >= deadline {
            tracing::debug!(path = %file.new_path, "Symbol deadline passed, skipping lookup");
            Vec::new()
        } else {
            let lookup = source.symbols(file, options.work_dir.as_deref());
            if let Ok(symbols) = tokio::time::timeout_at(deadline, lookup).await {
                symbols
            } else {
                tracing::debug!(path = %file.new_path, "Symbol lookup hit the deadline");
                Vec::new()
            }
        };
        score_file_diff(file, &symbols);
    }

    let mut ranked: Vec<(usize, &Hunk)> = files
        .iter()
        .enumerate()
        .flat_map(|(index, file)| file.hunks.iter().map(move |hunk| (index, hunk)))
        .collect();
    ranked.sort_by(|a, b| b.1.score.total_cmp(&a.1.score));

    let budget = options.budget();
    let mut used = 0;
    let mut accepted: Vec<(usize, &Hunk)> = Vec::new();
    let mut rejected: Vec<&Hunk> = Vec::new();
    for (index, hunk) in ranked {
        let lines = count_hunk_lines(hunk);
        if used + lines <= budget {
            used += lines;
            accepted.push((index, hunk));
        } else {
            rejected.push(hunk);
        }
    }

    let high_priority = rebuild(&files, &accepted);
    let summary = if options.include_summary {
        summarize(&rejected)
    } else {
        String::new()
    };
    let stats = compute_stats(&files);

    tracing::info!(
        files = stats.total_files,
        accepted = accepted.len(),
        rejected = rejected.len(),
        lines = used,
        budget,
        "Prioritized diff"
    );

    PrioritizedDiff {
        high_priority,
        summary,
        stats,
    }
}

/// The text handed to a prompt: high-priority hunks, then the summary.
#[must_use]
pub fn format_for_prompt(result: &PrioritizedDiff) -> String {
    let mut out = String::with_capacity(result.high_priority.len() + result.summary.len());
    out.push_str(&result.high_priority);
    out.push_str(&result.summary);
    out
}

fn rebuild(files: &[FileDiff], accepted: &[(usize, &Hunk)]) -> String {
    let mut per_file: Vec<Vec<&Hunk>> = vec![Vec::new(); files.len()];
    for &(index, hunk) in accepted {
        per_file[index].push(hunk);
    }

    let mut out = String::new();
    for (file, hunks) in files.iter().zip(&mut per_file) {
        if hunks.is_empty() {
            continue;
        }
        hunks.sort_by_key(|hunk| hunk.new_start);

        let _ = writeln!(out, "diff --git a/{} b/{}", file.old_path, file.new_path);
        if file.is_new {
            out.push_str("new file mode 100644\n");
        }
        if file.is_delete {
            out.push_str("deleted file mode 100644\n");
        }
        if file.is_new {
            out.push_str("--- /dev/null\n");
        } else {
            let _ = writeln!(out, "--- a/{}", file.old_path);
        }
        if file.is_delete {
            out.push_str("+++ /dev/null\n");
        } else {
            let _ = writeln!(out, "+++ b/{}", file.new_path);
        }
        for hunk in hunks.iter() {
            out.push_str(&hunk.content);
        }
    }
    out
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn summarize(rejected: &[&Hunk]) -> String {
    let mut groups: BTreeMap<FileCategory, BTreeMap<&str, usize>> = BTreeMap::new();
    for hunk in rejected {
        *groups
            .entry(categorize_file(&hunk.file_path))
            .or_default()
            .entry(hunk.file_path.as_str())
            .or_default() += count_hunk_lines(hunk);
    }

    let parts: Vec<String> = FileCategory::SUMMARY_ORDER
        .iter()
        .filter_map(|category| {
            let paths = groups.get(category)?;
            let lines: usize = paths.values().sum();
            let mut names: Vec<&str> = paths.keys().map(|path| base_name(path)).collect();
            names.sort_unstable();
            if names.len() > MAX_SUMMARY_NAMES {
                names.truncate(MAX_SUMMARY_NAMES);
                names.push("...");
            }
            Some(format!(
                "{} {category} file(s) ({lines} lines): {}",
                paths.len(),
                names.join(", ")
            ))
        })
        .collect();

    if parts.is_empty() {
        return String::new();
    }
    format!("{SUMMARY_HEADER}{}", parts.join(SUMMARY_SEPARATOR))
}

fn compute_stats(files: &[FileDiff]) -> DiffStats {
    let mut stats = DiffStats::default();
    for file in files {
        let lines = file.hunks.iter().map(count_hunk_lines).sum();
        stats.record(categorize_file(&file.new_path), lines);
    }
    stats
}
