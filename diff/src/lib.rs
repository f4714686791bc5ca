//! Symbol-aware diff prioritization.
//!
//! A unified diff is parsed into files and hunks, each hunk is scored from
//! the symbols it touches and the kind of file it lives in, and the best
//! hunks are kept under a changed-line budget. Everything else is reduced
//! to a one-line-per-category summary.

mod parser;
mod prioritize;
mod scorer;
mod symbols;
mod types;

pub use parser::{count_hunk_lines, count_lines, parse};
pub use prioritize::{
    DEFAULT_LSP_TIMEOUT, DEFAULT_MAX_HIGH_PRIORITY_LINES, Options, format_for_prompt, prioritize,
    prioritize_with,
};
pub use scorer::{
    BONUS_EXPORTED, MAX_SIZE_BONUS, WEIGHT_DEFAULT, categorize_file, is_exported, overlaps,
    score_file_diff, score_hunk, symbol_weight,
};
pub use symbols::{LspSymbols, NoSymbols, SymbolSource};
pub use types::{DiffStats, FileCategory, FileDiff, Hunk, PrioritizedDiff};
