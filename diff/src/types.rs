//! Structured diff model and prioritization results.

use std::fmt;

/// One `@@` block of a unified diff.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hunk {
    /// New-side path of the owning file.
    pub file_path: String,
    pub old_start: u32,
    pub old_count: u32,
    /// 1-indexed first line of the change in the post-change file.
    pub new_start: u32,
    pub new_count: u32,
    /// Raw text, `@@` header included, newline-terminated. Reused verbatim
    /// when the prioritized diff is rebuilt.
    pub content: String,
    pub score: f64,
    /// Names of the symbols whose range overlaps this hunk.
    pub symbols: Vec<String>,
}

impl Hunk {
    /// Inclusive `(first, last)` changed-line range on the new side.
    ///
    /// For a pure deletion (`new_count == 0`) `last` is `first - 1`, which
    /// overlaps nothing that starts at or after `first`.
    #[must_use]
    pub fn new_range(&self) -> (i64, i64) {
        let start = i64::from(self.new_start);
        (start, start + i64::from(self.new_count) - 1)
    }
}

/// Everything a diff says about one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileDiff {
    pub old_path: String,
    pub new_path: String,
    pub hunks: Vec<Hunk>,
    pub is_binary: bool,
    pub is_new: bool,
    pub is_delete: bool,
    pub is_rename: bool,
}

/// Kind of file, judged from its path alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileCategory {
    Source,
    Test,
    Config,
    Doc,
    Generated,
    Unknown,
}

impl FileCategory {
    /// Order in which low-priority categories are summarized.
    pub const SUMMARY_ORDER: [Self; 6] = [
        Self::Test,
        Self::Config,
        Self::Doc,
        Self::Generated,
        Self::Source,
        Self::Unknown,
    ];

    #[must_use]
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Source => 1.0,
            Self::Test => 0.6,
            Self::Config => 0.4,
            Self::Doc => 0.2,
            Self::Generated => 0.1,
            Self::Unknown => 0.5,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Test => "test",
            Self::Config => "config",
            Self::Doc => "doc",
            Self::Generated => "generated",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-category file and changed-line totals across a whole diff.
///
/// Unknown-category files count toward the totals only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub total_files: usize,
    pub total_lines: usize,
    pub source_files: usize,
    pub source_lines: usize,
    pub test_files: usize,
    pub test_lines: usize,
    pub config_files: usize,
    pub config_lines: usize,
    pub doc_files: usize,
    pub doc_lines: usize,
    pub generated_files: usize,
    pub generated_lines: usize,
}

impl DiffStats {
    pub(crate) fn record(&mut self, category: FileCategory, lines: usize) {
        self.total_files += 1;
        self.total_lines += lines;
        let (files, changed) = match category {
            FileCategory::Source => (&mut self.source_files, &mut self.source_lines),
            FileCategory::Test => (&mut self.test_files, &mut self.test_lines),
            FileCategory::Config => (&mut self.config_files, &mut self.config_lines),
            FileCategory::Doc => (&mut self.doc_files, &mut self.doc_lines),
            FileCategory::Generated => (&mut self.generated_files, &mut self.generated_lines),
            FileCategory::Unknown => return,
        };
        *files += 1;
        *changed += lines;
    }
}

impl fmt::Display for DiffStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file(s), {} changed line(s): source {}/{}, test {}/{}, config {}/{}, doc {}/{}, generated {}/{}",
            self.total_files,
            self.total_lines,
            self.source_files,
            self.source_lines,
            self.test_files,
            self.test_lines,
            self.config_files,
            self.config_lines,
            self.doc_files,
            self.doc_lines,
            self.generated_files,
            self.generated_lines,
        )
    }
}

/// Output of one prioritization run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrioritizedDiff {
    /// Rebuilt diff containing only the accepted hunks.
    pub high_priority: String,
    /// Digest of the rejected hunks; empty when nothing was rejected.
    pub summary: String,
    pub stats: DiffStats,
}
