//! Unified diff → [`FileDiff`] parser.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{FileDiff, Hunk};

static DIFF_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^diff --git a/(.+) b/(.+)$").expect("valid regex"));
static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").expect("valid regex")
});
static BINARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Binary files .+ differ$").expect("valid regex"));

#[derive(Default)]
struct ParseState {
    files: Vec<FileDiff>,
    file: Option<FileDiff>,
    hunk: Option<Hunk>,
}

impl ParseState {
    fn flush_hunk(&mut self) {
        if let Some(hunk) = self.hunk.take()
            && let Some(file) = self.file.as_mut()
        {
            file.hunks.push(hunk);
        }
    }

    fn flush_file(&mut self) {
        self.flush_hunk();
        if let Some(file) = self.file.take() {
            self.files.push(file);
        }
    }
}

/// Parse `text` into one [`FileDiff`] per `diff --git` header.
///
/// Never fails: lines that fit no pattern are either hunk content or
/// ignored. Input without any header yields an empty list.
#[must_use]
pub fn parse(text: &str) -> Vec<FileDiff> {
    let mut state = ParseState::default();

    for raw in text.split_inclusive('\n') {
        let line = raw.trim_end_matches('\n').trim_end_matches('\r');

        if let Some(caps) = DIFF_HEADER.captures(line) {
            state.flush_file();
            state.file = Some(FileDiff {
                old_path: caps[1].to_string(),
                new_path: caps[2].to_string(),
                ..FileDiff::default()
            });
            continue;
        }

        let Some(file) = state.file.as_mut() else {
            continue;
        };

        if BINARY.is_match(line) {
            file.is_binary = true;
            continue;
        }
        if line.starts_with("new file mode") {
            file.is_new = true;
            continue;
        }
        if line.starts_with("deleted file mode") {
            file.is_delete = true;
            continue;
        }
        if line.starts_with("rename from ") || line.starts_with("rename to ") {
            file.is_rename = true;
            continue;
        }

        if let Some(caps) = HUNK_HEADER.captures(line) {
            let number = |i: usize, default: u32| {
                caps.get(i)
                    .and_then(|m| m.as_str().parse().ok())
                    .unwrap_or(default)
            };
            let hunk = Hunk {
                file_path: file.new_path.clone(),
                old_start: number(1, 1),
                old_count: number(2, 1),
                new_start: number(3, 1),
                new_count: number(4, 1),
                content: String::new(),
                score: 0.0,
                symbols: Vec::new(),
            };
            state.flush_hunk();
            state.hunk = Some(hunk);
        }

        if let Some(hunk) = state.hunk.as_mut() {
            hunk.content.push_str(raw);
            if !raw.ends_with('\n') {
                hunk.content.push('\n');
            }
        }
    }

    state.flush_file();
    state.files
}

fn is_changed_line(line: &str) -> bool {
    (line.starts_with('+') && !line.starts_with("+++"))
        || (line.starts_with('-') && !line.starts_with("---"))
}

/// Count added and removed lines in arbitrary diff text.
#[must_use]
pub fn count_lines(text: &str) -> usize {
    text.lines().filter(|line| is_changed_line(line)).count()
}

/// Count added and removed lines in one hunk.
#[must_use]
pub fn count_hunk_lines(hunk: &Hunk) -> usize {
    count_lines(&hunk.content)
}
