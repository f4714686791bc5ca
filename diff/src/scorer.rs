//! Hunk importance scoring.
//!
//! `score = (symbol contribution + size bonus) × category multiplier`, where
//! the symbol contribution is the heaviest symbol the hunk touches.

use hunkrank_lsp::{DocumentSymbol, SymbolKind};

use crate::parser::count_hunk_lines;
use crate::types::{FileCategory, FileDiff, Hunk};

/// Contribution of a hunk that touches no known symbol.
pub const WEIGHT_DEFAULT: f64 = 20.0;
pub const BONUS_EXPORTED: f64 = 50.0;
pub const MAX_SIZE_BONUS: f64 = 50.0;
const SIZE_BONUS_PER_LINE: f64 = 0.1;

const GENERATED_SUFFIXES: [&str; 4] = ["_gen.go", ".gen.go", ".generated.go", ".pb.go"];
const TEST_SUFFIXES: [&str; 5] = ["_test.go", ".test.ts", ".test.js", ".spec.ts", ".spec.js"];
const TEST_DIRS: [&str; 3] = ["test", "tests", "__tests__"];
const DOC_EXTENSIONS: [&str; 3] = [".md", ".txt", ".rst"];
const DOC_NAMES: [&str; 3] = ["README", "CHANGELOG", "LICENSE"];
const CONFIG_EXTENSIONS: [&str; 6] = [".json", ".yaml", ".yml", ".toml", ".xml", ".ini"];
const SOURCE_EXTENSIONS: [&str; 22] = [
    ".go", ".py", ".rs", ".ts", ".tsx", ".js", ".jsx", ".cs", ".java", ".rb", ".php", ".swift",
    ".kt", ".scala", ".c", ".cpp", ".h", ".hpp", ".lua", ".nix", ".zig", ".odin",
];

#[must_use]
pub fn symbol_weight(kind: SymbolKind) -> f64 {
    match kind {
        SymbolKind::Function | SymbolKind::Method => 100.0,
        SymbolKind::Class | SymbolKind::Struct | SymbolKind::Interface => 90.0,
        SymbolKind::Constructor => 85.0,
        SymbolKind::Enum => 80.0,
        SymbolKind::Property | SymbolKind::Field => 50.0,
        SymbolKind::Variable | SymbolKind::Constant => 40.0,
        SymbolKind::Module | SymbolKind::Package => 30.0,
        SymbolKind::File
        | SymbolKind::Namespace
        | SymbolKind::String
        | SymbolKind::Number
        | SymbolKind::Boolean
        | SymbolKind::Array
        | SymbolKind::Object
        | SymbolKind::Key
        | SymbolKind::Null
        | SymbolKind::EnumMember
        | SymbolKind::Event
        | SymbolKind::Operator
        | SymbolKind::TypeParameter
        | SymbolKind::Unknown => WEIGHT_DEFAULT,
    }
}

/// First character is uppercase. Applied the same way to every language.
#[must_use]
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Inclusive interval intersection.
#[must_use]
pub fn overlaps(start1: i64, end1: i64, start2: i64, end2: i64) -> bool {
    start1 <= end2 && end1 >= start2
}

/// `(directory, base name, extension)`; the extension keeps its dot and, like
/// a dotfile's, may be the whole base name.
fn split_path(path: &str) -> (&str, &str, &str) {
    let (dir, base) = path.rsplit_once('/').unwrap_or(("", path));
    let ext = base.rfind('.').map_or("", |i| &base[i..]);
    (dir, base, ext)
}

fn has_dir_segment(dir: &str, names: &[&str]) -> bool {
    dir.split('/').any(|segment| names.contains(&segment))
}

/// Classify a diff path. Checks run in a fixed precedence: generated, test,
/// doc, config, source, and finally unknown.
#[must_use]
pub fn categorize_file(path: &str) -> FileCategory {
    let (dir, base, ext) = split_path(path);

    if has_dir_segment(dir, &["vendor", "node_modules"])
        || GENERATED_SUFFIXES.iter().any(|s| base.ends_with(s))
    {
        return FileCategory::Generated;
    }

    if TEST_SUFFIXES.iter().any(|s| base.ends_with(s))
        || base.starts_with("test_")
        || has_dir_segment(dir, &TEST_DIRS)
    {
        return FileCategory::Test;
    }

    if DOC_EXTENSIONS.contains(&ext) || DOC_NAMES.contains(&base) {
        return FileCategory::Doc;
    }

    if CONFIG_EXTENSIONS.contains(&ext) || base.starts_with('.') {
        return FileCategory::Config;
    }

    if SOURCE_EXTENSIONS.contains(&ext) {
        return FileCategory::Source;
    }

    FileCategory::Unknown
}

/// Score `hunk` against its file's symbol outline, recording the
/// overlapping symbol names on the hunk. Returns the new score.
pub fn score_hunk(hunk: &mut Hunk, symbols: &[DocumentSymbol]) -> f64 {
    let multiplier = categorize_file(&hunk.file_path).multiplier();
    let size_bonus = (count_hunk_lines(hunk) as f64 * SIZE_BONUS_PER_LINE).min(MAX_SIZE_BONUS);

    let (hunk_start, hunk_end) = hunk.new_range();
    let mut strongest: Option<f64> = None;
    let mut touched = Vec::new();

    for sym in symbols {
        if !overlaps(
            hunk_start,
            hunk_end,
            i64::from(sym.line),
            i64::from(sym.end_line),
        ) {
            continue;
        }
        let mut weight = symbol_weight(sym.kind);
        if is_exported(&sym.name) {
            weight += BONUS_EXPORTED;
        }
        strongest = Some(strongest.map_or(weight, |w| w.max(weight)));
        touched.push(sym.name.clone());
    }

    hunk.symbols = touched;
    hunk.score = (strongest.unwrap_or(WEIGHT_DEFAULT) + size_bonus) * multiplier;
    hunk.score
}

pub fn score_file_diff(file: &mut FileDiff, symbols: &[DocumentSymbol]) {
    for hunk in &mut file.hunks {
        score_hunk(hunk, symbols);
    }
}
