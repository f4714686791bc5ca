//! Symbol sources plugged into the prioritizer.

use std::path::Path;
use std::time::Duration;

use hunkrank_diff::{
    FileDiff, LspSymbols, NoSymbols, Options, SymbolSource, WEIGHT_DEFAULT, parse, prioritize_with,
    score_file_diff,
};
use hunkrank_lsp::{DocumentSymbol, Language, LanguageRegistry, SymbolKind};

use crate::common::{modified, write_file};

/// Treats every `fn NAME` line of the file on disk as a one-line function.
struct FnLines;

impl SymbolSource for FnLines {
    async fn symbols(&self, file: &FileDiff, work_dir: Option<&Path>) -> Vec<DocumentSymbol> {
        let Some(dir) = work_dir else {
            return Vec::new();
        };
        let Ok(text) = tokio::fs::read_to_string(dir.join(&file.new_path)).await else {
            return Vec::new();
        };
        text.lines()
            .enumerate()
            .filter_map(|(i, line)| {
                let name = line.strip_prefix("fn ")?.split('(').next()?;
                let line = u32::try_from(i).ok()?;
                Some(DocumentSymbol::new(name, SymbolKind::Function, line, line + 2))
            })
            .collect()
    }
}

#[tokio::test]
async fn symbols_from_the_work_dir_steer_ranking() {
    let repo = tempfile::tempdir().unwrap();
    write_file(repo.path(), "src/a.rs", "// filler\n\n\n\n\n\n\n\n\nfn Exported() {}\n");
    write_file(repo.path(), "src/b.rs", "fn first() {}\n");

    // a.rs's hunk lands on `Exported`; b.rs's hunk at line 40 touches nothing.
    let raw = format!("{}{}", modified("src/b.rs", 40, 4), modified("src/a.rs", 10, 4));
    let options = Options {
        max_high_priority_lines: 4,
        work_dir: Some(repo.path().to_path_buf()),
        ..Options::default()
    };

    let result = prioritize_with(&raw, &options, &FnLines).await;
    assert!(result.high_priority.contains("+++ b/src/a.rs"));
    assert!(result.summary.contains("1 source file(s) (4 lines): b.rs"));

    let plain = prioritize_with(&raw, &options, &NoSymbols).await;
    assert!(plain.high_priority.contains("+++ b/src/b.rs"));
}

#[tokio::test]
async fn unavailable_server_falls_back_to_default_scores() {
    let repo = tempfile::tempdir().unwrap();
    write_file(repo.path(), "main.zz", "fn main() {}\n");

    let registry = LanguageRegistry::with_overrides([Language {
        name: "zz".to_string(),
        extensions: vec![".zz".to_string()],
        command: "hunkrank-no-such-language-server".to_string(),
        args: Vec::new(),
    }]);
    let raw = modified("main.zz", 1, 2);
    let options = Options {
        work_dir: Some(repo.path().to_path_buf()),
        lsp_timeout: Duration::from_secs(2),
        ..Options::default()
    };

    let with_lsp = prioritize_with(&raw, &options, &LspSymbols::new(registry)).await;
    let without = prioritize_with(&raw, &options, &NoSymbols).await;
    assert_eq!(with_lsp, without);
}

#[tokio::test]
async fn missing_file_on_disk_is_not_an_error() {
    let repo = tempfile::tempdir().unwrap();
    let raw = modified("gone/away.go", 3, 1);
    let options = Options {
        work_dir: Some(repo.path().to_path_buf()),
        ..Options::default()
    };

    let result = prioritize_with(&raw, &options, &LspSymbols::default()).await;
    assert!(result.high_priority.contains("+++ b/gone/away.go"));
    assert!(result.summary.is_empty());
}

#[cfg(unix)]
fn frame(body: &str) -> String {
    format!("Content-Length: {}\r\n\r\n{body}", body.len())
}

/// A `/bin/sh` "language server" that replays canned responses for ids 1-3
/// (initialize, documentSymbol, shutdown) and logs everything it receives.
#[cfg(unix)]
fn scripted_server(dir: &Path) -> (Language, std::path::PathBuf) {
    let replies = [
        r#"{"jsonrpc":"2.0","id":1,"result":{"capabilities":{"documentSymbolProvider":true}}}"#,
        r#"{"jsonrpc":"2.0","id":2,"result":[{"name":"Serve","kind":12,"range":{"start":{"line":0,"character":0},"end":{"line":20,"character":1}},"selectionRange":{"start":{"line":0,"character":5},"end":{"line":0,"character":10}},"children":[]}]}"#,
        r#"{"jsonrpc":"2.0","id":3,"result":null}"#,
    ];
    let replies_path = dir.join("replies.bin");
    std::fs::write(&replies_path, replies.iter().map(|r| frame(r)).collect::<String>()).unwrap();

    let log = dir.join("received.log");
    let script = dir.join("server.sh");
    std::fs::write(
        &script,
        format!(
            "cat '{}'\nexec cat > '{}'\n",
            replies_path.display(),
            log.display()
        ),
    )
    .unwrap();

    let language = Language {
        name: "fake".to_string(),
        extensions: vec![".fake".to_string()],
        command: "/bin/sh".to_string(),
        args: vec![script.display().to_string()],
    };
    (language, log)
}

#[cfg(unix)]
#[tokio::test]
async fn spawned_server_outline_reaches_the_hunks() {
    let repo = tempfile::tempdir().unwrap();
    let server_dir = tempfile::tempdir().unwrap();
    write_file(repo.path(), "src/server.fake", "serve\n");
    let (language, log) = scripted_server(server_dir.path());
    let source = LspSymbols::new(LanguageRegistry::with_overrides([language]));

    let raw = format!("{}{}", modified("notes/plain.c", 1, 3), modified("src/server.fake", 5, 3));
    let options = Options {
        max_high_priority_lines: 3,
        work_dir: Some(repo.path().to_path_buf()),
        ..Options::default()
    };

    let mut files = parse(&raw);
    let symbols = source.symbols(&files[1], options.work_dir.as_deref()).await;
    assert_eq!(symbols, [DocumentSymbol::new("Serve", SymbolKind::Function, 0, 20)]);
    score_file_diff(&mut files[1], &symbols);
    let hunk = &files[1].hunks[0];
    assert_eq!(hunk.symbols, ["Serve"]);
    let mut plain = files[1].clone();
    score_file_diff(&mut plain, &[]);
    assert!(hunk.score > plain.hunks[0].score);
    assert!(plain.hunks[0].score < WEIGHT_DEFAULT + 1.0);

    // Request order and the workspace root the server saw.
    let received = std::fs::read_to_string(&log).unwrap();
    let order: Vec<usize> = [
        "\"initialize\"",
        "\"initialized\"",
        "textDocument/didOpen",
        "textDocument/documentSymbol",
        "textDocument/didClose",
        "\"shutdown\"",
        "\"exit\"",
    ]
    .iter()
    .map(|method| received.find(method).unwrap_or_else(|| panic!("{method} never sent")))
    .collect();
    assert!(order.is_sorted(), "out of order: {order:?}");
    let root = hunkrank_lsp::file_uri(&repo.path().join("src")).unwrap();
    assert!(received.contains(&format!("\"rootUri\":\"{root}\"")));

    // The same outline decides the budget in a full run.
    let ranked = prioritize_with(&raw, &options, &source).await;
    assert!(ranked.high_priority.contains("+++ b/src/server.fake\n"));
    assert!(ranked.summary.contains("plain.c"));

    let unranked = prioritize_with(&raw, &options, &NoSymbols).await;
    assert!(unranked.high_priority.contains("+++ b/notes/plain.c\n"));
}
