//! The `hunkrank` binary, driven as a subprocess.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use crate::common::{modified, write_file};

/// Run the binary with `args`, feeding `stdin`, isolated from any user config.
fn run(home: &Path, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_hunkrank"))
        .args(args)
        .env("HUNKRANK_CONFIG", home.join("absent.toml"))
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    // The binary may exit without reading stdin at all.
    let _ = child.stdin.take().unwrap().write_all(stdin.as_bytes());
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).unwrap()
}

#[test]
fn prints_prompt_for_stdin_diff() {
    let home = tempfile::tempdir().unwrap();
    let raw = format!("{}{}", modified("app/main.go", 1, 3), modified("app/main_test.go", 1, 40));

    let output = run(home.path(), &["--no-lsp", "--max-lines", "10"], &raw);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let prompt = stdout(&output);
    assert!(prompt.starts_with("diff --git a/app/main.go b/app/main.go\n"));
    assert!(prompt.ends_with("\n[Also modified]\n- 1 test file(s) (40 lines): main_test.go"));
    assert!(stderr(&output).is_empty());
}

#[test]
fn reads_diff_from_file_argument() {
    let home = tempfile::tempdir().unwrap();
    let diff_path = home.path().join("change.diff");
    std::fs::write(&diff_path, modified("lib/util.py", 5, 2)).unwrap();

    let output = run(
        home.path(),
        &["--no-lsp", diff_path.to_str().unwrap()],
        "ignored stdin",
    );
    assert!(output.status.success());
    assert!(stdout(&output).contains("+++ b/lib/util.py\n"));
}

#[test]
fn non_diff_input_passes_through() {
    let home = tempfile::tempdir().unwrap();
    let output = run(home.path(), &["--no-lsp"], "nothing to rank\n");
    assert!(output.status.success());
    assert_eq!(stdout(&output), "nothing to rank\n");
}

#[test]
fn stats_go_to_stderr() {
    let home = tempfile::tempdir().unwrap();
    let raw = format!("{}{}", modified("src/lib.rs", 1, 4), modified("README.md", 1, 2));

    let output = run(home.path(), &["--no-lsp", "--stats"], &raw);
    assert!(output.status.success());
    assert!(!stdout(&output).contains("file(s), "));
    let stats = stderr(&output);
    assert!(
        stats.contains("2 file(s), 6 changed line(s): source 1/4, test 0/0, config 0/0, doc 1/2, generated 0/0"),
        "stderr: {stats}"
    );
}

#[test]
fn no_summary_flag_drops_the_digest() {
    let home = tempfile::tempdir().unwrap();
    let raw = format!("{}{}", modified("a.rs", 1, 5), modified("b.rs", 1, 5));

    let output = run(home.path(), &["--no-lsp", "--max-lines", "5", "--no-summary"], &raw);
    assert!(output.status.success());
    let prompt = stdout(&output);
    assert!(!prompt.contains("[Also modified]"));
    assert!(prompt.contains("+++ b/a.rs\n"));
    assert!(!prompt.contains("+++ b/b.rs\n"));
}

#[test]
fn config_file_sets_the_budget_and_flags_override_it() {
    let home = tempfile::tempdir().unwrap();
    write_file(
        home.path(),
        "hunkrank.toml",
        "[prioritize]\nmax_high_priority_lines = 3\n\n[lsp]\nenabled = false\n",
    );
    let config = home.path().join("hunkrank.toml");
    let config = config.to_str().unwrap();
    let raw = format!("{}{}", modified("x.go", 1, 3), modified("y.go", 1, 3));

    let output = run(home.path(), &["--config", config], &raw);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("1 source file(s) (3 lines): y.go"));

    let output = run(home.path(), &["--config", config, "--max-lines", "6"], &raw);
    assert!(output.status.success());
    assert!(!stdout(&output).contains("[Also modified]"));
}

#[test]
fn broken_explicit_config_fails() {
    let home = tempfile::tempdir().unwrap();
    write_file(home.path(), "bad.toml", "[prioritize\n");
    let config = home.path().join("bad.toml");

    let output = run(
        home.path(),
        &["--no-lsp", "--config", config.to_str().unwrap()],
        "",
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("bad.toml"));
}

#[test]
fn missing_diff_file_fails() {
    let home = tempfile::tempdir().unwrap();
    let missing = home.path().join("nope.diff");

    let output = run(home.path(), &["--no-lsp", missing.to_str().unwrap()], "");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("nope.diff"));
}
