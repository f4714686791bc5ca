//! End-to-end prioritization through the public API, without language servers.

use hunkrank_diff::{
    FileCategory, NoSymbols, Options, categorize_file, count_lines, format_for_prompt, overlaps,
    parse, prioritize_with,
};

use crate::common::{created, modified};

fn budget(lines: usize) -> Options {
    Options {
        max_high_priority_lines: lines,
        ..Options::default()
    }
}

#[tokio::test]
async fn empty_diff_produces_nothing() {
    let result = prioritize_with("", &Options::default(), &NoSymbols).await;
    assert_eq!(result.high_priority, "");
    assert_eq!(result.summary, "");
    assert_eq!(format_for_prompt(&result), "");
}

#[tokio::test]
async fn single_json_hunk_is_accepted_without_summary() {
    let raw = modified("settings/app.json", 4, 3);
    let result = prioritize_with(&raw, &Options::default(), &NoSymbols).await;

    assert!(result.high_priority.contains("+++ b/settings/app.json\n"));
    assert_eq!(count_lines(&result.high_priority), 3);
    assert!(result.summary.is_empty());
    assert_eq!(result.stats.config_files, 1);
    assert_eq!(result.stats.total_lines, 3);
}

#[tokio::test]
async fn oversized_test_hunk_is_summarized_and_source_kept() {
    let raw = format!(
        "{}{}",
        modified("internal/handler_test.go", 1, 450),
        modified("internal/handler.go", 20, 50)
    );
    let result = prioritize_with(&raw, &budget(400), &NoSymbols).await;

    assert!(result.high_priority.contains("diff --git a/internal/handler.go b/internal/handler.go"));
    assert!(!result.high_priority.contains("handler_test.go"));
    assert_eq!(count_lines(&result.high_priority), 50);
    assert!(
        result
            .summary
            .contains("1 test file(s) (450 lines): handler_test.go"),
        "summary was {:?}",
        result.summary
    );
    assert_eq!(result.stats.test_lines, 450);
    assert_eq!(result.stats.source_lines, 50);
}

#[tokio::test]
async fn every_hunk_is_kept_or_summarized() {
    let paths = [
        "src/engine.rs",
        "src/engine_test.go",
        "docs/guide.md",
        "Cargo.toml",
        "api/service.pb.go",
        "assets/logo.svg",
        "lib/parser.py",
    ];
    let raw: String = paths
        .iter()
        .enumerate()
        .map(|(i, path)| modified(path, 1, 5 + i * 3))
        .collect();
    let result = prioritize_with(&raw, &budget(30), &NoSymbols).await;
    let prompt = format_for_prompt(&result);

    for path in paths {
        let kept = result.high_priority.contains(&format!("+++ b/{path}\n"));
        let name = path.rsplit('/').next().unwrap();
        let summarized = result.summary.contains(name);
        assert!(kept ^ summarized, "{path}: kept={kept} summarized={summarized}");
    }
    assert!(count_lines(&result.high_priority) <= 30);
    assert!(prompt.starts_with(&result.high_priority));
}

#[tokio::test]
async fn rebuilt_diff_drops_index_lines_but_keeps_markers() {
    let raw = format!("{}{}", created("cmd/new.go", 2), modified("cmd/old.go", 7, 1));
    let result = prioritize_with(&raw, &Options::default(), &NoSymbols).await;

    assert_eq!(
        result.high_priority,
        "\
diff --git a/cmd/new.go b/cmd/new.go
new file mode 100644
--- /dev/null
+++ b/cmd/new.go
@@ -0,0 +1,2 @@
+added 0
+added 1
diff --git a/cmd/old.go b/cmd/old.go
--- a/cmd/old.go
+++ b/cmd/old.go
@@ -7,0 +7,1 @@
+added 0
"
    );
}

#[tokio::test]
async fn repeated_runs_are_identical() {
    let raw: String = (0..20)
        .map(|i| modified(&format!("pkg/mod{i:02}.go"), 1, 1 + i % 7))
        .collect();
    let first = prioritize_with(&raw, &budget(25), &NoSymbols).await;
    for _ in 0..3 {
        assert_eq!(prioritize_with(&raw, &budget(25), &NoSymbols).await, first);
    }
}

#[test]
fn header_count_matches_file_count() {
    for n in [0, 1, 2, 7] {
        let raw: String = (0..n).map(|i| modified(&format!("f{i}.rs"), 1, 1)).collect();
        assert_eq!(parse(&raw).len(), n);
    }
}

#[test]
fn categorization_examples() {
    assert_eq!(categorize_file("x_test.go"), FileCategory::Test);
    assert_eq!(categorize_file("x.pb.go"), FileCategory::Generated);
    assert_eq!(categorize_file("README.md"), FileCategory::Doc);
    assert_eq!(categorize_file("services/api/main.go"), FileCategory::Source);
}

#[test]
fn overlap_examples() {
    assert!(overlaps(1, 5, 5, 10));
    assert!(!overlaps(1, 5, 10, 15));
}
