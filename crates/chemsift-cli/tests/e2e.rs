//! Runs the real `chemsift` binary: split a corpus, then filter every shard.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn chemsift(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_chemsift"))
        .args(args)
        .current_dir(cwd)
        .env_remove("CHEMSIFT_CONFIG")
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to launch chemsift")
}

fn article(i: usize, dense: bool) -> String {
    let mention = if dense { "cisplatin nephrotoxicity" } else { "the drug" };
    let filler = vec!["word"; 380].join(" ");
    let mentions = vec![mention; 10].join(" ");
    format!(
        "<article><front><article-title>x</article-title><title>Paper {i}</title>\
         <abstract>An abstract.</abstract></front><body><p>{filler} {mentions}</p></body></article>"
    )
}

fn write_corpus(root: &Path, n: usize) -> PathBuf {
    let input = root.join("corpus");
    for i in 0..n {
        let dir = input.join(format!("batch_{}", i % 5));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("doc_{i:03}.xml")), article(i, i % 2 == 0)).unwrap();
    }
    input
}

fn json_files(dir: &Path) -> usize {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|e| e.path().extension().is_some_and(|x| x == "json"))
                .count()
        })
        .unwrap_or(0)
}

#[test]
fn test_split_then_run_all_with_one_bad_shard() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write_corpus(root, 100);

    let split = chemsift(root, &["split", "corpus", "shards", "--num_splits", "4"]);
    assert!(split.status.success(), "split failed: {}", String::from_utf8_lossy(&split.stderr));

    let stdout = String::from_utf8_lossy(&split.stdout);
    let shard_dirs: Vec<&str> = stdout.lines().collect();
    assert_eq!(shard_dirs.len(), 4);
    for i in 1..=4 {
        let count = fs::read_dir(root.join("shards").join(format!("split_{i}")))
            .unwrap()
            .count();
        assert_eq!(count, 25, "split_{i} should hold 25 files");
    }

    let run = chemsift(
        root,
        &[
            "run_all",
            "shards/split_1",
            "shards/split_2",
            "shards/split_3",
            "shards/split_4",
            "shards/split_missing",
            "--output-dir",
            "out",
            "--error-log-dir",
            "logs",
        ],
    );
    let report = String::from_utf8_lossy(&run.stdout);
    assert_eq!(run.status.code(), Some(1), "report:\n{report}");
    assert!(report.contains("4 succeeded, 1 failed"), "report:\n{report}");
    assert!(report.contains("split_missing"));

    // the even-numbered half is dense
    assert_eq!(json_files(&root.join("out")), 50);
    assert!(root.join("out/doc_000.json").exists());
    assert!(!root.join("out/doc_001.json").exists());

    let doc: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join("out/doc_042.json")).unwrap()).unwrap();
    assert_eq!(doc["title"], "Paper 42");
    assert_eq!(doc["abstract"], "An abstract.");
}

#[test]
fn test_filter_exit_codes() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let shard = root.join("split_1");
    fs::create_dir_all(&shard).unwrap();
    fs::write(shard.join("good.xml"), article(1, true)).unwrap();
    fs::write(shard.join("broken.xml"), "<article><title>").unwrap();

    let ok = chemsift(root, &["filter", "split_1", "out", "logs"]);
    assert!(ok.status.success(), "{}", String::from_utf8_lossy(&ok.stderr));

    let summary: serde_json::Value =
        serde_json::from_str(String::from_utf8_lossy(&ok.stdout).trim()).unwrap();
    assert_eq!(summary["retained"], 1);
    assert_eq!(summary["errors"], 1);
    assert_eq!(fs::read_dir(root.join("logs")).unwrap().count(), 1);

    let missing = chemsift(root, &["filter", "nope", "out", "logs"]);
    assert_eq!(missing.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&missing.stderr).contains("Error:"));
}

#[test]
fn test_split_rejects_missing_input_and_dry_run_moves_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();

    let missing = chemsift(root, &["split", "nowhere", "shards"]);
    assert!(!missing.status.success());

    write_corpus(root, 10);
    let dry = chemsift(root, &["split", "corpus", "shards", "--num_splits", "4", "--dry-run"]);
    assert!(dry.status.success());
    let plan: serde_json::Value = serde_json::from_slice(&dry.stdout).unwrap();
    assert_eq!(plan["total_files"], 10);
    let sizes: Vec<usize> = plan["shards"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["files"].as_array().unwrap().len())
        .collect();
    assert_eq!(sizes, vec![3, 3, 2, 2]);
    assert!(!root.join("shards").exists());
}
