//! Fan-out across shards with a shell stand-in for the filter binary.
#![cfg(unix)]

use std::fs;
use std::path::PathBuf;

use chemsift_ingestion::orchestrator::{FilterCommand, Orchestrator};

/// `sh -c <script> filter-stub <shard> <out> <log>`: writes a marker per
/// shard into the output dir and fails for any shard whose name contains "bad".
const STUB: &str = r#"
case "$1" in
  *bad*) echo "cannot filter $1" >&2; exit 3 ;;
esac
mkdir -p "$2" "$3"
name=$(basename "$1")
echo done > "$2/$name.json"
echo "{\"shard\":\"$name\"}"
"#;

fn stub() -> FilterCommand {
    FilterCommand::new("sh").arg("-c").arg(STUB).arg("filter-stub")
}

fn shards(root: &std::path::Path, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|n| {
            let dir = root.join(n);
            fs::create_dir_all(&dir).unwrap();
            dir
        })
        .collect()
}

#[tokio::test]
async fn test_failing_shard_does_not_cancel_siblings() {
    let tmp = tempfile::tempdir().unwrap();
    let dirs = shards(tmp.path(), &["split_1", "split_2", "split_bad", "split_4"]);
    let out = tmp.path().join("out");
    let logs = tmp.path().join("logs");

    let summary = Orchestrator::new(stub()).run_all(&dirs, &out, &logs).await;

    assert_eq!(summary.results.len(), 4);
    assert_eq!(summary.succeeded(), 3);
    assert_eq!(summary.failed(), 1);
    assert!(!summary.all_succeeded());

    // results come back in shard order regardless of completion order
    let indices: Vec<usize> = summary.results.iter().map(|r| r.shard_index).collect();
    assert_eq!(indices, vec![1, 2, 3, 4]);

    let bad = &summary.results[2];
    assert_eq!(bad.exit_code, Some(3));
    assert!(bad.stderr.contains("cannot filter"));

    for name in ["split_1", "split_2", "split_4"] {
        assert!(out.join(format!("{name}.json")).exists(), "{name} output missing");
    }
    assert!(summary.results[0].stdout.contains("\"shard\":\"split_1\""));

    let report = summary.report();
    assert!(report.contains("FAILED (exit 3)"));
    assert!(report.ends_with("3 succeeded, 1 failed\n"));
}

#[tokio::test]
async fn test_bounded_concurrency_still_runs_every_shard() {
    let tmp = tempfile::tempdir().unwrap();
    let dirs = shards(tmp.path(), &["a", "b", "c", "d", "e"]);
    let out = tmp.path().join("out");
    let logs = tmp.path().join("logs");

    let summary = Orchestrator::new(stub())
        .with_max_concurrency(Some(1))
        .run_all(&dirs, &out, &logs)
        .await;

    assert!(summary.all_succeeded());
    assert_eq!(fs::read_dir(&out).unwrap().count(), 5);
}

#[tokio::test]
async fn test_missing_shard_directory_is_reported_by_the_child() {
    let tmp = tempfile::tempdir().unwrap();
    // the stub does not check the shard exists; a real filter exits non-zero
    let command = FilterCommand::new("sh")
        .arg("-c")
        .arg(r#"[ -d "$1" ] || { echo "no such shard: $1" >&2; exit 1; }"#)
        .arg("filter-stub");
    let dirs = vec![tmp.path().join("does_not_exist")];

    let summary = Orchestrator::new(command)
        .run_all(&dirs, &tmp.path().join("out"), &tmp.path().join("logs"))
        .await;

    assert_eq!(summary.failed(), 1);
    assert!(summary.results[0].stderr.contains("no such shard"));
}
