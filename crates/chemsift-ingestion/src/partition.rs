//! Corpus partitioner.
//!
//! Collects every file below an input directory and moves them into
//! `split_1 .. split_N` under an output directory. Shards are contiguous runs
//! of the walk order; the first `total % N` shards take one extra file, so
//! shard sizes never differ by more than one.
//!
//! Moving is destructive and fail-fast: the first failed move aborts the run,
//! leaving the corpus split between its original location and the shards.
//! The walk is sorted by file name, so the assignment is deterministic for a
//! given tree, but not across runs on a tree that changes in between.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};
use walkdir::{DirEntry, WalkDir};

use crate::error::{IngestionError, Result};

/// Directory name of shard `index` (1-based).
pub fn shard_dir_name(index: usize) -> String {
    format!("split_{index}")
}

/// One shard's planned contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShardAssignment {
    pub index: usize,
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
}

/// The full path -> shard manifest, computed before anything moves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionPlan {
    pub total_files: usize,
    pub shards: Vec<ShardAssignment>,
}

impl PartitionPlan {
    pub fn shard_dirs(&self) -> Vec<PathBuf> {
        self.shards.iter().map(|s| s.dir.clone()).collect()
    }
}

/// Sizes of `num_splits` contiguous shards covering `total` files.
pub fn shard_sizes(total: usize, num_splits: usize) -> Vec<usize> {
    if num_splits == 0 {
        return Vec::new();
    }
    let base = total / num_splits;
    let extra = total % num_splits;
    (0..num_splits)
        .map(|i| base + usize::from(i < extra))
        .collect()
}

/// Assign `files` (in order) to shards under `output_dir`.
pub fn plan_partition(
    files: Vec<PathBuf>,
    output_dir: &Path,
    num_splits: usize,
) -> Result<PartitionPlan> {
    if num_splits == 0 {
        return Err(IngestionError::InvalidInput(
            "num_splits must be at least 1".to_string(),
        ));
    }

    let total_files = files.len();
    let mut remaining = files.into_iter();
    let shards = shard_sizes(total_files, num_splits)
        .into_iter()
        .enumerate()
        .map(|(i, size)| ShardAssignment {
            index: i + 1,
            dir: output_dir.join(shard_dir_name(i + 1)),
            files: remaining.by_ref().take(size).collect(),
        })
        .collect();

    Ok(PartitionPlan { total_files, shards })
}

/// Every file below `input_dir`, sorted walk order. Anything under
/// `exclude` (e.g. an output directory nested in the input) is skipped.
/// Symlinks are not followed; a link that does not point at a directory is
/// collected and later moved as a link.
pub fn collect_files(input_dir: &Path, exclude: Option<&Path>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(input_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| exclude.map_or(true, |ex| entry.path() != ex));

    for entry in walker {
        let entry = entry.map_err(|e| {
            IngestionError::InvalidInput(format!(
                "cannot read {}: {e}",
                input_dir.display()
            ))
        })?;
        if is_corpus_file(&entry) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Regular files and symlinks (including dangling ones) that do not resolve
/// to a directory.
pub(crate) fn is_corpus_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file() || (entry.path_is_symlink() && !entry.path().is_dir())
}

/// Validate inputs and compute the plan without touching any file.
pub fn prepare(input_dir: &Path, output_dir: &Path, num_splits: usize) -> Result<PartitionPlan> {
    if num_splits == 0 {
        return Err(IngestionError::InvalidInput(
            "num_splits must be at least 1".to_string(),
        ));
    }
    if !input_dir.is_dir() {
        return Err(IngestionError::InvalidInput(format!(
            "input directory {} does not exist or is not a directory",
            input_dir.display()
        )));
    }

    // Only exclude the output tree if it already lives inside the input tree.
    let input_abs = fs::canonicalize(input_dir)?;
    let output_abs = fs::canonicalize(output_dir).ok();
    if output_abs.as_ref() == Some(&input_abs) {
        return Err(IngestionError::InvalidInput(
            "output directory must differ from the input directory".to_string(),
        ));
    }
    let exclude = output_abs.filter(|out| out.starts_with(&input_abs));

    let files = collect_files(&input_abs, exclude.as_deref())?;
    info!(files = files.len(), num_splits, "Collected corpus files");
    plan_partition(files, output_dir, num_splits)
}

/// Create the shard directories and move every planned file into its shard.
///
/// `on_move` is called after each successful move with the destination path.
pub fn execute_plan(plan: &PartitionPlan, mut on_move: impl FnMut(&Path)) -> Result<()> {
    for shard in &plan.shards {
        fs::create_dir_all(&shard.dir).map_err(|e| {
            IngestionError::Partition(format!("cannot create {}: {e}", shard.dir.display()))
        })?;
    }

    for shard in &plan.shards {
        for src in &shard.files {
            let dest = move_into(src, &shard.dir)?;
            debug!(src = %src.display(), dest = %dest.display(), "Moved");
            on_move(&dest);
        }
    }
    Ok(())
}

/// Split `input_dir` into `num_splits` shard directories under `output_dir`.
#[instrument(skip_all, fields(input = %input_dir.display(), num_splits = num_splits))]
pub fn partition(input_dir: &Path, output_dir: &Path, num_splits: usize) -> Result<Vec<PathBuf>> {
    let plan = prepare(input_dir, output_dir, num_splits)?;
    execute_plan(&plan, |_| {})?;
    info!(
        files = plan.total_files,
        shards = plan.shards.len(),
        "Partition complete"
    );
    Ok(plan.shard_dirs())
}

/// Move one file into `dest_dir`, keeping its file name. Never overwrites.
fn move_into(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let file_name = src.file_name().ok_or_else(|| {
        IngestionError::Partition(format!("{} has no file name", src.display()))
    })?;
    let dest = dest_dir.join(file_name);
    // symlink_metadata so a dangling link at `dest` still counts as taken
    if fs::symlink_metadata(&dest).is_ok() {
        return Err(IngestionError::Partition(format!(
            "destination path {} already exists (moving {})",
            dest.display(),
            src.display()
        )));
    }

    if let Err(rename_err) = fs::rename(src, &dest) {
        // Cross-device moves: copy, then remove the original.
        fs::copy(src, &dest).map_err(|copy_err| {
            IngestionError::Partition(format!(
                "cannot move {} to {}: {rename_err}; copy fallback failed: {copy_err}",
                src.display(),
                dest.display()
            ))
        })?;
        if let Err(remove_err) = fs::remove_file(src) {
            let _ = fs::remove_file(&dest);
            return Err(IngestionError::Partition(format!(
                "copied {} but could not remove the original: {remove_err}",
                src.display()
            )));
        }
    }
    Ok(dest)
}
