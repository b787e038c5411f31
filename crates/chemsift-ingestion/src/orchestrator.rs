//! Shard orchestrator.
//!
//! Launches one filter process per shard, waits for all of them and reports
//! each outcome independently. A failing shard never cancels its siblings and
//! nothing is retried. Fan-out is optionally bounded by a semaphore.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

/// How to invoke the filter for one shard:
/// `<program> <leading_args...> <shard_dir> <output_dir> <error_log_dir>`.
#[derive(Debug, Clone)]
pub struct FilterCommand {
    program: PathBuf,
    leading_args: Vec<OsString>,
}

impl FilterCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Re-invoke the running binary's `filter` subcommand.
    pub fn current_exe() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?).arg("filter"))
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.leading_args.push(arg.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn build(&self, shard_dir: &Path, output_dir: &Path, error_log_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .arg(shard_dir)
            .arg(output_dir)
            .arg(error_log_dir)
            .stdin(Stdio::null());
        cmd
    }
}

/// Outcome of one shard's filter process.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    /// 1-based position in the shard list.
    pub shard_index: usize,
    pub shard_dir: PathBuf,
    /// `None` if the process could not start or was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl RunResult {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }

    fn failed_to_run(shard_index: usize, shard_dir: PathBuf, message: String) -> Self {
        Self {
            shard_index,
            shard_dir,
            exit_code: None,
            stdout: String::new(),
            stderr: message,
            duration_ms: 0,
        }
    }
}

/// All shard outcomes, in shard order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub results: Vec<RunResult>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    /// One pass/fail line per shard plus a totals line.
    pub fn report(&self) -> String {
        let mut out = String::new();
        for r in &self.results {
            let status = match r.exit_code {
                Some(0) => "ok".to_string(),
                Some(code) => format!("FAILED (exit {code})"),
                None => "FAILED (no exit code)".to_string(),
            };
            out.push_str(&format!(
                "shard {:>3}  {:<24} {}\n",
                r.shard_index,
                r.shard_dir.display(),
                status
            ));
        }
        out.push_str(&format!(
            "{} succeeded, {} failed\n",
            self.succeeded(),
            self.failed()
        ));
        out
    }
}

/// Runs one filter process per shard.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    command: FilterCommand,
    /// `None` or `Some(0)`: one concurrent process per shard.
    max_concurrency: Option<usize>,
}

impl Orchestrator {
    pub fn new(command: FilterCommand) -> Self {
        Self {
            command,
            max_concurrency: None,
        }
    }

    pub fn with_max_concurrency(mut self, limit: Option<usize>) -> Self {
        self.max_concurrency = limit;
        self
    }

    fn permits(&self, shards: usize) -> usize {
        match self.max_concurrency {
            Some(n) if n > 0 => n,
            _ => shards,
        }
        .max(1)
    }

    /// Launch every shard, wait for all, and collect their results.
    #[instrument(skip_all, fields(shards = shard_dirs.len()))]
    pub async fn run_all(
        &self,
        shard_dirs: &[PathBuf],
        output_dir: &Path,
        error_log_dir: &Path,
    ) -> RunSummary {
        let semaphore = Arc::new(Semaphore::new(self.permits(shard_dirs.len())));
        info!(
            program = %self.command.program().display(),
            concurrency = self.permits(shard_dirs.len()),
            "Launching shard filters"
        );

        let mut handles = Vec::with_capacity(shard_dirs.len());
        for (i, shard_dir) in shard_dirs.iter().enumerate() {
            let shard_index = i + 1;
            let semaphore = Arc::clone(&semaphore);
            let cmd = self
                .command
                .build(shard_dir, output_dir, error_log_dir);
            let dir = shard_dir.clone();
            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return RunResult::failed_to_run(shard_index, dir, e.to_string()),
                };
                run_one(cmd, shard_index, dir).await
            });
            handles.push((shard_index, shard_dir.clone(), handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (shard_index, shard_dir, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => RunResult::failed_to_run(
                    shard_index,
                    shard_dir,
                    format!("shard task aborted: {e}"),
                ),
            };
            results.push(result);
        }

        let summary = RunSummary { results };
        info!(
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            "All shard filters finished"
        );
        summary
    }
}

async fn run_one(mut cmd: Command, shard_index: usize, shard_dir: PathBuf) -> RunResult {
    let t0 = Instant::now();
    info!(shard_index, shard = %shard_dir.display(), "Shard filter started");

    let output = match cmd.output().await {
        Ok(output) => output,
        Err(e) => {
            warn!(shard_index, "Could not launch filter: {e}");
            return RunResult::failed_to_run(
                shard_index,
                shard_dir,
                format!("failed to launch filter: {e}"),
            );
        }
    };

    let result = RunResult {
        shard_index,
        shard_dir,
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        duration_ms: t0.elapsed().as_millis() as u64,
    };
    if result.succeeded() {
        info!(shard_index, duration_ms = result.duration_ms, "Shard filter succeeded");
    } else {
        warn!(shard_index, exit_code = ?result.exit_code, "Shard filter failed");
    }
    result
}
