//! Per-run error log.
//!
//! Each filter invocation owns exactly one log file, named
//! `stderr_<YYYYmmddHHMMSS>_<shard>_<pid>.log`, so concurrent filters never
//! share a file. The file is created up front (an unwritable log directory
//! is a setup failure) and every record is flushed as its own line.

use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::models::ErrorRecord;

pub struct ErrorLog {
    path: PathBuf,
    writer: LineWriter<File>,
    written: usize,
}

impl ErrorLog {
    /// Create a fresh log file for one run over `shard_tag`.
    pub fn create(dir: &Path, shard_tag: &str) -> std::io::Result<Self> {
        let file_name = format!(
            "stderr_{}_{}_{}.log",
            Local::now().format("%Y%m%d%H%M%S"),
            sanitize_tag(shard_tag),
            std::process::id()
        );
        let path = dir.join(file_name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: LineWriter::new(file),
            written: 0,
        })
    }

    pub fn append(&mut self, record: &ErrorRecord) -> std::io::Result<()> {
        writeln!(self.writer, "{}", record.to_log_line())?;
        self.written += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records_written(&self) -> usize {
        self.written
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

fn sanitize_tag(tag: &str) -> String {
    let cleaned: String = tag
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "shard".to_string()
    } else {
        cleaned
    }
}
