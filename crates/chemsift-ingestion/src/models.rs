//! Data models for the shard-and-filter pipeline.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A parsed article. Field order is the JSON key order on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub body: String,
}

/// Outcome of scoring one document against the density threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDecision {
    pub document: Document,
    pub word_count: usize,
    /// Raw count of entities in the retained categories.
    pub entity_count: usize,
    pub threshold: f64,
    /// `min(entity_count, threshold)`
    pub score: f64,
    pub keep: bool,
}

/// Category of a recoverable per-file failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ParseError,
    ReadError,
    EncodingError,
    Oversized,
    WriteError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ParseError    => "ParseError",
            ErrorKind::ReadError     => "ReadError",
            ErrorKind::EncodingError => "EncodingError",
            ErrorKind::Oversized     => "Oversized",
            ErrorKind::WriteError    => "WriteError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A per-file failure before it is stamped and logged.
#[derive(Debug, Clone, PartialEq)]
pub struct FileError {
    pub kind: ErrorKind,
    pub message: String,
}

impl FileError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// One line of a shard error log.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub source_path: PathBuf,
    pub kind: ErrorKind,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

impl ErrorRecord {
    pub fn new(source_path: impl Into<PathBuf>, error: FileError) -> Self {
        Self {
            source_path: source_path.into(),
            kind: error.kind,
            message: error.message,
            timestamp: Local::now(),
        }
    }

    /// `<timestamp> ERROR:<kind> in file <path>: <message>`
    pub fn to_log_line(&self) -> String {
        format!(
            "{} ERROR:{} in file {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S,%3f"),
            self.kind,
            self.source_path.display(),
            self.message.replace('\n', " "),
        )
    }
}

/// What happened to a single shard file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Retained(PathBuf),
    Discarded,
    Failed(ErrorKind),
}

/// Counters for one filter run over a shard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSummary {
    pub shard: String,
    /// Document files examined (matching extension).
    pub processed: usize,
    pub retained: usize,
    pub discarded: usize,
    pub errors: usize,
    /// Files in the shard ignored because of their extension.
    pub skipped: usize,
    pub error_log: PathBuf,
    pub duration_ms: u64,
}

impl FilterSummary {
    pub fn record(&mut self, outcome: &FileOutcome) {
        self.processed += 1;
        match outcome {
            FileOutcome::Retained(_) => self.retained += 1,
            FileOutcome::Discarded   => self.discarded += 1,
            FileOutcome::Failed(_)   => self.errors += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_document_json_key_order() {
        let doc = Document {
            title: "T".into(),
            abstract_text: "A".into(),
            body: "B".into(),
        };
        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(json, r#"{"title":"T","abstract":"A","body":"B"}"#);
    }

    #[test]
    fn test_error_record_log_line() {
        let mut record = ErrorRecord::new(
            "/data/split_1/a.xml",
            FileError::new(ErrorKind::ParseError, "mismatched tag\nat line 3"),
        );
        record.timestamp = Local.with_ymd_and_hms(2024, 5, 1, 12, 34, 56).unwrap();
        assert_eq!(
            record.to_log_line(),
            "2024-05-01 12:34:56,000 ERROR:ParseError in file /data/split_1/a.xml: mismatched tag at line 3"
        );
    }

    #[test]
    fn test_summary_record() {
        let mut summary = FilterSummary::default();
        summary.record(&FileOutcome::Retained(PathBuf::from("x.json")));
        summary.record(&FileOutcome::Discarded);
        summary.record(&FileOutcome::Failed(ErrorKind::ParseError));
        assert_eq!((summary.processed, summary.retained, summary.discarded, summary.errors), (3, 1, 1, 1));
    }
}
