//! Document filter for one shard.
//!
//! Walks a shard directory, parses each article, applies the density policy and
//! writes kept documents as `<stem>.json` into a shared output directory.
//! Per-file failures go to the run's error log and never stop the shard; only
//! setup problems (missing shard, uncreatable directories, bad policy) are
//! returned as errors.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::time::Instant;

use chemsift_ner::EntityTagger;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::density::DensityPolicy;
use crate::error::{IngestionError, Result};
use crate::error_log::ErrorLog;
use crate::models::{Document, ErrorKind, ErrorRecord, FileError, FileOutcome, FilterSummary};
use crate::{parser, partition};

/// 50 MiB
pub const MAX_FILE_SIZE_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub policy: DensityPolicy,
    /// Only files with this extension are documents; `None` accepts all files.
    pub extension: Option<String>,
    pub max_file_size_bytes: u64,
    /// Spaces per indentation level in the output JSON.
    pub pretty_indent: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            policy: DensityPolicy::default(),
            extension: Some("xml".to_string()),
            max_file_size_bytes: MAX_FILE_SIZE_BYTES,
            pretty_indent: 4,
        }
    }
}

impl FilterConfig {
    fn accepts(&self, path: &Path) -> bool {
        match &self.extension {
            None => true,
            Some(ext) => path
                .extension()
                .and_then(OsStr::to_str)
                .is_some_and(|e| e == ext.trim_start_matches('.')),
        }
    }
}

/// Progress hooks for a filter run. All methods default to no-ops.
pub trait FilterObserver {
    fn on_start(&mut self, _total: usize) {}
    fn on_file(&mut self, _path: &Path, _outcome: &FileOutcome) {}
    fn on_finish(&mut self, _summary: &FilterSummary) {}
}

impl FilterObserver for () {}

/// Filters shards with a shared, already-loaded tagger.
pub struct ShardFilter<'a> {
    tagger: &'a dyn EntityTagger,
    config: &'a FilterConfig,
}

impl<'a> ShardFilter<'a> {
    pub fn new(tagger: &'a dyn EntityTagger, config: &'a FilterConfig) -> Self {
        Self { tagger, config }
    }

    /// Filter every document in `shard_dir`.
    #[instrument(skip_all, fields(shard = %shard_dir.display()))]
    pub fn run(
        &self,
        shard_dir: &Path,
        output_dir: &Path,
        error_log_dir: &Path,
        observer: &mut dyn FilterObserver,
    ) -> Result<FilterSummary> {
        let t0 = Instant::now();
        self.config.policy.validate()?;

        if !shard_dir.is_dir() {
            return Err(IngestionError::Setup(format!(
                "shard directory {} does not exist or is not a directory",
                shard_dir.display()
            )));
        }
        create_dir(output_dir)?;
        create_dir(error_log_dir)?;

        let shard_tag = shard_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "shard".to_string());
        let mut log = ErrorLog::create(error_log_dir, &shard_tag).map_err(|e| {
            IngestionError::Setup(format!(
                "cannot create error log in {}: {e}",
                error_log_dir.display()
            ))
        })?;

        let mut summary = FilterSummary {
            shard: shard_tag,
            error_log: log.path().to_path_buf(),
            ..Default::default()
        };

        let mut documents = Vec::new();
        for entry in WalkDir::new(shard_dir).sort_by_file_name() {
            match entry {
                Ok(entry) if partition::is_corpus_file(&entry) => {
                    if self.config.accepts(entry.path()) {
                        documents.push(entry.into_path());
                    } else {
                        summary.skipped += 1;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    let path = e.path().unwrap_or(shard_dir).to_path_buf();
                    let error = FileError::new(ErrorKind::ReadError, e.to_string());
                    append(&mut log, ErrorRecord::new(path, error));
                    summary.errors += 1;
                }
            }
        }

        info!(
            documents = documents.len(),
            tagger = self.tagger.name(),
            "Filtering shard"
        );
        observer.on_start(documents.len());

        for path in &documents {
            let outcome = match self.process_file(path, output_dir) {
                Ok(outcome) => outcome,
                Err(error) => {
                    debug!(path = %path.display(), kind = %error.kind, "File failed");
                    let kind = error.kind;
                    append(&mut log, ErrorRecord::new(path.clone(), error));
                    FileOutcome::Failed(kind)
                }
            };
            summary.record(&outcome);
            observer.on_file(path, &outcome);
        }

        if let Err(e) = log.flush() {
            warn!("Could not flush error log {}: {e}", log.path().display());
        }
        summary.duration_ms = t0.elapsed().as_millis() as u64;

        info!(
            processed = summary.processed,
            retained = summary.retained,
            discarded = summary.discarded,
            errors = summary.errors,
            "Shard filtered"
        );
        observer.on_finish(&summary);
        Ok(summary)
    }

    /// Parse, score and (if kept) persist one document.
    pub fn process_file(
        &self,
        path: &Path,
        output_dir: &Path,
    ) -> std::result::Result<FileOutcome, FileError> {
        let meta = fs::metadata(path)
            .map_err(|e| FileError::new(ErrorKind::ReadError, e.to_string()))?;
        if meta.len() > self.config.max_file_size_bytes {
            return Err(FileError::new(
                ErrorKind::Oversized,
                format!(
                    "file is {} bytes, limit is {}",
                    meta.len(),
                    self.config.max_file_size_bytes
                ),
            ));
        }

        let document = parser::parse_file(path).map_err(classify)?;
        let decision = self.config.policy.decide(document, self.tagger);
        debug!(
            path = %path.display(),
            words = decision.word_count,
            entities = decision.entity_count,
            threshold = decision.threshold,
            keep = decision.keep,
            "Scored"
        );
        if !decision.keep {
            return Ok(FileOutcome::Discarded);
        }

        let stem = path.file_stem().ok_or_else(|| {
            FileError::new(ErrorKind::WriteError, "source file has no name stem")
        })?;
        let dest = output_dir.join(format!("{}.json", stem.to_string_lossy()));
        write_json(&decision.document, &dest, self.config.pretty_indent)
            .map_err(|e| FileError::new(ErrorKind::WriteError, e.to_string()))?;
        Ok(FileOutcome::Retained(dest))
    }
}

/// Filter one shard without progress reporting.
pub fn filter_shard(
    shard_dir: &Path,
    output_dir: &Path,
    error_log_dir: &Path,
    tagger: &dyn EntityTagger,
    config: &FilterConfig,
) -> Result<FilterSummary> {
    ShardFilter::new(tagger, config).run(shard_dir, output_dir, error_log_dir, &mut ())
}

/// Pretty-printed JSON, keys in `title, abstract, body` order.
pub fn to_pretty_json(document: &Document, indent: usize) -> Result<Vec<u8>> {
    let indent = vec![b' '; indent];
    let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    document.serialize(&mut ser)?;
    Ok(buf)
}

fn write_json(document: &Document, dest: &Path, indent: usize) -> Result<()> {
    let bytes = to_pretty_json(document, indent)?;
    fs::write(dest, bytes)?;
    Ok(())
}

fn classify(err: IngestionError) -> FileError {
    let kind = match err {
        IngestionError::Io(_) => ErrorKind::ReadError,
        IngestionError::Encoding(_) => ErrorKind::EncodingError,
        _ => ErrorKind::ParseError,
    };
    FileError::new(kind, err.to_string())
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .map_err(|e| IngestionError::Setup(format!("cannot create {}: {e}", dir.display())))
}

fn append(log: &mut ErrorLog, record: ErrorRecord) {
    if let Err(e) = log.append(&record) {
        warn!("Could not write to error log {}: {e}", log.path().display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_extension() {
        let config = FilterConfig::default();
        assert!(config.accepts(Path::new("a/b.xml")));
        assert!(!config.accepts(Path::new("a/b.nxml")));
        assert!(!config.accepts(Path::new("a/README")));

        let dotted = FilterConfig {
            extension: Some(".nxml".to_string()),
            ..FilterConfig::default()
        };
        assert!(dotted.accepts(Path::new("b.nxml")));

        let all = FilterConfig {
            extension: None,
            ..FilterConfig::default()
        };
        assert!(all.accepts(Path::new("README")));
    }

    #[test]
    fn test_pretty_json_layout() {
        let doc = Document {
            title: "T".into(),
            abstract_text: "A".into(),
            body: "B".into(),
        };
        let json = String::from_utf8(to_pretty_json(&doc, 4).unwrap()).unwrap();
        assert_eq!(
            json,
            "{\n    \"title\": \"T\",\n    \"abstract\": \"A\",\n    \"body\": \"B\"\n}"
        );
    }

    #[test]
    fn test_classify() {
        let io = IngestionError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "x"));
        assert_eq!(classify(io).kind, ErrorKind::ReadError);
        assert_eq!(classify(IngestionError::Xml("x".into())).kind, ErrorKind::ParseError);
        assert_eq!(
            classify(IngestionError::Encoding("x".into())).kind,
            ErrorKind::EncodingError
        );
    }
}
