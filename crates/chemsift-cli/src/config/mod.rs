//! Configuration loading for chemsift.
//! Reads chemsift.toml from the path in CHEMSIFT_CONFIG or the current directory.
//! A missing file means built-in defaults; a malformed one is an error.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chemsift_ingestion::density::{DensityPolicy, DENSITY_PERCENT, MAX_CHUNK_SIZE};
use chemsift_ingestion::filter::{FilterConfig, MAX_FILE_SIZE_BYTES};
use chemsift_ner::{CategorySet, LexiconSource, TrieNer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const CONFIG_ENV: &str = "CHEMSIFT_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "chemsift.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub partition: PartitionConfig,
    #[serde(default)]
    pub filter: FilterSection,
    #[serde(default)]
    pub ner: NerConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionConfig {
    #[serde(default = "default_num_splits")]
    pub num_splits: usize,
}

fn default_num_splits() -> usize { 32 }

impl Default for PartitionConfig {
    fn default() -> Self {
        Self { num_splits: default_num_splits() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSection {
    #[serde(default = "default_density_percent")]
    pub density_percent: f64,
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    /// Empty string accepts every file.
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
    #[serde(default)]
    pub keep_empty_documents: bool,
    #[serde(default = "default_pretty_indent")]
    pub pretty_indent: usize,
}

fn default_density_percent() -> f64       { DENSITY_PERCENT }
fn default_max_chunk_size()  -> usize     { MAX_CHUNK_SIZE }
fn default_categories()      -> Vec<String> {
    vec!["CHEMICAL".to_string(), "DISEASE".to_string()]
}
fn default_extension()       -> String    { "xml".to_string() }
fn default_max_file_size()   -> u64       { MAX_FILE_SIZE_BYTES }
fn default_pretty_indent()   -> usize     { 4 }

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            density_percent: default_density_percent(),
            max_chunk_size: default_max_chunk_size(),
            categories: default_categories(),
            extension: default_extension(),
            max_file_size_bytes: default_max_file_size(),
            keep_empty_documents: false,
            pretty_indent: default_pretty_indent(),
        }
    }
}

impl FilterSection {
    /// Resolve into the filter's runtime configuration.
    pub fn to_filter_config(&self) -> anyhow::Result<FilterConfig> {
        let categories = CategorySet::from_labels(&self.categories)
            .context("invalid [filter].categories")?;
        let policy = DensityPolicy {
            density_percent: self.density_percent,
            max_chunk_size: self.max_chunk_size,
            categories,
            keep_empty_documents: self.keep_empty_documents,
        };
        policy.validate().context("invalid [filter] section")?;

        let extension = match self.extension.trim() {
            "" => None,
            ext => Some(ext.to_string()),
        };
        Ok(FilterConfig {
            policy,
            extension,
            max_file_size_bytes: self.max_file_size_bytes,
            pretty_indent: self.pretty_indent,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NerConfig {
    #[serde(default = "default_true")]
    pub embedded_lexicon: bool,
    #[serde(default)]
    pub lexicons: Vec<PathBuf>,
    #[serde(default)]
    pub mesh_descriptors: String,
}

fn default_true() -> bool { true }

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            embedded_lexicon: true,
            lexicons: Vec::new(),
            mesh_descriptors: String::new(),
        }
    }
}

impl NerConfig {
    pub fn sources(&self) -> Vec<LexiconSource> {
        let mut sources: Vec<LexiconSource> =
            self.lexicons.iter().cloned().map(LexiconSource::Tsv).collect();
        if !self.mesh_descriptors.trim().is_empty() {
            sources.push(LexiconSource::MeshDescriptors(PathBuf::from(
                self.mesh_descriptors.trim(),
            )));
        }
        sources
    }

    /// Load the tagger once for the lifetime of the process.
    pub fn build_tagger(&self) -> anyhow::Result<TrieNer> {
        let ner = TrieNer::from_sources(self.embedded_lexicon, &self.sources())
            .context("failed to load the entity recognizer")?;
        let stats = ner.stats();
        info!(
            patterns = stats.total_patterns,
            chemicals = stats.chemical_count,
            diseases = stats.disease_count,
            genes = stats.gene_count,
            "Entity recognizer loaded"
        );
        Ok(ner)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_error_log_dir")]
    pub error_log_dir: PathBuf,
    /// 0 runs every shard at once.
    #[serde(default)]
    pub max_concurrency: usize,
}

fn default_output_dir()    -> PathBuf { PathBuf::from("filtered_jsons") }
fn default_error_log_dir() -> PathBuf { PathBuf::from("filter_logs") }

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            error_log_dir: default_error_log_dir(),
            max_concurrency: 0,
        }
    }
}

impl Config {
    /// Load configuration from `explicit`, else CHEMSIFT_CONFIG, else
    /// chemsift.toml in the current directory.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match explicit {
            Some(p) => (p.to_path_buf(), true),
            None => match std::env::var_os(CONFIG_ENV) {
                Some(p) => (PathBuf::from(p), true),
                None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
            },
        };

        if !path.exists() {
            if required {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            debug!("No {} found, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("malformed config {}", path.display()))?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests;
