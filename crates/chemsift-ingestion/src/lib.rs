//! chemsift-ingestion: the shard-and-filter pipeline.
//!
//! - Corpus partitioning into `split_<i>` shard directories
//! - Article XML parsing into title / abstract / body
//! - Entity-density keep/discard decision
//! - Per-shard document filtering with a shard-local error log
//! - Concurrent fan-out of one filter process per shard

pub mod density;
pub mod error;
pub mod error_log;
pub mod filter;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod partition;

pub use error::{IngestionError, Result};
