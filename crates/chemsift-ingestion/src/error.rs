use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("Unexpected encoding: {0}")]
    Encoding(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Partition error: {0}")]
    Partition(String),

    #[error("Setup error: {0}")]
    Setup(String),

    #[error("Entity recognition error: {0}")]
    Ner(#[from] chemsift_ner::NerError),
}

impl From<quick_xml::Error> for IngestionError {
    fn from(e: quick_xml::Error) -> Self {
        IngestionError::Xml(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IngestionError>;
