use thiserror::Error;

#[derive(Error, Debug)]
pub enum MolSwarmError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Data Validation Error: {0}")]
    Validation(String),

    #[error("Scoring Error: {0}")]
    Scoring(String),

    #[error("Embedding Model Error: {0}")]
    Embedding(String),
}

pub type MsResult<T> = Result<T, MolSwarmError>;
