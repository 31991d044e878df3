use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no data directory available")]
    NoDataDir,
}

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("no API key configured")]
    MissingCredential,
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("insight api error: http {status}; body={body}")]
    Status { status: u16, body: String },
    #[error("invalid insight payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("insight api returned no text")]
    EmptyResponse,
}
