//! Error taxonomy shared by the tasks, the orchestrator and the shell

/// Custom error type for application-specific errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Bad user input; the task never starts
    #[error("{0}")]
    Validation(String),

    /// The extraction collaborator failed while reading metadata
    #[error("Error fetching video info: {0}")]
    Probe(String),

    /// The extraction collaborator failed during transfer or merge
    #[error("{0}")]
    Download(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl AppError {
    /// True for errors the user caused and can fix in place
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}
