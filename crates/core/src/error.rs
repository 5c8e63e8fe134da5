use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShowUsagesError {
    #[error("Cannot search for usages: no symbol at the caret")]
    NoTargetResolved,
    #[error("Cannot search for usages: no target chosen")]
    AmbiguousTargetUnresolved,
    #[error("Usages of {0} cannot be searched")]
    UnsupportedTarget(String),
    #[error("Usage search failed: {0}")]
    SearchProducerFailure(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<usagescope_api::ApiError> for ShowUsagesError {
    fn from(err: usagescope_api::ApiError) -> Self {
        match err {
            usagescope_api::ApiError::NotFound(_) => ShowUsagesError::NoTargetResolved,
            other => ShowUsagesError::Internal(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ShowUsagesError>;
