use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DojoError {
    #[error("audio clock unavailable: {0}")]
    ClockUnavailable(String),

    #[error("offset store {path}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("offset store json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DojoResult<T> = Result<T, DojoError>;
