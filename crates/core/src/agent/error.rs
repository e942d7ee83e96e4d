use std::time::Duration;

use react_loop_model::{ErrorKind, ModelProviderError};
use thiserror::Error;

/// Why a run stopped without a [`RunResult`](crate::RunResult).
///
/// Running out of iterations is not an error, it yields an unsuccessful
/// result instead.
#[derive(Debug, Error)]
pub enum RunError {
    /// The model provider reported a failure.
    #[error("model request failed: {0}")]
    Model(Box<dyn ModelProviderError>),
    /// The model did not respond in time.
    #[error("model request timed out after {0:?}")]
    Timeout(Duration),
    /// The run was cancelled by the caller.
    #[error("run was cancelled")]
    Cancelled,
}

impl RunError {
    /// Returns the provider error kind, if the provider failed.
    #[inline]
    pub fn model_error_kind(&self) -> Option<ErrorKind> {
        match self {
            RunError::Model(err) => Some(err.kind()),
            _ => None,
        }
    }
}
