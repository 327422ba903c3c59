use crate::operation::Operation;
use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("NULL or empty parameter, {operation} aborted")]
    InvalidParameter { operation: Operation },

    #[error("{operation} request could not be encoded: {message}")]
    Encode { operation: Operation, message: String },

    #[error("{operation} request failed: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: BridgeError,
    },

    #[error("{operation} response could not be decoded: {message}")]
    Decode { operation: Operation, message: String },

    #[error("Request task failed: {0}")]
    TaskFailed(String),

    #[error("Failed to start request dispatcher: {0}")]
    Dispatcher(String),
}

impl NetworkError {
    /// Operation the error belongs to, when known
    pub fn operation(&self) -> Option<Operation> {
        match self {
            NetworkError::InvalidParameter { operation }
            | NetworkError::Encode { operation, .. }
            | NetworkError::Transport { operation, .. }
            | NetworkError::Decode { operation, .. } => Some(*operation),
            NetworkError::TaskFailed(_) | NetworkError::Dispatcher(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, NetworkError>;
