use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreferencesError {
    #[error("Preference storage error: {0}")]
    Storage(#[from] BridgeError),

    #[error("Cannot parse '{raw}' stored under {key} as {expected}: {message}")]
    Parse {
        key: String,
        raw: String,
        expected: &'static str,
        message: String,
    },
}

impl PreferencesError {
    /// Whether the stored value has a different type than the one requested
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, PreferencesError::Storage(BridgeError::TypeMismatch { .. }))
    }
}

pub type Result<T> = std::result::Result<T, PreferencesError>;
