use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),

    #[error("Network error: {0}")]
    Network(#[from] core_network::NetworkError),

    #[error("Preferences error: {0}")]
    Preferences(#[from] core_preferences::PreferencesError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
