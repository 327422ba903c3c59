//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux):
//! - `HttpClient` using `reqwest`, with fixed connect/write/read timeouts
//! - `SettingsStore` using a SQLite-backed key-value file
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, SqliteSettingsStore, DEFAULT_SETTINGS_NAME};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let settings = SqliteSettingsStore::open(&data_dir, DEFAULT_SETTINGS_NAME).await?;
//!
//!     // Hand both to the core configuration
//!     Ok(())
//! }
//! ```

mod http;
mod settings;

pub use http::{HttpTimeouts, ReqwestHttpClient};
pub use settings::{SqliteSettingsStore, DEFAULT_SETTINGS_NAME, IN_MEMORY_ACQUIRE_TIMEOUT};
