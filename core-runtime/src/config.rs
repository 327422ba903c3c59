//! # Application Configuration
//!
//! A builder assembles an [`AppConfig`] holding the network endpoints, the
//! credential header value, the fixed request timeouts, the location of the
//! preferences file, and optionally host-injected bridges.
//!
//! ## Defaults
//!
//! | Setting | Default |
//! |---------|---------|
//! | transformed-text endpoint | `https://yoda.p.mashape.com/yoda` |
//! | random-quote endpoint | `https://andruxnet-random-famous-quotes.p.mashape.com/` |
//! | connect / write / read timeout | 30 s each |
//! | settings directory | `<platform data dir>/simple-framework` |
//! | settings file name | `default_settings` |
//!
//! The API key has no default and must be provided.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::AppConfig;
//!
//! let config = AppConfig::builder()
//!     .api_key("my-key")
//!     .settings_dir("/tmp/simple-framework")
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.settings_name, "default_settings");
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::AppConfig;
//!
//! // No API key configured
//! let config = AppConfig::builder()
//!     .settings_dir("/tmp/simple-framework")
//!     .build()
//!     .expect("Should fail - missing API key");
//! ```

use crate::error::{Error, Result};
use crate::logging::redact_if_sensitive;
use bridge_traits::{HttpClient, SettingsStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_YODA_SPEAK_URL: &str = "https://yoda.p.mashape.com/yoda";
pub const DEFAULT_RANDOM_QUOTES_URL: &str = "https://andruxnet-random-famous-quotes.p.mashape.com/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SETTINGS_NAME: &str = "default_settings";

/// Directory name under the platform data directory
const APP_DIR_NAME: &str = "simple-framework";

/// Endpoints, credential and timeouts for the request client.
#[derive(Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// GET endpoint that transforms a sentence (`?sentence=`)
    pub yoda_speak_url: String,

    /// POST endpoint returning a random quote for a category
    pub random_quotes_url: String,

    /// Static credential sent as `X-Mashape-Key`
    pub api_key: String,

    pub connect_timeout: Duration,
    pub write_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        let timeout = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        Self {
            yoda_speak_url: DEFAULT_YODA_SPEAK_URL.to_string(),
            random_quotes_url: DEFAULT_RANDOM_QUOTES_URL.to_string(),
            api_key: String::new(),
            connect_timeout: timeout,
            write_timeout: timeout,
            read_timeout: timeout,
        }
    }
}

impl std::fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("yoda_speak_url", &self.yoda_speak_url)
            .field("random_quotes_url", &self.random_quotes_url)
            .field("api_key", &redact_if_sensitive("api_key", &self.api_key))
            .field("connect_timeout", &self.connect_timeout)
            .field("write_timeout", &self.write_timeout)
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}

impl NetworkConfig {
    /// Checks endpoints, credential and timeouts.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Config(
                "API key is required. Use .api_key() to set it.".to_string(),
            ));
        }

        for (name, url) in [
            ("yoda_speak_url", &self.yoda_speak_url),
            ("random_quotes_url", &self.random_quotes_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    name, url
                )));
            }
        }

        for (name, timeout) in [
            ("connect_timeout", self.connect_timeout),
            ("write_timeout", self.write_timeout),
            ("read_timeout", self.read_timeout),
        ] {
            if timeout.is_zero() {
                return Err(Error::Config(format!("{} must be greater than zero", name)));
            }
        }

        Ok(())
    }
}

/// Application configuration.
///
/// Use [`AppConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct AppConfig {
    pub network: NetworkConfig,

    /// Directory holding the preferences file
    pub settings_dir: Option<PathBuf>,

    /// Preferences file name, without extension
    pub settings_name: String,

    /// HTTP client supplied by the host (optional with desktop default)
    pub http_client: Option<Arc<dyn HttpClient>>,

    /// Preferences storage supplied by the host (optional with desktop default)
    pub settings_store: Option<Arc<dyn SettingsStore>>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("network", &self.network)
            .field("settings_dir", &self.settings_dir)
            .field("settings_name", &self.settings_name)
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field(
                "settings_store",
                &self.settings_store.as_ref().map(|_| "SettingsStore { ... }"),
            )
            .finish()
    }
}

impl AppConfig {
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// A settings location is only required when no settings store was
    /// injected.
    pub fn validate(&self) -> Result<()> {
        self.network.validate()?;

        if self.settings_name.trim().is_empty() {
            return Err(Error::Config("Settings name cannot be empty".to_string()));
        }

        if self.settings_store.is_none() && self.settings_dir.is_none() {
            return Err(Error::CapabilityMissing {
                capability: "SettingsStore".to_string(),
                message: "No settings store injected and no settings directory available. \
                         Use .settings_dir() or inject a SettingsStore implementation."
                    .to_string(),
            });
        }

        Ok(())
    }

    /// Path of the preferences file, if a directory is configured
    pub fn settings_path(&self) -> Option<PathBuf> {
        self.settings_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.db", self.settings_name)))
    }
}

/// Builder for constructing [`AppConfig`] instances.
#[derive(Default)]
pub struct AppConfigBuilder {
    network: NetworkConfig,
    settings_dir: Option<PathBuf>,
    settings_name: Option<String>,
    http_client: Option<Arc<dyn HttpClient>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
}

impl AppConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.network.api_key = key.into();
        self
    }

    pub fn yoda_speak_url(mut self, url: impl Into<String>) -> Self {
        self.network.yoda_speak_url = url.into();
        self
    }

    pub fn random_quotes_url(mut self, url: impl Into<String>) -> Self {
        self.network.random_quotes_url = url.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.network.connect_timeout = timeout;
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.network.write_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.network.read_timeout = timeout;
        self
    }

    /// Sets connect, write and read timeouts to the same value
    pub fn timeouts(self, timeout: Duration) -> Self {
        self.connect_timeout(timeout)
            .write_timeout(timeout)
            .read_timeout(timeout)
    }

    pub fn settings_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.settings_dir = Some(dir.into());
        self
    }

    pub fn settings_name(mut self, name: impl Into<String>) -> Self {
        self.settings_name = Some(name.into());
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Builds and validates the final `AppConfig`.
    ///
    /// Without an explicit settings directory the platform data directory is
    /// used, when the platform reports one.
    pub fn build(self) -> Result<AppConfig> {
        let settings_dir = self
            .settings_dir
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME)));

        let config = AppConfig {
            network: self.network,
            settings_dir,
            settings_name: self
                .settings_name
                .unwrap_or_else(|| DEFAULT_SETTINGS_NAME.to_string()),
            http_client: self.http_client,
            settings_store: self.settings_store,
        };

        config.validate()?;

        Ok(config)
    }
}
