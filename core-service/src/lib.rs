//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, settings)
//! into the shared Rust core and owns the one instance of each subsystem:
//! the event bus, the request client and the preferences manager. Desktop
//! apps typically enable the `desktop-shims` feature (which depends on
//! `bridge-desktop`) so that missing bridges fall back to the reqwest and
//! SQLite adapters.
//!
//! ```no_run
//! # async fn example() -> core_service::Result<()> {
//! use core_runtime::{AppConfig, HostContext};
//! use core_service::AppCore;
//!
//! let config = AppConfig::builder().api_key("my-key").build()?;
//! let core = AppCore::bootstrap(config).await?;
//!
//! let quote = core
//!     .on_start(Some(HostContext::new("simple-framework", "0.1.0")))
//!     .await?;
//! quote.detach();
//! # Ok(())
//! # }
//! ```

pub mod error;

pub use error::{CoreError, Result};

use bridge_traits::{HttpClient, SettingsStore};
use core_network::{PendingCall, Quote, RequestClient};
use core_preferences::{PreferenceKey, PreferencesManager};
use core_runtime::{AppConfig, EventBus, HostContext};
use std::sync::Arc;
use tracing::info;

/// Category requested on start when none is stored
pub const DEFAULT_QUOTE_CATEGORY: &str = "movies";

/// Aggregated handle to all bridge dependencies the core requires.
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub settings_store: Arc<dyn SettingsStore>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(http_client: Arc<dyn HttpClient>, settings_store: Arc<dyn SettingsStore>) -> Self {
        Self {
            http_client,
            settings_store,
        }
    }

    /// Use the bridges injected through the config, falling back to the
    /// desktop adapters when the `desktop-shims` feature is enabled.
    pub async fn resolve(config: &AppConfig) -> Result<Self> {
        let http_client = match &config.http_client {
            Some(client) => Arc::clone(client),
            None => default_http_client(config)?,
        };

        let settings_store = match &config.settings_store {
            Some(store) => Arc::clone(store),
            None => default_settings_store(config).await?,
        };

        Ok(Self::new(http_client, settings_store))
    }
}

#[cfg(feature = "desktop-shims")]
fn default_http_client(config: &AppConfig) -> Result<Arc<dyn HttpClient>> {
    let timeouts = bridge_desktop::HttpTimeouts {
        connect: config.network.connect_timeout,
        write: config.network.write_timeout,
        read: config.network.read_timeout,
    };

    Ok(Arc::new(bridge_desktop::ReqwestHttpClient::with_timeouts(
        timeouts,
    )?))
}

#[cfg(not(feature = "desktop-shims"))]
fn default_http_client(_config: &AppConfig) -> Result<Arc<dyn HttpClient>> {
    Err(CoreError::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "No HTTP client injected. Use AppConfig::builder().http_client() \
                  or enable the desktop-shims feature."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
async fn default_settings_store(config: &AppConfig) -> Result<Arc<dyn SettingsStore>> {
    let dir = config
        .settings_dir
        .as_ref()
        .ok_or_else(|| CoreError::CapabilityMissing {
            capability: "SettingsStore".to_string(),
            message: "No settings directory configured.".to_string(),
        })?;

    let store = bridge_desktop::SqliteSettingsStore::open(dir, &config.settings_name).await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "desktop-shims"))]
async fn default_settings_store(_config: &AppConfig) -> Result<Arc<dyn SettingsStore>> {
    Err(CoreError::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "No settings store injected. Use AppConfig::builder().settings_store() \
                  or enable the desktop-shims feature."
            .to_string(),
    })
}

/// Primary façade exposed to host applications.
///
/// Cloning is cheap; every clone shares the same subsystems.
#[derive(Clone)]
pub struct AppCore {
    events: EventBus,
    network: Arc<RequestClient>,
    preferences: PreferencesManager,
}

impl AppCore {
    /// Build the core from explicit dependencies.
    pub fn new(config: &AppConfig, deps: CoreDependencies) -> Result<Self> {
        config.validate()?;

        let events = EventBus::new();
        let network = RequestClient::new(deps.http_client, config.network.clone())?
            .with_event_bus(events.clone());
        let preferences = PreferencesManager::new(deps.settings_store);

        info!("Application core created");
        Ok(Self {
            events,
            network: Arc::new(network),
            preferences,
        })
    }

    /// Resolve dependencies from `config` and build the core.
    pub async fn bootstrap(config: AppConfig) -> Result<Self> {
        let deps = CoreDependencies::resolve(&config).await?;
        Self::new(&config, deps)
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn network(&self) -> &RequestClient {
        &self.network
    }

    pub fn preferences(&self) -> &PreferencesManager {
        &self.preferences
    }

    /// Start-up flow run by the host once its UI exists.
    ///
    /// Initializes the request client with the host context, counts the
    /// launch, and requests a random quote in the stored category.
    pub async fn on_start(&self, context: Option<HostContext>) -> Result<PendingCall<Quote>> {
        self.network.initialize(context);

        let launch_count = self
            .preferences
            .update(PreferenceKey::LaunchCount, 0, |count: i32| {
                count.saturating_add(1)
            })
            .await?;

        let category = self
            .preferences
            .get_string_or(PreferenceKey::QuoteCategory, DEFAULT_QUOTE_CATEGORY)
            .await;

        info!(launch_count, category = %category, "Application core started");
        Ok(self.network.random_quote(&category)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_settings_location_is_reported() {
        let config = AppConfig {
            settings_dir: None,
            ..AppConfig::builder()
                .api_key("key")
                .settings_dir("/tmp/unused")
                .build()
                .unwrap()
        };

        let err = config.validate().unwrap_err();
        assert!(matches!(
            CoreError::from(err),
            CoreError::Runtime(core_runtime::Error::CapabilityMissing { .. })
        ));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_no_http_client_without_desktop_shims() {
        let config = AppConfig::builder()
            .api_key("key")
            .settings_dir("/tmp/unused")
            .build()
            .unwrap();

        assert!(matches!(
            default_http_client(&config),
            Err(CoreError::CapabilityMissing { .. })
        ));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_http_client_default() {
        let config = AppConfig::builder()
            .api_key("key")
            .settings_dir("/tmp/unused")
            .build()
            .unwrap();

        assert!(default_http_client(&config).is_ok());
    }
}
