//! # Core Runtime Module
//!
//! Runtime infrastructure shared by every subsystem:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Host context handed over by the application shell
//! - Typed in-process event bus
//!
//! Nothing in here is a process-wide singleton. The composition root builds
//! one instance of each piece and passes it to whoever needs it.

pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{AppConfig, AppConfigBuilder, NetworkConfig};
pub use context::HostContext;
pub use error::{Error, Result};
pub use events::{DeadEvent, EventBus, SubscriptionId};
