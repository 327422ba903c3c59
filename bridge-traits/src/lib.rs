//! # Host Bridge Traits
//!
//! Capability contracts between the core and the host platform.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Request/response exchange over a pooled client
//! - [`SettingsStore`](storage::SettingsStore) - Typed key-value preferences storage
//! - [`SettingsTransaction`](storage::SettingsTransaction) - Atomic multi-key settings updates
//! - [`LoggerSink`](logger::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate |
//! |----------|---------------------|
//! | Desktop  | `bridge-desktop`    |
//! | Android  | injected by the host |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! convert platform-specific errors into it and keep messages actionable.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so one instance can be shared
//! across async tasks behind an `Arc`.

pub mod error;
pub mod http;
pub mod logger;
pub mod storage;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use logger::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use storage::{SettingKind, SettingValue, SettingsStore, SettingsTransaction};
