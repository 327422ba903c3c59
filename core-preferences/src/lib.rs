//! # Preferences Module
//!
//! Persistent key-value store for user preferences.
//!
//! ## Overview
//!
//! A [`PreferencesManager`] wraps an injected
//! [`SettingsStore`](bridge_traits::SettingsStore) and exposes typed reads
//! and writes for a fixed set of [`PreferenceKey`]s. Reads never fail: an
//! absent key, a value of another type or a storage failure is logged and
//! the caller's default is returned.
//!
//! ## Features
//!
//! - Scalar values: int, string, bool, float, double and long
//! - Doubles and longs persisted as text for full precision
//! - Multi-key removal and clear in one transaction
//! - Batched edits through [`PreferencesEditor`]
//! - Writes serialized per manager

pub mod error;
pub mod key;
pub mod manager;
pub mod value;

pub use error::{PreferencesError, Result};
pub use key::PreferenceKey;
pub use manager::{PreferencesEditor, PreferencesManager};
pub use value::{PrefType, PrefValue};
