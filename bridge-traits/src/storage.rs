//! Key-Value Settings Storage Abstractions
//!
//! Values are tagged scalars. The tag is persisted next to the encoded value
//! so that a read with the wrong type is detected instead of silently
//! reinterpreted.

use async_trait::async_trait;
use std::fmt;

use crate::error::{BridgeError, Result};

/// Scalar types a settings store can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKind {
    String,
    Bool,
    I32,
    I64,
    F32,
    F64,
}

impl SettingKind {
    /// Tag persisted alongside the encoded value
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKind::String => "string",
            SettingKind::Bool => "bool",
            SettingKind::I32 => "i32",
            SettingKind::I64 => "i64",
            SettingKind::F32 => "f32",
            SettingKind::F64 => "f64",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(SettingKind::String),
            "bool" => Some(SettingKind::Bool),
            "i32" => Some(SettingKind::I32),
            "i64" => Some(SettingKind::I64),
            "f32" => Some(SettingKind::F32),
            "f64" => Some(SettingKind::F64),
            _ => None,
        }
    }
}

impl fmt::Display for SettingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tagged scalar setting value
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    String(String),
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl SettingValue {
    pub fn kind(&self) -> SettingKind {
        match self {
            SettingValue::String(_) => SettingKind::String,
            SettingValue::Bool(_) => SettingKind::Bool,
            SettingValue::I32(_) => SettingKind::I32,
            SettingValue::I64(_) => SettingKind::I64,
            SettingValue::F32(_) => SettingKind::F32,
            SettingValue::F64(_) => SettingKind::F64,
        }
    }

    /// Text form written to the backing store
    pub fn encode(&self) -> String {
        match self {
            SettingValue::String(s) => s.clone(),
            SettingValue::Bool(b) => b.to_string(),
            SettingValue::I32(n) => n.to_string(),
            SettingValue::I64(n) => n.to_string(),
            SettingValue::F32(n) => n.to_string(),
            SettingValue::F64(n) => n.to_string(),
        }
    }

    /// Rebuild a value from its persisted text form and tag
    pub fn decode(key: &str, kind: SettingKind, raw: &str) -> Result<Self> {
        let invalid = |e: &dyn fmt::Display| BridgeError::InvalidValue {
            key: key.to_string(),
            message: format!("cannot parse '{}' as {}: {}", raw, kind, e),
        };

        Ok(match kind {
            SettingKind::String => SettingValue::String(raw.to_string()),
            SettingKind::Bool => SettingValue::Bool(raw.parse().map_err(|e| invalid(&e))?),
            SettingKind::I32 => SettingValue::I32(raw.parse().map_err(|e| invalid(&e))?),
            SettingKind::I64 => SettingValue::I64(raw.parse().map_err(|e| invalid(&e))?),
            SettingKind::F32 => SettingValue::F32(raw.parse().map_err(|e| invalid(&e))?),
            SettingKind::F64 => SettingValue::F64(raw.parse().map_err(|e| invalid(&e))?),
        })
    }
}

/// Key-value settings storage trait
///
/// Abstracts platform-specific preferences storage:
/// - Android: SharedPreferences / DataStore
/// - iOS: UserDefaults
/// - Desktop: SQLite file in the application data directory
///
/// `get` returns `Ok(None)` for an absent key and
/// [`BridgeError::TypeMismatch`] when the stored tag differs from `kind`.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn save_preference(store: &dyn SettingsStore) -> Result<()> {
///     store.set_string("theme", "dark").await?;
///     store.set_bool("sync_on_wifi_only", true).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a value, replacing any previous value and type under `key`
    async fn set(&self, key: &str, value: SettingValue) -> Result<()>;

    /// Retrieve a value of the given kind
    async fn get(&self, key: &str, kind: SettingKind) -> Result<Option<SettingValue>>;

    /// Delete a setting
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool>;

    /// List all setting keys
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Clear all settings
    async fn clear_all(&self) -> Result<()>;

    /// Begin a transaction for atomic updates
    ///
    /// Changes become visible on `commit`; dropping the transaction without
    /// committing rolls it back.
    async fn begin_transaction(&self) -> Result<Box<dyn SettingsTransaction + Send>>;

    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.set(key, SettingValue::String(value.to_string())).await
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        match self.get(key, SettingKind::String).await? {
            Some(SettingValue::String(s)) => Ok(Some(s)),
            _ => Ok(None),
        }
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set(key, SettingValue::Bool(value)).await
    }

    async fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key, SettingKind::Bool).await? {
            Some(SettingValue::Bool(b)) => Ok(Some(b)),
            _ => Ok(None),
        }
    }

    async fn set_i64(&self, key: &str, value: i64) -> Result<()> {
        self.set(key, SettingValue::I64(value)).await
    }

    async fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        match self.get(key, SettingKind::I64).await? {
            Some(SettingValue::I64(n)) => Ok(Some(n)),
            _ => Ok(None),
        }
    }

    async fn set_f64(&self, key: &str, value: f64) -> Result<()> {
        self.set(key, SettingValue::F64(value)).await
    }

    async fn get_f64(&self, key: &str) -> Result<Option<f64>> {
        match self.get(key, SettingKind::F64).await? {
            Some(SettingValue::F64(n)) => Ok(Some(n)),
            _ => Ok(None),
        }
    }
}

/// Transaction for atomic settings updates
#[async_trait]
pub trait SettingsTransaction: Send {
    /// Set a value within the transaction
    async fn set(&mut self, key: &str, value: SettingValue) -> Result<()>;

    /// Delete a key within the transaction
    async fn delete(&mut self, key: &str) -> Result<()>;

    /// Delete every key within the transaction
    async fn clear_all(&mut self) -> Result<()>;

    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_round_trip() {
        for kind in [
            SettingKind::String,
            SettingKind::Bool,
            SettingKind::I32,
            SettingKind::I64,
            SettingKind::F32,
            SettingKind::F64,
        ] {
            assert_eq!(SettingKind::from_tag(kind.as_str()), Some(kind));
        }
        assert_eq!(SettingKind::from_tag("double"), None);
    }

    #[test]
    fn test_decode_typed_values() {
        assert_eq!(
            SettingValue::decode("k", SettingKind::Bool, "true").unwrap(),
            SettingValue::Bool(true)
        );
        assert_eq!(
            SettingValue::decode("k", SettingKind::I32, "-7").unwrap(),
            SettingValue::I32(-7)
        );
        assert_eq!(
            SettingValue::decode("k", SettingKind::F64, &SettingValue::F64(2.75).encode())
                .unwrap(),
            SettingValue::F64(2.75)
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = SettingValue::decode("counter", SettingKind::I64, "twelve").unwrap_err();
        match err {
            BridgeError::InvalidValue { key, .. } => assert_eq!(key, "counter"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
