//! Preference values and their mapping onto store-level settings.
//!
//! `Int`, `String`, `Bool` and `Float` map to the matching native setting
//! kind. `Double` and `Long` are written through the string codec, so a
//! double is stored as its shortest round-trip decimal text and read back
//! by parsing that text.

use crate::error::{PreferencesError, Result};
use bridge_traits::{SettingKind, SettingValue};
use std::fmt;

/// A scalar preference value
#[derive(Debug, Clone, PartialEq)]
pub enum PrefValue {
    Int(i32),
    String(String),
    Bool(bool),
    Float(f32),
    Double(f64),
    Long(i64),
}

impl PrefValue {
    /// Store-level representation of this value
    pub fn to_setting(&self) -> SettingValue {
        match self {
            PrefValue::Int(n) => SettingValue::I32(*n),
            PrefValue::String(s) => SettingValue::String(s.clone()),
            PrefValue::Bool(b) => SettingValue::Bool(*b),
            PrefValue::Float(n) => SettingValue::F32(*n),
            PrefValue::Double(n) => SettingValue::String(n.to_string()),
            PrefValue::Long(n) => SettingValue::String(n.to_string()),
        }
    }
}

impl fmt::Display for PrefValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefValue::Int(n) => write!(f, "{}", n),
            PrefValue::String(s) => f.write_str(s),
            PrefValue::Bool(b) => write!(f, "{}", b),
            PrefValue::Float(n) => write!(f, "{}", n),
            PrefValue::Double(n) => write!(f, "{}", n),
            PrefValue::Long(n) => write!(f, "{}", n),
        }
    }
}

impl From<i32> for PrefValue {
    fn from(value: i32) -> Self {
        PrefValue::Int(value)
    }
}

impl From<String> for PrefValue {
    fn from(value: String) -> Self {
        PrefValue::String(value)
    }
}

impl From<&str> for PrefValue {
    fn from(value: &str) -> Self {
        PrefValue::String(value.to_string())
    }
}

impl From<bool> for PrefValue {
    fn from(value: bool) -> Self {
        PrefValue::Bool(value)
    }
}

impl From<f32> for PrefValue {
    fn from(value: f32) -> Self {
        PrefValue::Float(value)
    }
}

impl From<f64> for PrefValue {
    fn from(value: f64) -> Self {
        PrefValue::Double(value)
    }
}

impl From<i64> for PrefValue {
    fn from(value: i64) -> Self {
        PrefValue::Long(value)
    }
}

/// Rust types that can be read back from the preference store.
pub trait PrefType: Sized + Send {
    /// Setting kind the value is persisted as
    const KIND: SettingKind;

    /// Human-readable type name used in log lines and errors
    const NAME: &'static str;

    fn from_setting(key: &str, value: SettingValue) -> Result<Self>;
}

fn unexpected(key: &str, expected: &'static str, value: &SettingValue) -> PreferencesError {
    PreferencesError::Storage(bridge_traits::BridgeError::TypeMismatch {
        key: key.to_string(),
        expected: expected.to_string(),
        actual: value.kind().to_string(),
    })
}

fn parse_string<T>(key: &str, expected: &'static str, value: SettingValue) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match value {
        SettingValue::String(raw) => raw.trim().parse().map_err(|e: T::Err| {
            PreferencesError::Parse {
                key: key.to_string(),
                raw: raw.clone(),
                expected,
                message: e.to_string(),
            }
        }),
        other => Err(unexpected(key, expected, &other)),
    }
}

impl PrefType for i32 {
    const KIND: SettingKind = SettingKind::I32;
    const NAME: &'static str = "int";

    fn from_setting(key: &str, value: SettingValue) -> Result<Self> {
        match value {
            SettingValue::I32(n) => Ok(n),
            other => Err(unexpected(key, Self::NAME, &other)),
        }
    }
}

impl PrefType for String {
    const KIND: SettingKind = SettingKind::String;
    const NAME: &'static str = "string";

    fn from_setting(key: &str, value: SettingValue) -> Result<Self> {
        match value {
            SettingValue::String(s) => Ok(s),
            other => Err(unexpected(key, Self::NAME, &other)),
        }
    }
}

impl PrefType for bool {
    const KIND: SettingKind = SettingKind::Bool;
    const NAME: &'static str = "bool";

    fn from_setting(key: &str, value: SettingValue) -> Result<Self> {
        match value {
            SettingValue::Bool(b) => Ok(b),
            other => Err(unexpected(key, Self::NAME, &other)),
        }
    }
}

impl PrefType for f32 {
    const KIND: SettingKind = SettingKind::F32;
    const NAME: &'static str = "float";

    fn from_setting(key: &str, value: SettingValue) -> Result<Self> {
        match value {
            SettingValue::F32(n) => Ok(n),
            other => Err(unexpected(key, Self::NAME, &other)),
        }
    }
}

impl PrefType for f64 {
    const KIND: SettingKind = SettingKind::String;
    const NAME: &'static str = "double";

    fn from_setting(key: &str, value: SettingValue) -> Result<Self> {
        parse_string(key, Self::NAME, value)
    }
}

impl PrefType for i64 {
    const KIND: SettingKind = SettingKind::String;
    const NAME: &'static str = "long";

    fn from_setting(key: &str, value: SettingValue) -> Result<Self> {
        parse_string(key, Self::NAME, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_and_long_use_string_codec() {
        assert_eq!(
            PrefValue::from(2.5f64).to_setting(),
            SettingValue::String("2.5".to_string())
        );
        assert_eq!(
            PrefValue::from(-9_000_000_000i64).to_setting(),
            SettingValue::String("-9000000000".to_string())
        );
        assert_eq!(PrefValue::from(7).to_setting(), SettingValue::I32(7));
        assert_eq!(PrefValue::from(1.5f32).to_setting(), SettingValue::F32(1.5));
    }

    #[test]
    fn test_double_parses_stored_text() {
        let value = f64::from_setting("K", SettingValue::String("0.1".into())).unwrap();
        assert_eq!(value, 0.1);
    }

    #[test]
    fn test_double_parse_failure() {
        let err = f64::from_setting("K", SettingValue::String("abc".into())).unwrap_err();
        match err {
            PreferencesError::Parse { key, raw, expected, .. } => {
                assert_eq!(key, "K");
                assert_eq!(raw, "abc");
                assert_eq!(expected, "double");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_wrong_variant_is_type_mismatch() {
        let err = i32::from_setting("K", SettingValue::Bool(true)).unwrap_err();
        assert!(err.is_type_mismatch());
    }
}
