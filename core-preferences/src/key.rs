use std::fmt;

/// Fixed set of preference keys.
///
/// Each key is persisted under its SCREAMING_SNAKE_CASE name, so renaming a
/// variant without keeping [`PreferenceKey::name`] stable orphans the stored
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceKey {
    SampleKeyTest,
    /// Number of times the application core was started
    LaunchCount,
    /// Category requested from the random-quote service on start
    QuoteCategory,
}

impl PreferenceKey {
    pub const ALL: &'static [PreferenceKey] = &[
        PreferenceKey::SampleKeyTest,
        PreferenceKey::LaunchCount,
        PreferenceKey::QuoteCategory,
    ];

    /// Name the key is stored under
    pub fn name(&self) -> &'static str {
        match self {
            PreferenceKey::SampleKeyTest => "SAMPLE_KEY_TEST",
            PreferenceKey::LaunchCount => "LAUNCH_COUNT",
            PreferenceKey::QuoteCategory => "QUOTE_CATEGORY",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|key| key.name() == name)
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_names() {
        assert_eq!(PreferenceKey::SampleKeyTest.name(), "SAMPLE_KEY_TEST");
        assert_eq!(PreferenceKey::LaunchCount.to_string(), "LAUNCH_COUNT");
    }

    #[test]
    fn test_from_name() {
        for key in PreferenceKey::ALL {
            assert_eq!(PreferenceKey::from_name(key.name()), Some(*key));
        }
        assert_eq!(PreferenceKey::from_name("sample_key_test"), None);
    }
}
