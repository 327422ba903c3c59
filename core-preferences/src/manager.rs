//! Preferences Manager
//!
//! Typed access to the persistent key-value store.
//!
//! ## Example
//!
//! ```no_run
//! use core_preferences::{PreferenceKey, PreferencesManager};
//! # use std::sync::Arc;
//! # use bridge_traits::SettingsStore;
//! # async fn example(store: Arc<dyn SettingsStore>) -> core_preferences::Result<()> {
//! let preferences = PreferencesManager::new(store);
//!
//! preferences.put(PreferenceKey::SampleKeyTest, "hello").await?;
//! let value = preferences.get_string(PreferenceKey::SampleKeyTest).await;
//! assert_eq!(value.as_deref(), Some("hello"));
//!
//! // Several changes at once
//! let mut editor = preferences.edit().await?;
//! editor.put(PreferenceKey::LaunchCount, 1).await?;
//! editor.remove(PreferenceKey::SampleKeyTest).await?;
//! editor.commit().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! Every write made through one manager is serialized by an internal async
//! mutex. A [`PreferencesEditor`] holds that mutex until it is committed,
//! rolled back or dropped, so a task must not write through the manager
//! while it still owns an open editor. Reads never take the mutex, so a
//! read followed by a separate `put` can lose a concurrent write; use
//! [`PreferencesManager::update`] for read-modify-write.

use crate::error::{PreferencesError, Result};
use crate::key::PreferenceKey;
use crate::value::{PrefType, PrefValue};
use bridge_traits::{SettingsStore, SettingsTransaction};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

/// Typed facade over a [`SettingsStore`].
///
/// Cloning shares the store and the write lock.
#[derive(Clone)]
pub struct PreferencesManager {
    store: Arc<dyn SettingsStore>,
    write_lock: Arc<Mutex<()>>,
}

impl PreferencesManager {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        info!("Preferences manager initialized");
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Store a value under `key`, replacing any previous value and type.
    pub async fn put(&self, key: PreferenceKey, value: impl Into<PrefValue>) -> Result<()> {
        let value = value.into();
        let _guard = self.write_lock.lock().await;

        self.store.set(key.name(), value.to_setting()).await?;

        info!(key = key.name(), value = %value, "Preference stored");
        Ok(())
    }

    /// Replace the value under `key` with `f(current)` in one locked step.
    ///
    /// `current` is `default` when the key is absent or unreadable. Returns
    /// the value written.
    pub async fn update<T, F>(&self, key: PreferenceKey, default: T, f: F) -> Result<T>
    where
        T: PrefType + Clone + Into<PrefValue>,
        F: FnOnce(T) -> T,
    {
        let _guard = self.write_lock.lock().await;

        let current = self.read_or_log::<T>(key).await.unwrap_or(default);
        let next = f(current);
        let value: PrefValue = next.clone().into();
        self.store.set(key.name(), value.to_setting()).await?;

        info!(key = key.name(), value = %value, "Preference updated");
        Ok(next)
    }

    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` for an absent key. A stored value of another type
    /// or one that does not parse is an error.
    pub async fn try_get<T: PrefType>(&self, key: PreferenceKey) -> Result<Option<T>> {
        match self.store.get(key.name(), T::KIND).await? {
            Some(value) => T::from_setting(key.name(), value).map(Some),
            None => Ok(None),
        }
    }

    /// Read the value stored under `key`, falling back to `default` when
    /// the key is absent, holds another type, or cannot be read.
    pub async fn get<T: PrefType>(&self, key: PreferenceKey, default: T) -> T {
        self.read_or_log::<T>(key).await.unwrap_or(default)
    }

    pub async fn get_int(&self, key: PreferenceKey) -> i32 {
        self.get(key, 0).await
    }

    pub async fn get_int_or(&self, key: PreferenceKey, default: i32) -> i32 {
        self.get(key, default).await
    }

    /// `None` when the key is absent or does not hold a string
    pub async fn get_string(&self, key: PreferenceKey) -> Option<String> {
        self.read_or_log::<String>(key).await
    }

    pub async fn get_string_or(&self, key: PreferenceKey, default: &str) -> String {
        self.get(key, default.to_string()).await
    }

    pub async fn get_bool(&self, key: PreferenceKey) -> bool {
        self.get(key, false).await
    }

    pub async fn get_bool_or(&self, key: PreferenceKey, default: bool) -> bool {
        self.get(key, default).await
    }

    pub async fn get_float(&self, key: PreferenceKey) -> f32 {
        self.get(key, 0.0).await
    }

    pub async fn get_float_or(&self, key: PreferenceKey, default: f32) -> f32 {
        self.get(key, default).await
    }

    pub async fn get_double(&self, key: PreferenceKey) -> f64 {
        self.get(key, 0.0).await
    }

    pub async fn get_double_or(&self, key: PreferenceKey, default: f64) -> f64 {
        self.get(key, default).await
    }

    pub async fn get_long(&self, key: PreferenceKey) -> i64 {
        self.get(key, 0).await
    }

    pub async fn get_long_or(&self, key: PreferenceKey, default: i64) -> i64 {
        self.get(key, default).await
    }

    /// Whether any value is stored under `key`
    pub async fn contains(&self, key: PreferenceKey) -> Result<bool> {
        Ok(self.store.has_key(key.name()).await?)
    }

    /// Remove the given keys in one transaction.
    pub async fn remove(&self, keys: &[PreferenceKey]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut transaction = self.store.begin_transaction().await?;

        for key in keys {
            transaction.delete(key.name()).await?;
        }
        transaction.commit().await?;

        for key in keys {
            info!(key = key.name(), "Preference removed");
        }
        Ok(())
    }

    /// Remove every stored preference.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut transaction = self.store.begin_transaction().await?;

        transaction.clear_all().await?;
        transaction.commit().await?;

        info!("All preferences cleared");
        Ok(())
    }

    /// Start a batch of changes that become visible together on
    /// [`PreferencesEditor::commit`].
    ///
    /// Waits until no other write is in progress.
    pub async fn edit(&self) -> Result<PreferencesEditor> {
        let guard = Arc::clone(&self.write_lock).lock_owned().await;
        let transaction = self.store.begin_transaction().await?;

        debug!("Preferences editor opened");
        Ok(PreferencesEditor {
            transaction,
            changes: 0,
            _guard: guard,
        })
    }

    async fn read_or_log<T: PrefType>(&self, key: PreferenceKey) -> Option<T> {
        match self.try_get::<T>(key).await {
            Ok(value) => value,
            Err(err) if err.is_type_mismatch() => {
                warn!(key = key.name(), expected = T::NAME, error = %err, "Preference has another type");
                None
            }
            Err(err @ PreferencesError::Parse { .. }) => {
                error!(key = key.name(), expected = T::NAME, error = %err, "Stored preference does not parse");
                None
            }
            Err(err) => {
                error!(key = key.name(), error = %err, "Failed to read preference");
                None
            }
        }
    }
}

/// Batch of preference changes applied atomically.
///
/// Dropping the editor without committing discards its changes.
pub struct PreferencesEditor {
    transaction: Box<dyn SettingsTransaction + Send>,
    changes: usize,
    _guard: OwnedMutexGuard<()>,
}

impl PreferencesEditor {
    pub async fn put(&mut self, key: PreferenceKey, value: impl Into<PrefValue>) -> Result<()> {
        let value = value.into();
        self.transaction.set(key.name(), value.to_setting()).await?;
        self.changes += 1;

        debug!(key = key.name(), value = %value, "Preference staged");
        Ok(())
    }

    pub async fn remove(&mut self, key: PreferenceKey) -> Result<()> {
        self.transaction.delete(key.name()).await?;
        self.changes += 1;

        debug!(key = key.name(), "Preference removal staged");
        Ok(())
    }

    pub async fn clear(&mut self) -> Result<()> {
        self.transaction.clear_all().await?;
        self.changes += 1;
        Ok(())
    }

    /// Number of staged changes
    pub fn pending(&self) -> usize {
        self.changes
    }

    pub async fn commit(self) -> Result<()> {
        let changes = self.changes;
        self.transaction.commit().await?;

        info!(changes, "Preferences committed");
        Ok(())
    }

    pub async fn rollback(self) -> Result<()> {
        let changes = self.changes;
        self.transaction.rollback().await?;

        debug!(changes, "Preferences editor rolled back");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{BridgeError, SettingKind, SettingValue};
    use std::collections::HashMap;

    type Entries = Arc<Mutex<HashMap<String, SettingValue>>>;

    /// Map-backed store whose transactions buffer changes until commit
    #[derive(Clone, Default)]
    struct MockSettingsStore {
        entries: Entries,
    }

    impl MockSettingsStore {
        async fn raw(&self, key: &str) -> Option<SettingValue> {
            self.entries.lock().await.get(key).cloned()
        }
    }

    #[async_trait]
    impl SettingsStore for MockSettingsStore {
        async fn set(&self, key: &str, value: SettingValue) -> BridgeResult<()> {
            self.entries.lock().await.insert(key.to_string(), value);
            Ok(())
        }

        async fn get(&self, key: &str, kind: SettingKind) -> BridgeResult<Option<SettingValue>> {
            match self.entries.lock().await.get(key) {
                Some(value) if value.kind() == kind => Ok(Some(value.clone())),
                Some(value) => Err(BridgeError::TypeMismatch {
                    key: key.to_string(),
                    expected: kind.to_string(),
                    actual: value.kind().to_string(),
                }),
                None => Ok(None),
            }
        }

        async fn delete(&self, key: &str) -> BridgeResult<()> {
            self.entries.lock().await.remove(key);
            Ok(())
        }

        async fn has_key(&self, key: &str) -> BridgeResult<bool> {
            Ok(self.entries.lock().await.contains_key(key))
        }

        async fn list_keys(&self) -> BridgeResult<Vec<String>> {
            Ok(self.entries.lock().await.keys().cloned().collect())
        }

        async fn clear_all(&self) -> BridgeResult<()> {
            self.entries.lock().await.clear();
            Ok(())
        }

        async fn begin_transaction(&self) -> BridgeResult<Box<dyn SettingsTransaction + Send>> {
            Ok(Box::new(MockTransaction {
                entries: Arc::clone(&self.entries),
                ops: Vec::new(),
            }))
        }
    }

    enum Op {
        Set(String, SettingValue),
        Delete(String),
        Clear,
    }

    struct MockTransaction {
        entries: Entries,
        ops: Vec<Op>,
    }

    #[async_trait]
    impl SettingsTransaction for MockTransaction {
        async fn set(&mut self, key: &str, value: SettingValue) -> BridgeResult<()> {
            self.ops.push(Op::Set(key.to_string(), value));
            Ok(())
        }

        async fn delete(&mut self, key: &str) -> BridgeResult<()> {
            self.ops.push(Op::Delete(key.to_string()));
            Ok(())
        }

        async fn clear_all(&mut self) -> BridgeResult<()> {
            self.ops.push(Op::Clear);
            Ok(())
        }

        async fn commit(self: Box<Self>) -> BridgeResult<()> {
            let mut entries = self.entries.lock().await;
            for op in self.ops {
                match op {
                    Op::Set(key, value) => {
                        entries.insert(key, value);
                    }
                    Op::Delete(key) => {
                        entries.remove(&key);
                    }
                    Op::Clear => entries.clear(),
                }
            }
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> BridgeResult<()> {
            Ok(())
        }
    }

    /// Store whose every operation fails
    struct BrokenStore;

    #[async_trait]
    impl SettingsStore for BrokenStore {
        async fn set(&self, _key: &str, _value: SettingValue) -> BridgeResult<()> {
            Err(BridgeError::DatabaseError("disk full".into()))
        }

        async fn get(&self, _key: &str, _kind: SettingKind) -> BridgeResult<Option<SettingValue>> {
            Err(BridgeError::DatabaseError("disk gone".into()))
        }

        async fn delete(&self, _key: &str) -> BridgeResult<()> {
            Err(BridgeError::DatabaseError("disk gone".into()))
        }

        async fn has_key(&self, _key: &str) -> BridgeResult<bool> {
            Err(BridgeError::DatabaseError("disk gone".into()))
        }

        async fn list_keys(&self) -> BridgeResult<Vec<String>> {
            Err(BridgeError::DatabaseError("disk gone".into()))
        }

        async fn clear_all(&self) -> BridgeResult<()> {
            Err(BridgeError::DatabaseError("disk gone".into()))
        }

        async fn begin_transaction(&self) -> BridgeResult<Box<dyn SettingsTransaction + Send>> {
            Err(BridgeError::DatabaseError("disk gone".into()))
        }
    }

    fn manager() -> (PreferencesManager, MockSettingsStore) {
        let store = MockSettingsStore::default();
        (PreferencesManager::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn test_put_and_get_each_type() {
        let (prefs, _) = manager();

        prefs.put(PreferenceKey::LaunchCount, 3).await.unwrap();
        assert_eq!(prefs.get_int(PreferenceKey::LaunchCount).await, 3);

        prefs.put(PreferenceKey::SampleKeyTest, true).await.unwrap();
        assert!(prefs.get_bool(PreferenceKey::SampleKeyTest).await);

        prefs.put(PreferenceKey::SampleKeyTest, 1.25f32).await.unwrap();
        assert_eq!(prefs.get_float(PreferenceKey::SampleKeyTest).await, 1.25);

        prefs.put(PreferenceKey::SampleKeyTest, 0.1f64).await.unwrap();
        assert_eq!(prefs.get_double(PreferenceKey::SampleKeyTest).await, 0.1);

        prefs.put(PreferenceKey::SampleKeyTest, i64::MAX).await.unwrap();
        assert_eq!(prefs.get_long(PreferenceKey::SampleKeyTest).await, i64::MAX);

        prefs.put(PreferenceKey::QuoteCategory, "famous").await.unwrap();
        assert_eq!(
            prefs.get_string(PreferenceKey::QuoteCategory).await.as_deref(),
            Some("famous")
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_are_not_lost() {
        let (prefs, _) = manager();

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let prefs = prefs.clone();
                tokio::spawn(async move {
                    prefs
                        .update(PreferenceKey::LaunchCount, 0, |count: i32| count + 1)
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(prefs.get_int(PreferenceKey::LaunchCount).await, 50);
    }

    #[tokio::test]
    async fn test_update_starts_from_default_on_mismatch() {
        let (prefs, _) = manager();
        prefs.put(PreferenceKey::LaunchCount, "not a number").await.unwrap();

        let written = prefs
            .update(PreferenceKey::LaunchCount, 10, |count: i32| count * 2)
            .await
            .unwrap();

        assert_eq!(written, 20);
        assert_eq!(prefs.get_int(PreferenceKey::LaunchCount).await, 20);
    }

    #[tokio::test]
    async fn test_double_is_stored_as_text() {
        let (prefs, store) = manager();

        prefs.put(PreferenceKey::SampleKeyTest, 2.5f64).await.unwrap();

        assert_eq!(
            store.raw("SAMPLE_KEY_TEST").await,
            Some(SettingValue::String("2.5".into()))
        );
        // Readable through the string getter too
        assert_eq!(
            prefs.get_string(PreferenceKey::SampleKeyTest).await.as_deref(),
            Some("2.5")
        );
    }

    #[tokio::test]
    async fn test_absent_key_returns_defaults() {
        let (prefs, _) = manager();

        assert_eq!(prefs.get_int(PreferenceKey::LaunchCount).await, 0);
        assert_eq!(prefs.get_int_or(PreferenceKey::LaunchCount, 9).await, 9);
        assert_eq!(prefs.get_string(PreferenceKey::QuoteCategory).await, None);
        assert_eq!(
            prefs.get_string_or(PreferenceKey::QuoteCategory, "movies").await,
            "movies"
        );
        assert!(!prefs.get_bool(PreferenceKey::SampleKeyTest).await);
        assert_eq!(prefs.get_double_or(PreferenceKey::SampleKeyTest, 1.5).await, 1.5);
        assert_eq!(prefs.get_long_or(PreferenceKey::SampleKeyTest, -1).await, -1);
    }

    #[tokio::test]
    async fn test_type_mismatch_returns_default() {
        let (prefs, _) = manager();

        prefs.put(PreferenceKey::SampleKeyTest, "text").await.unwrap();

        assert_eq!(prefs.get_int_or(PreferenceKey::SampleKeyTest, 5).await, 5);
        assert!(prefs.get_bool_or(PreferenceKey::SampleKeyTest, true).await);

        let err = prefs
            .try_get::<i32>(PreferenceKey::SampleKeyTest)
            .await
            .unwrap_err();
        assert!(err.is_type_mismatch());
    }

    #[tokio::test]
    async fn test_unparsable_double_returns_default() {
        let (prefs, _) = manager();

        prefs.put(PreferenceKey::SampleKeyTest, "abc").await.unwrap();

        assert_eq!(prefs.get_double_or(PreferenceKey::SampleKeyTest, 1.5).await, 1.5);
        assert!(matches!(
            prefs.try_get::<f64>(PreferenceKey::SampleKeyTest).await,
            Err(PreferencesError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn test_overwrite_changes_type() {
        let (prefs, _) = manager();

        prefs.put(PreferenceKey::SampleKeyTest, 10).await.unwrap();
        prefs.put(PreferenceKey::SampleKeyTest, "ten").await.unwrap();

        assert_eq!(prefs.get_int(PreferenceKey::SampleKeyTest).await, 0);
        assert_eq!(
            prefs.get_string(PreferenceKey::SampleKeyTest).await.as_deref(),
            Some("ten")
        );
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let (prefs, _) = manager();

        prefs.put(PreferenceKey::SampleKeyTest, 1).await.unwrap();
        prefs.put(PreferenceKey::LaunchCount, 2).await.unwrap();
        prefs.put(PreferenceKey::QuoteCategory, "movies").await.unwrap();

        prefs
            .remove(&[PreferenceKey::SampleKeyTest, PreferenceKey::LaunchCount])
            .await
            .unwrap();
        assert!(!prefs.contains(PreferenceKey::SampleKeyTest).await.unwrap());
        assert!(!prefs.contains(PreferenceKey::LaunchCount).await.unwrap());
        assert!(prefs.contains(PreferenceKey::QuoteCategory).await.unwrap());

        prefs.clear().await.unwrap();
        assert_eq!(prefs.get_string(PreferenceKey::QuoteCategory).await, None);
    }

    #[tokio::test]
    async fn test_editor_changes_invisible_until_commit() {
        let (prefs, store) = manager();
        prefs.put(PreferenceKey::SampleKeyTest, "old").await.unwrap();

        let mut editor = prefs.edit().await.unwrap();
        editor.put(PreferenceKey::LaunchCount, 7).await.unwrap();
        editor.remove(PreferenceKey::SampleKeyTest).await.unwrap();
        assert_eq!(editor.pending(), 2);

        // Reads bypass the write lock
        assert_eq!(prefs.get_int(PreferenceKey::LaunchCount).await, 0);
        assert!(store.raw("SAMPLE_KEY_TEST").await.is_some());

        editor.commit().await.unwrap();

        assert_eq!(prefs.get_int(PreferenceKey::LaunchCount).await, 7);
        assert_eq!(prefs.get_string(PreferenceKey::SampleKeyTest).await, None);
    }

    #[tokio::test]
    async fn test_editor_rollback_and_drop_discard() {
        let (prefs, _) = manager();

        let mut editor = prefs.edit().await.unwrap();
        editor.put(PreferenceKey::LaunchCount, 1).await.unwrap();
        editor.rollback().await.unwrap();
        assert!(!prefs.contains(PreferenceKey::LaunchCount).await.unwrap());

        {
            let mut editor = prefs.edit().await.unwrap();
            editor.put(PreferenceKey::LaunchCount, 2).await.unwrap();
        }
        assert!(!prefs.contains(PreferenceKey::LaunchCount).await.unwrap());

        // Lock was released by the dropped editor
        prefs.put(PreferenceKey::LaunchCount, 3).await.unwrap();
        assert_eq!(prefs.get_int(PreferenceKey::LaunchCount).await, 3);
    }

    #[tokio::test]
    async fn test_editor_blocks_concurrent_writers() {
        let (prefs, _) = manager();

        let mut editor = prefs.edit().await.unwrap();
        editor.put(PreferenceKey::LaunchCount, 1).await.unwrap();

        let writer = {
            let prefs = prefs.clone();
            tokio::spawn(async move { prefs.put(PreferenceKey::LaunchCount, 2).await })
        };

        tokio::task::yield_now().await;
        assert!(!writer.is_finished());

        editor.commit().await.unwrap();
        writer.await.unwrap().unwrap();

        // The queued write lands after the batch
        assert_eq!(prefs.get_int(PreferenceKey::LaunchCount).await, 2);
    }

    #[tokio::test]
    async fn test_store_failure_returns_default() {
        let prefs = PreferencesManager::new(Arc::new(BrokenStore));

        assert_eq!(prefs.get_int_or(PreferenceKey::LaunchCount, 4).await, 4);
        assert_eq!(prefs.get_string(PreferenceKey::QuoteCategory).await, None);

        let err = prefs.put(PreferenceKey::LaunchCount, 1).await.unwrap_err();
        assert!(matches!(err, PreferencesError::Storage(BridgeError::DatabaseError(_))));
        assert!(prefs.edit().await.is_err());
    }
}
