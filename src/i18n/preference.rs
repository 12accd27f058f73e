// SPDX-License-Identifier: MPL-2.0
//! The language preference store.
//!
//! [`Preferences`] keeps an in-memory copy of the persisted selection so that
//! reads are cheap and never torn. Writes go to the backing store first, then
//! the copy is updated, then exactly one change event is published. Concurrent
//! writes are serialized so the stored and in-memory selections always agree.
//!
//! A failed write switches the store to memory-only for the rest of its life:
//! the selection still changes and listeners are still notified.

use super::channel::{ChangeChannel, Dispatcher, InlineDispatcher, Subscription};
use super::language::LanguagePreference;
use super::lock_unpoisoned;
use super::store::{KeyValueStore, MemoryStore};
use crate::config::SPECIFIED_LANGUAGE_KEY;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Process-wide language selection with change notification.
pub struct Preferences {
    backing: Box<dyn KeyValueStore>,
    current: RwLock<LanguagePreference>,
    write_lock: Mutex<()>,
    memory_only: AtomicBool,
    channel: ChangeChannel,
}

impl Preferences {
    /// Loads the current selection from `backing` and delivers change events
    /// through `dispatcher`.
    pub fn new(backing: impl KeyValueStore + 'static, dispatcher: Arc<dyn Dispatcher>) -> Self {
        let (current, memory_only) = match backing.get_string(SPECIFIED_LANGUAGE_KEY) {
            Ok(value) => (LanguagePreference::from_persisted(value.as_deref()), false),
            Err(error) => {
                tracing::warn!(%error, "cannot read language preference, keeping it in memory");
                (LanguagePreference::FollowSystem, true)
            }
        };
        tracing::debug!(preference = %current, "language preference loaded");

        Self {
            backing: Box::new(backing),
            current: RwLock::new(current),
            write_lock: Mutex::new(()),
            memory_only: AtomicBool::new(memory_only),
            channel: ChangeChannel::new(dispatcher),
        }
    }

    /// Memory-backed store delivering events inline. Starts at `FollowSystem`.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new(), Arc::new(InlineDispatcher))
    }

    /// Returns the current selection.
    #[must_use]
    pub fn get(&self) -> LanguagePreference {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Persists `preference` and publishes one change event.
    pub fn set(&self, preference: LanguagePreference) {
        {
            let _guard = lock_unpoisoned(&self.write_lock);
            self.persist(&preference);
            *self
                .current
                .write()
                .unwrap_or_else(PoisonError::into_inner) = preference;
        }
        // Listeners run with no lock held and may call `set` again.
        self.channel.publish();
    }

    /// Registers `callback` to run after every future [`set`](Self::set).
    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.channel.subscribe(callback)
    }

    /// Returns the channel change events are published on.
    #[must_use]
    pub fn channel(&self) -> &ChangeChannel {
        &self.channel
    }

    /// Returns whether a persistence failure switched the store to memory-only.
    #[must_use]
    pub fn is_memory_only(&self) -> bool {
        self.memory_only.load(Ordering::Acquire)
    }

    fn persist(&self, preference: &LanguagePreference) {
        if self.is_memory_only() {
            return;
        }
        let value = preference.to_persisted();
        if let Err(error) = self
            .backing
            .set_string(SPECIFIED_LANGUAGE_KEY, value.as_deref())
        {
            tracing::warn!(%error, %preference, "failed to persist language preference, keeping it in memory");
            self.memory_only.store(true, Ordering::Release);
        }
    }
}

impl fmt::Debug for Preferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preferences")
            .field("current", &self.get())
            .field("memory_only", &self.is_memory_only())
            .field("channel", &self.channel)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::i18n::channel::QueuedDispatcher;
    use crate::i18n::language::LanguageTag;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;
    use std::time::Duration;

    fn french() -> LanguagePreference {
        LanguagePreference::Specified(LanguageTag::parse("fr").expect("valid tag"))
    }

    /// Store whose writes fail, counting the attempts.
    #[derive(Default)]
    struct FailingStore {
        writes: Arc<AtomicUsize>,
    }

    impl KeyValueStore for FailingStore {
        fn get_string(&self, _name: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set_string(&self, _name: &str, _value: Option<&str>) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Err(Error::Io("read-only file system".to_string()))
        }
    }

    #[test]
    fn get_defaults_to_follow_system() {
        assert_eq!(Preferences::in_memory().get(), LanguagePreference::FollowSystem);
    }

    #[test]
    fn get_reads_persisted_tag() {
        let store = MemoryStore::with_value(SPECIFIED_LANGUAGE_KEY, "fr");
        let preferences = Preferences::new(store, Arc::new(InlineDispatcher));
        assert_eq!(preferences.get(), french());
    }

    #[test]
    fn empty_persisted_tag_follows_system() {
        let store = MemoryStore::with_value(SPECIFIED_LANGUAGE_KEY, "");
        let preferences = Preferences::new(store, Arc::new(InlineDispatcher));
        assert_eq!(preferences.get(), LanguagePreference::FollowSystem);
    }

    #[test]
    fn set_publishes_exactly_one_event_after_the_value_is_visible() {
        let preferences = Arc::new(Preferences::in_memory());
        let observed = Arc::new(Mutex::new(Vec::new()));

        let reader = Arc::downgrade(&preferences);
        let record = Arc::clone(&observed);
        let _subscription = preferences.subscribe(move || {
            if let Some(preferences) = reader.upgrade() {
                record.lock().expect("record lock").push(preferences.get());
            }
        });

        preferences.set(french());
        preferences.set(LanguagePreference::FollowSystem);

        let observed = observed.lock().expect("record lock");
        assert_eq!(
            observed.as_slice(),
            &[french(), LanguagePreference::FollowSystem]
        );
        assert_eq!(preferences.channel().published(), 2);
    }

    #[test]
    fn follow_system_clears_the_persisted_tag() {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = temp_dir.path().join("settings.toml");
        let preferences = Preferences::new(
            crate::i18n::store::ConfigStore::new(&path),
            Arc::new(InlineDispatcher),
        );

        preferences.set(french());
        let reopened = crate::i18n::store::ConfigStore::new(&path);
        assert_eq!(
            reopened.get_string(SPECIFIED_LANGUAGE_KEY).expect("read").as_deref(),
            Some("fr")
        );

        preferences.set(LanguagePreference::FollowSystem);
        assert_eq!(reopened.get_string(SPECIFIED_LANGUAGE_KEY).expect("read"), None);
    }

    #[test]
    fn persistence_failure_falls_back_to_memory() {
        let store = FailingStore::default();
        let writes = Arc::clone(&store.writes);
        let preferences = Preferences::new(store, Arc::new(InlineDispatcher));
        let events = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&events);
        let _subscription = preferences.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        preferences.set(french());
        assert!(preferences.is_memory_only());
        assert_eq!(preferences.get(), french());
        assert_eq!(events.load(Ordering::SeqCst), 1);

        // No further attempts once degraded.
        preferences.set(LanguagePreference::FollowSystem);
        assert_eq!(writes.load(Ordering::SeqCst), 1);
        assert_eq!(preferences.get(), LanguagePreference::FollowSystem);
        assert_eq!(events.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn set_from_worker_thread_is_delivered_on_main_queue() {
        let (dispatcher, mut queue) = QueuedDispatcher::new();
        let preferences = Arc::new(Preferences::new(MemoryStore::new(), Arc::new(dispatcher)));
        let events = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&events);
        let _subscription = preferences.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let worker = Arc::clone(&preferences);
        std::thread::spawn(move || worker.set(french()))
            .join()
            .expect("worker thread");

        assert_eq!(preferences.get(), french());
        assert_eq!(events.load(Ordering::SeqCst), 0);
        queue.run_pending();
        assert_eq!(events.load(Ordering::SeqCst), 1);
    }

    /// Store recording the last write. The first write parks on `entered`
    /// and then takes a while to complete.
    struct SlowStore {
        saved: Arc<Mutex<Option<String>>>,
        entered: Arc<Barrier>,
        first: AtomicBool,
    }

    impl KeyValueStore for SlowStore {
        fn get_string(&self, _name: &str) -> Result<Option<String>> {
            Ok(self.saved.lock().expect("saved lock").clone())
        }

        fn set_string(&self, _name: &str, value: Option<&str>) -> Result<()> {
            if self.first.swap(false, Ordering::SeqCst) {
                self.entered.wait();
                std::thread::sleep(Duration::from_millis(100));
            }
            *self.saved.lock().expect("saved lock") = value.map(str::to_string);
            Ok(())
        }
    }

    #[test]
    fn concurrent_sets_keep_store_and_memory_in_agreement() {
        let saved = Arc::new(Mutex::new(None));
        let entered = Arc::new(Barrier::new(2));
        let store = SlowStore {
            saved: Arc::clone(&saved),
            entered: Arc::clone(&entered),
            first: AtomicBool::new(true),
        };
        let preferences = Arc::new(Preferences::new(store, Arc::new(InlineDispatcher)));

        let worker = Arc::clone(&preferences);
        let handle = std::thread::spawn(move || worker.set(french()));
        // The worker is now inside its slow write.
        entered.wait();
        let german = LanguagePreference::Specified(LanguageTag::parse("de").expect("valid tag"));
        preferences.set(german.clone());
        handle.join().expect("worker thread");

        assert_eq!(preferences.get(), german);
        assert_eq!(saved.lock().expect("saved lock").as_deref(), Some("de"));
        assert_eq!(preferences.channel().published(), 2);
    }
}
