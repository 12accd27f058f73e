// SPDX-License-Identifier: MPL-2.0
//! The localization context: preference store, resolver and lookup defaults.
//!
//! Applications usually rely on the process-wide context returned by
//! [`Localization::global`], built lazily from `settings.toml` and the
//! embedded resources. Tests build their own instances with
//! [`Localization::new`], or swap the global one with [`Localization::init`]
//! and [`Localization::reset`].

use super::channel::{Dispatcher, InlineDispatcher, MainQueue, QueuedDispatcher, Subscription};
use super::fluent::FluentResolver;
use super::language::{LanguagePreference, LanguageTag};
use super::localizer::{Localizer, LookupKey};
use super::preference::Preferences;
use super::resolver::{negotiate, StringResolver};
use super::store::{ConfigStore, KeyValueStore, MemoryStore};
use crate::config::{self, Config, DEFAULT_BUNDLE, DEFAULT_TABLE};
use crate::error::Result;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

static GLOBAL: RwLock<Option<Arc<Localization>>> = RwLock::new(None);

/// Everything a [`Localizer`] built from a key needs at run time.
pub struct Localization {
    preferences: Preferences,
    resolver: Box<dyn StringResolver>,
    default_table: String,
    default_bundle: String,
}

impl Localization {
    /// Creates a context using the built-in default table and bundle.
    pub fn new(preferences: Preferences, resolver: impl StringResolver + 'static) -> Arc<Self> {
        Self::with_defaults(preferences, resolver, DEFAULT_TABLE, DEFAULT_BUNDLE)
    }

    /// Creates a context with explicit lookup defaults.
    pub fn with_defaults(
        preferences: Preferences,
        resolver: impl StringResolver + 'static,
        default_table: impl Into<String>,
        default_bundle: impl Into<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            preferences,
            resolver: Box::new(resolver),
            default_table: default_table.into(),
            default_bundle: default_bundle.into(),
        })
    }

    /// Builds the Fluent-backed context described by `config`.
    ///
    /// The embedded resources and, when configured, `resources_dir` are loaded
    /// into the default bundle.
    pub fn from_config(
        config: &Config,
        store: impl KeyValueStore + 'static,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Result<Arc<Self>> {
        let settings = &config.localization;
        let mut resolver =
            FluentResolver::new().with_fallback(LanguageTag::parse(&settings.fallback_language)?);
        resolver.load_embedded(&settings.default_bundle)?;
        if let Some(dir) = &settings.resources_dir {
            resolver.load_dir(&settings.default_bundle, dir)?;
        }

        Ok(Self::with_defaults(
            Preferences::new(store, dispatcher),
            resolver,
            settings.default_table.clone(),
            settings.default_bundle.clone(),
        ))
    }

    // =========================================================================
    // Process-wide context
    // =========================================================================

    /// Returns the process-wide context, building it on first use.
    ///
    /// A context built here delivers change events inline, on whichever thread
    /// changed the preference. Call [`init_queued`](Self::init_queued) at startup
    /// when the preference may change off the UI thread.
    pub fn global() -> Arc<Self> {
        if let Some(context) = GLOBAL
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Arc::clone(context);
        }

        let mut slot = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slot.get_or_insert_with(|| Self::bootstrap(Arc::new(InlineDispatcher))))
    }

    /// Installs a process-wide context built from `settings.toml` whose change
    /// events go to the returned queue, to be drained on the UI thread.
    pub fn init_queued() -> MainQueue {
        let (dispatcher, queue) = QueuedDispatcher::new();
        if Self::init(Self::bootstrap(Arc::new(dispatcher))).is_some() {
            tracing::debug!("replaced the process-wide localization context");
        }
        queue
    }

    /// Installs `context` as the process-wide context, returning the previous one.
    ///
    /// Localizers and bindings created earlier keep the context they captured.
    pub fn init(context: Arc<Self>) -> Option<Arc<Self>> {
        GLOBAL
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(context)
    }

    /// Forgets the process-wide context; the next [`global`](Self::global)
    /// builds a fresh one.
    pub fn reset() -> Option<Arc<Self>> {
        GLOBAL.write().unwrap_or_else(PoisonError::into_inner).take()
    }

    fn bootstrap(dispatcher: Arc<dyn Dispatcher>) -> Arc<Self> {
        let (config, warning) = config::load();
        if let Some(warning) = warning {
            tracing::warn!(%warning, "using default localization settings");
        }
        let built = match ConfigStore::with_override(None) {
            Ok(store) => Self::from_config(&config, store, Arc::clone(&dispatcher)),
            Err(error) => {
                tracing::warn!(%error, "language preference will not be persisted");
                Self::from_config(&config, MemoryStore::new(), Arc::clone(&dispatcher))
            }
        };
        built.unwrap_or_else(|error| {
            tracing::warn!(%error, "failed to load localization resources, keys will be shown");
            Self::new(
                Preferences::new(MemoryStore::new(), dispatcher),
                FluentResolver::new(),
            )
        })
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Returns a localizer resolving `key` with the preference current at each run.
    pub fn pure(self: &Arc<Self>, key: impl Into<LookupKey>) -> Localizer<String> {
        let key = key.into();
        let context = Arc::clone(self);
        Localizer::from_fn(move || context.resolve(&key))
    }

    /// Resolves `key` once, for the current preference.
    #[must_use]
    pub fn resolve(&self, key: &LookupKey) -> String {
        let preference = self.preferences.get();
        self.resolver.resolve(
            key.key(),
            Some(key.table().unwrap_or(&self.default_table)),
            Some(key.bundle().unwrap_or(&self.default_bundle)),
            &preference,
        )
    }

    // =========================================================================
    // Preference
    // =========================================================================

    #[must_use]
    pub fn preference(&self) -> LanguagePreference {
        self.preferences.get()
    }

    /// Changes the preference; every binding re-applies once delivered.
    pub fn set_preference(&self, preference: LanguagePreference) {
        if let Some(tag) = preference.language() {
            if !self.is_available(tag) {
                tracing::warn!(%tag, "selected language has no resources, keys may show");
            }
        }
        self.preferences.set(preference);
    }

    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.preferences.subscribe(callback)
    }

    #[must_use]
    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Languages the resolver can serve.
    #[must_use]
    pub fn available_languages(&self) -> Vec<LanguageTag> {
        self.resolver.available_languages()
    }

    /// Returns whether `tag` negotiates to an available language.
    #[must_use]
    pub fn is_available(&self, tag: &LanguageTag) -> bool {
        negotiate(tag, &self.available_languages()).is_some()
    }

    #[must_use]
    pub fn default_table(&self) -> &str {
        &self.default_table
    }

    #[must_use]
    pub fn default_bundle(&self) -> &str {
        &self.default_bundle
    }
}

impl fmt::Debug for Localization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Localization")
            .field("preferences", &self.preferences)
            .field("default_table", &self.default_table)
            .field("default_bundle", &self.default_bundle)
            .finish_non_exhaustive()
    }
}
