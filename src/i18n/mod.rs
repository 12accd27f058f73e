// SPDX-License-Identifier: MPL-2.0
//! Reactive localization.
//!
//! This module binds UI properties to lazily evaluated localized values and
//! re-applies them whenever the in-app language preference changes.
//!
//! # Building blocks
//!
//! - [`Localizer`]: a deferred, composable computation producing a localized value
//! - [`Preferences`]: the persisted language choice and its change channel
//! - [`StringResolver`]: key lookup, backed by Fluent resources or an in-memory table
//! - [`Localization`]: the context tying a resolver to a preference store
//! - [`BindingTable`] and [`LocalizableExt::l10n`]: per-host live bindings
//!
//! Changing the preference notifies every binding, which re-runs its localizer
//! and writes the result through its setter on the UI execution context chosen
//! by the preference store's [`Dispatcher`].

pub mod attributed;
pub mod binding;
pub mod builder;
pub mod channel;
pub mod context;
pub mod fluent;
pub mod language;
pub mod localizer;
pub mod preference;
pub mod reactive;
pub mod resolver;
pub mod store;

pub use attributed::{Attribute, AttributeRun, AttributedText, Rgba};
pub use binding::{Binder, BindingId, BindingTable};
pub use builder::LocalizerGroup;
pub use channel::{
    ChangeChannel, Dispatcher, InlineDispatcher, MainQueue, QueuedDispatcher, Subscription,
};
pub use context::Localization;
pub use fluent::FluentResolver;
pub use language::{LanguagePreference, LanguageTag};
pub use localizer::{Localizer, LookupKey};
pub use preference::Preferences;
pub use reactive::{Localizable, LocalizableExt, Reactive};
pub use resolver::{negotiate, StringResolver, SystemLocale, TableResolver};
pub use store::{ConfigStore, KeyValueStore, MemoryStore};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks `mutex`, recovering the data if a previous holder panicked.
///
/// Subscriber lists stay consistent across a panicking callback since no
/// callback runs while they are locked.
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
