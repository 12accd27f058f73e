// SPDX-License-Identifier: MPL-2.0
//! Lazy, composable producers of localized values.
//!
//! A [`Localizer`] is a deferred computation. Nothing is resolved until
//! [`Localizer::localize`] runs, and every run reads the language preference
//! afresh, so re-running a bound localizer after a preference change yields
//! text in the new language.
//!
//! ```
//! use reactive_l10n::i18n::{Localization, Localizer, Preferences, TableResolver};
//!
//! let resolver = TableResolver::new()
//!     .with_entry("part-1", "en", "Part 1")?
//!     .with_entry("part-2", "en", "Part 2")?
//!     .with_system_language("en".parse()?);
//! let l10n = Localization::new(Preferences::in_memory(), resolver);
//!
//! let title: Localizer<String> = l10n
//!     .pure("part-1")
//!     .combine(l10n.pure("part-2"))
//!     .map(|(a, b)| format!("{} {}", a, b));
//! assert_eq!(title.localize(), "Part 1 Part 2");
//! # Ok::<(), reactive_l10n::error::Error>(())
//! ```

use super::context::Localization;
use std::fmt;
use std::sync::Arc;

/// A deferred computation producing a `T`.
///
/// Cloning is cheap and clones share the same computation.
pub struct Localizer<T> {
    thunk: Arc<dyn Fn() -> T + Send + Sync>,
}

impl<T> Clone for Localizer<T> {
    fn clone(&self) -> Self {
        Self {
            thunk: Arc::clone(&self.thunk),
        }
    }
}

impl<T: 'static> Localizer<T> {
    /// Wraps a closure.
    pub fn from_fn(thunk: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            thunk: Arc::new(thunk),
        }
    }

    /// Runs the computation.
    pub fn localize(&self) -> T {
        (self.thunk)()
    }

    /// Returns a localizer producing `transform` applied to this one's output.
    #[must_use]
    pub fn map<U: 'static>(self, transform: impl Fn(T) -> U + Send + Sync + 'static) -> Localizer<U> {
        Localizer::from_fn(move || transform(self.localize()))
    }

    /// Returns a localizer that feeds this one's output to `transform` and
    /// runs the localizer it returns.
    #[must_use]
    pub fn flat_map<U: 'static>(
        self,
        transform: impl Fn(T) -> Localizer<U> + Send + Sync + 'static,
    ) -> Localizer<U> {
        Localizer::from_fn(move || transform(self.localize()).localize())
    }

    /// Pairs this localizer's output with `other`'s. This one runs first.
    #[must_use]
    pub fn combine<U: 'static>(self, other: Localizer<U>) -> Localizer<(T, U)> {
        Localizer::from_fn(move || {
            let first = self.localize();
            (first, other.localize())
        })
    }

    /// Three-way [`combine`](Self::combine). Runs self, `second`, `third` in order.
    #[must_use]
    pub fn combine3<U: 'static, V: 'static>(
        self,
        second: Localizer<U>,
        third: Localizer<V>,
    ) -> Localizer<(T, U, V)> {
        Localizer::from_fn(move || {
            let first = self.localize();
            let second = second.localize();
            (first, second, third.localize())
        })
    }

    /// Runs every localizer of `list` in order and collects the outputs.
    ///
    /// An empty list yields an empty vector.
    pub fn combine_all(list: impl IntoIterator<Item = Localizer<T>>) -> Localizer<Vec<T>> {
        let list: Vec<Localizer<T>> = list.into_iter().collect();
        Localizer::from_fn(move || list.iter().map(Localizer::localize).collect())
    }
}

impl<T: Clone + Send + Sync + 'static> Localizer<T> {
    /// A localizer that always produces `value`.
    pub fn just(value: T) -> Self {
        Self::from_fn(move || value.clone())
    }
}

impl Localizer<String> {
    /// Localized text for `key` through the global [`Localization`].
    ///
    /// The global context is captured now; the language is read on every run.
    pub fn pure(key: impl Into<LookupKey>) -> Self {
        Localization::global().pure(key)
    }
}

impl<T: 'static> FromIterator<Localizer<T>> for Localizer<Vec<T>> {
    fn from_iter<I: IntoIterator<Item = Localizer<T>>>(iter: I) -> Self {
        Localizer::combine_all(iter)
    }
}

impl<T> fmt::Debug for Localizer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Localizer")
            .field("output", &std::any::type_name::<T>())
            .finish()
    }
}

/// A key plus the optional table and bundle it lives in.
///
/// Unset table and bundle mean the context defaults.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey {
    key: String,
    table: Option<String>,
    bundle: Option<String>,
}

impl LookupKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            table: None,
            bundle: None,
        }
    }

    #[must_use]
    pub fn in_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    #[must_use]
    pub fn in_bundle(mut self, bundle: impl Into<String>) -> Self {
        self.bundle = Some(bundle.into());
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    #[must_use]
    pub fn bundle(&self) -> Option<&str> {
        self.bundle.as_deref()
    }
}

impl From<&str> for LookupKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for LookupKey {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}
