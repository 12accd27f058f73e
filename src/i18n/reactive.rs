// SPDX-License-Identifier: MPL-2.0
//! The `.l10n()` entry point on localizable hosts.
//!
//! A host is any shared UI element that owns a [`BindingTable`]. Calling
//! `.l10n()` on an `Arc` of it returns a [`Reactive`] handle exposing one
//! binder per localizable property:
//!
//! ```
//! use reactive_l10n::i18n::{
//!     BindingTable, Localizable, LocalizableExt, Localization, Preferences, TableResolver,
//! };
//! use std::sync::{Arc, RwLock};
//!
//! struct Label {
//!     text: RwLock<String>,
//!     bindings: BindingTable,
//! }
//!
//! impl Localizable for Label {
//!     fn bindings(&self) -> &BindingTable {
//!         &self.bindings
//!     }
//! }
//!
//! let resolver = TableResolver::new()
//!     .with_system_language("en".parse()?)
//!     .with_entry("hello", "en", "Hello")?;
//! let l10n = Localization::new(Preferences::in_memory(), resolver);
//! let label = Arc::new(Label {
//!     text: RwLock::default(),
//!     bindings: BindingTable::with_context(&l10n),
//! });
//!
//! label
//!     .l10n()
//!     .text("text", |label: &Label, text| *label.text.write().unwrap() = text)
//!     .bind_key("hello");
//! assert_eq!(*label.text.read().unwrap(), "Hello");
//! # Ok::<(), reactive_l10n::error::Error>(())
//! ```
//!
//! Setters hold the host weakly. A binding never keeps its host alive, and a
//! delivery racing with the host's release does nothing.

use super::attributed::AttributedText;
use super::binding::{Binder, BindingId, BindingTable};
use std::sync::Arc;

/// A UI element whose properties can be bound to localizers.
pub trait Localizable: Send + Sync + 'static {
    /// The table holding this host's live bindings.
    fn bindings(&self) -> &BindingTable;
}

/// Adds `.l10n()` to shared localizable hosts.
pub trait LocalizableExt<H> {
    fn l10n(&self) -> Reactive<'_, H>;
}

impl<H: Localizable> LocalizableExt<H> for Arc<H> {
    fn l10n(&self) -> Reactive<'_, H> {
        Reactive { host: self }
    }
}

/// Binding handle for one host.
#[derive(Debug)]
pub struct Reactive<'a, H> {
    host: &'a Arc<H>,
}

impl<'a, H: Localizable> Reactive<'a, H> {
    #[must_use]
    pub fn host(&self) -> &Arc<H> {
        self.host
    }

    /// Binder for an arbitrary property, written through `setter`.
    pub fn binder<V: 'static>(
        &self,
        id: impl Into<BindingId>,
        setter: impl Fn(&H, V) + Send + Sync + 'static,
    ) -> Binder<'a, V> {
        let id = id.into();
        let host = Arc::downgrade(self.host);
        let released = id.clone();
        let target: &'a H = self.host;
        Binder::new(target.bindings(), id, move |value| match host.upgrade() {
            Some(host) => setter(&host, value),
            None => tracing::trace!(binding = %released, "host released, update skipped"),
        })
    }

    /// Binder for a plain text property.
    pub fn text(
        &self,
        id: impl Into<BindingId>,
        setter: impl Fn(&H, String) + Send + Sync + 'static,
    ) -> Binder<'a, String> {
        self.binder(id, setter)
    }

    /// Binder for a styled text property.
    pub fn attributed_content(
        &self,
        id: impl Into<BindingId>,
        setter: impl Fn(&H, AttributedText) + Send + Sync + 'static,
    ) -> Binder<'a, AttributedText> {
        self.binder(id, setter)
    }

    /// Cancels the binding under `id`. Returns whether one existed.
    pub fn unbind(&self, id: impl Into<BindingId>) -> bool {
        self.host.bindings().unbind(&id.into())
    }
}
