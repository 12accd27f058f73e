// SPDX-License-Identifier: MPL-2.0
//! Per-host binding tables and the binders that fill them.
//!
//! A [`BindingTable`] maps a [`BindingId`] to the live subscription keeping
//! that property up to date. Binding an id that is already bound replaces the
//! previous subscription, so a property never has two live bindings.
//!
//! The table belongs to its host. Dropping the host drops the table, which
//! cancels every subscription in it.

use super::attributed::AttributedText;
use super::channel::Subscription;
use super::context::Localization;
use super::localizer::{Localizer, LookupKey};
use super::lock_unpoisoned;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

/// Names which property of a host a binding drives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(Cow<'static, str>);

impl BindingId {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Id for a property that exists once per `scope`, e.g. a button title per state.
    pub fn scoped(name: &str, scope: impl fmt::Display) -> Self {
        Self(Cow::Owned(format!("{}[{}]", name, scope)))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for BindingId {
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}

impl From<String> for BindingId {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Active bindings of one host.
pub struct BindingTable {
    context: OnceLock<Arc<Localization>>,
    subscriptions: Mutex<HashMap<BindingId, Subscription>>,
}

impl Default for BindingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl BindingTable {
    /// Creates a table bound to the global context, resolved on first use.
    #[must_use]
    pub fn new() -> Self {
        Self {
            context: OnceLock::new(),
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a table bound to `context`.
    #[must_use]
    pub fn with_context(context: &Arc<Localization>) -> Self {
        let table = Self::new();
        // A fresh OnceLock is always empty.
        let _ = table.context.set(Arc::clone(context));
        table
    }

    /// Returns the context keys are resolved in and changes are observed on.
    pub fn context(&self) -> &Arc<Localization> {
        self.context.get_or_init(Localization::global)
    }

    /// Runs `action` after every future preference change, replacing whatever
    /// was registered under `id`.
    pub fn perform_after_language_change(
        &self,
        id: BindingId,
        action: impl Fn() + Send + Sync + 'static,
    ) {
        let context = self.context();
        let mut subscriptions = lock_unpoisoned(&self.subscriptions);
        // Cancel before subscribing so the id never has two live subscriptions.
        let replaced = subscriptions.remove(&id).is_some();
        let subscription = context.subscribe(action);
        tracing::trace!(binding = %id, replaced, "binding registered");
        subscriptions.insert(id, subscription);
    }

    /// Cancels the binding under `id`. Returns whether one existed.
    pub fn unbind(&self, id: &BindingId) -> bool {
        let removed = lock_unpoisoned(&self.subscriptions).remove(id);
        removed.is_some()
    }

    #[must_use]
    pub fn is_bound(&self, id: &BindingId) -> bool {
        lock_unpoisoned(&self.subscriptions).contains_key(id)
    }

    /// Number of live bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        lock_unpoisoned(&self.subscriptions).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cancels every binding.
    pub fn clear(&self) {
        let drained: Vec<Subscription> = lock_unpoisoned(&self.subscriptions)
            .drain()
            .map(|(_, subscription)| subscription)
            .collect();
        drop(drained);
    }
}

impl fmt::Debug for BindingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<BindingId> = lock_unpoisoned(&self.subscriptions).keys().cloned().collect();
        ids.sort();
        f.debug_struct("BindingTable").field("bindings", &ids).finish()
    }
}

/// Binds localizers to one property.
///
/// The setter is applied immediately on [`bind`](Self::bind), then again after
/// every preference change until the binding is replaced or its table dropped.
pub struct Binder<'a, V> {
    table: &'a BindingTable,
    id: BindingId,
    setter: Arc<dyn Fn(V) + Send + Sync>,
}

impl<'a, V: 'static> Binder<'a, V> {
    pub fn new(
        table: &'a BindingTable,
        id: impl Into<BindingId>,
        setter: impl Fn(V) + Send + Sync + 'static,
    ) -> Self {
        Self {
            table,
            id: id.into(),
            setter: Arc::new(setter),
        }
    }

    #[must_use]
    pub fn id(&self) -> &BindingId {
        &self.id
    }

    /// Applies `localizer` now and after every preference change.
    ///
    /// Replaces any earlier binding of the same property.
    pub fn bind(&self, localizer: Localizer<V>) {
        (self.setter)(localizer.localize());

        let setter = Arc::clone(&self.setter);
        self.table
            .perform_after_language_change(self.id.clone(), move || setter(localizer.localize()));
    }

    /// Cancels this property's binding. Returns whether one existed.
    pub fn unbind(&self) -> bool {
        self.table.unbind(&self.id)
    }
}

impl Binder<'_, String> {
    /// Binds the localized text of `key`.
    pub fn bind_key(&self, key: impl Into<LookupKey>) {
        self.bind(self.table.context().pure(key));
    }
}

impl Binder<'_, AttributedText> {
    /// Binds the localized text of `key` as unstyled content.
    pub fn bind_key(&self, key: impl Into<LookupKey>) {
        self.bind(self.table.context().pure(key).map(AttributedText::from));
    }
}

impl<V> fmt::Debug for Binder<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder").field("id", &self.id).finish_non_exhaustive()
    }
}
