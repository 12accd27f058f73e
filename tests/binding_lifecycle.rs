// SPDX-License-Identifier: MPL-2.0
use reactive_l10n::i18n::{
    BindingTable, LanguagePreference, LanguageTag, Localizable, LocalizableExt, Localization,
    Localizer, MemoryStore, Preferences, QueuedDispatcher, TableResolver,
};
use reactive_l10n::localize;
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, Weak};
use std::thread;

struct Label {
    text: RwLock<String>,
    writes: AtomicUsize,
    bindings: BindingTable,
}

impl Label {
    fn with_bindings(bindings: BindingTable) -> Arc<Self> {
        Arc::new(Self {
            text: RwLock::default(),
            writes: AtomicUsize::new(0),
            bindings,
        })
    }

    fn set_text(&self, text: String) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.text.write().expect("text lock") = text;
    }

    fn text(&self) -> String {
        self.text.read().expect("text lock").clone()
    }
}

impl Localizable for Label {
    fn bindings(&self) -> &BindingTable {
        &self.bindings
    }
}

fn resolver() -> TableResolver {
    TableResolver::new()
        .with_system_language(LanguageTag::parse("en").expect("valid tag"))
        .with_entry("hello", "en", "Hello")
        .and_then(|r| r.with_entry("hello", "fr", "Bonjour"))
        .and_then(|r| r.with_entry("hello", "de", "Hallo"))
        .and_then(|r| r.with_entry("part-1", "en", "Part 1"))
        .and_then(|r| r.with_entry("part-2", "en", "Part 2"))
        .and_then(|r| r.with_entry("part-1", "fr", "Partie 1"))
        .and_then(|r| r.with_entry("part-2", "fr", "Partie 2"))
        .expect("valid entries")
}

fn specified(raw: &str) -> LanguagePreference {
    LanguagePreference::Specified(LanguageTag::parse(raw).expect("valid tag"))
}

#[test]
#[serial(global_localization)]
fn test_default_tables_use_the_global_context() {
    let l10n = Localization::new(Preferences::in_memory(), resolver());
    let previous = Localization::init(Arc::clone(&l10n));

    let label = Label::with_bindings(BindingTable::default());
    label
        .l10n()
        .text("text", Label::set_text)
        .bind(Localizer::pure("hello"));
    assert_eq!(label.text(), "Hello");

    l10n.set_preference(specified("fr"));
    assert_eq!(label.text(), "Bonjour");

    drop(label);
    assert_eq!(l10n.preferences().channel().subscriber_count(), 0);

    match previous {
        Some(previous) => {
            Localization::init(previous);
        }
        None => {
            Localization::reset();
        }
    }
}

#[test]
fn test_many_hosts_follow_every_switch() {
    let l10n = Localization::new(Preferences::in_memory(), resolver());
    let labels: Vec<Arc<Label>> = (0..32)
        .map(|_| {
            let label = Label::with_bindings(BindingTable::with_context(&l10n));
            label.l10n().text("text", Label::set_text).bind_key("hello");
            label
        })
        .collect();

    for (language, expected) in [("fr", "Bonjour"), ("de", "Hallo"), ("en", "Hello")] {
        l10n.set_preference(specified(language));
        assert!(labels.iter().all(|label| label.text() == expected));
    }
    assert!(labels
        .iter()
        .all(|label| label.writes.load(Ordering::SeqCst) == 4));
}

#[test]
fn test_dropping_hosts_releases_every_subscription() {
    let l10n = Localization::new(Preferences::in_memory(), resolver());
    let weak: Vec<Weak<Label>> = (0..8)
        .map(|_| {
            let label = Label::with_bindings(BindingTable::with_context(&l10n));
            label.l10n().text("text", Label::set_text).bind(localize!(
                l10n; "part-1", "part-2" => |a, b| format!("{} {}", a, b)
            ));
            Arc::downgrade(&label)
        })
        .collect();

    assert!(weak.iter().all(|label| label.upgrade().is_none()));
    assert_eq!(l10n.preferences().channel().subscriber_count(), 0);
    l10n.set_preference(specified("fr"));
}

#[test]
fn test_binding_from_inside_a_delivery() {
    let l10n = Localization::new(Preferences::in_memory(), resolver());
    let outer = Label::with_bindings(BindingTable::with_context(&l10n));
    let inner = Label::with_bindings(BindingTable::with_context(&l10n));

    let target = Arc::clone(&inner);
    let context = Arc::clone(&l10n);
    outer
        .l10n()
        .text("text", move |label: &Label, text| {
            label.set_text(text);
            // Re-binding another host while a delivery is running.
            target
                .l10n()
                .text("text", Label::set_text)
                .bind(context.pure("part-1"));
        })
        .bind_key("hello");
    assert_eq!(inner.text(), "Part 1");

    l10n.set_preference(specified("fr"));
    assert_eq!(outer.text(), "Bonjour");
    assert_eq!(inner.text(), "Partie 1");
    assert_eq!(inner.bindings.len(), 1);
}

#[test]
fn test_worker_thread_changes_apply_on_the_main_queue() {
    let (dispatcher, mut queue) = QueuedDispatcher::new();
    let l10n = Localization::new(
        Preferences::new(MemoryStore::new(), Arc::new(dispatcher)),
        resolver(),
    );
    let label = Label::with_bindings(BindingTable::with_context(&l10n));
    label.l10n().text("text", Label::set_text).bind_key("hello");

    let workers: Vec<_> = ["fr", "de"]
        .into_iter()
        .map(|language| {
            let l10n = Arc::clone(&l10n);
            thread::spawn(move || l10n.set_preference(specified(language)))
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker thread");
    }

    assert_eq!(label.text(), "Hello");
    assert_eq!(queue.run_pending(), 2);
    // Both deliveries read the final preference.
    let expected = match l10n.preference() {
        LanguagePreference::Specified(tag) if tag.language() == "fr" => "Bonjour",
        _ => "Hallo",
    };
    assert_eq!(label.text(), expected);
}

#[tokio::test]
async fn test_main_queue_runs_as_a_task() {
    let (dispatcher, queue) = QueuedDispatcher::new();
    let l10n = Localization::new(
        Preferences::new(MemoryStore::new(), Arc::new(dispatcher)),
        resolver(),
    );
    let label = Label::with_bindings(BindingTable::with_context(&l10n));
    label.l10n().text("text", Label::set_text).bind_key("hello");

    l10n.set_preference(specified("fr"));
    drop(l10n);
    drop(label);

    // Dropping the context closes the queue once its deliveries ran.
    tokio::time::timeout(std::time::Duration::from_secs(5), queue.run())
        .await
        .expect("queue drains and closes");
}
