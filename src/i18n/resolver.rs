// SPDX-License-Identifier: MPL-2.0
//! Key to text resolution.
//!
//! A [`StringResolver`] turns `(key, table, bundle, preference)` into text.
//! Resolvers never fail: a key with no entry resolves to itself.

use super::language::{LanguagePreference, LanguageTag};
use crate::config::{DEFAULT_BUNDLE, DEFAULT_TABLE};
use crate::error::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Resolves lookup keys against localized resources.
///
/// Implementations must be deterministic for a fixed input and return the key
/// itself when no entry exists.
pub trait StringResolver: Send + Sync {
    fn resolve(
        &self,
        key: &str,
        table: Option<&str>,
        bundle: Option<&str>,
        preference: &LanguagePreference,
    ) -> String;

    /// Languages that can be offered for explicit selection.
    fn available_languages(&self) -> Vec<LanguageTag> {
        Vec::new()
    }
}

impl<R: StringResolver + ?Sized> StringResolver for Arc<R> {
    fn resolve(
        &self,
        key: &str,
        table: Option<&str>,
        bundle: Option<&str>,
        preference: &LanguagePreference,
    ) -> String {
        (**self).resolve(key, table, bundle, preference)
    }

    fn available_languages(&self) -> Vec<LanguageTag> {
        (**self).available_languages()
    }
}

// =============================================================================
// Language Negotiation
// =============================================================================

/// Where `FollowSystem` gets its language from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SystemLocale {
    /// Ask the operating system on every resolution.
    #[default]
    Detect,
    /// Pretend the system language is this one.
    Fixed(LanguageTag),
}

impl SystemLocale {
    #[must_use]
    pub fn current(&self) -> Option<LanguageTag> {
        match self {
            Self::Detect => sys_locale::get_locale().and_then(|raw| LanguageTag::parse(&raw).ok()),
            Self::Fixed(tag) => Some(tag.clone()),
        }
    }
}

/// Languages to try for `preference`, most preferred first.
pub(crate) fn candidates(
    preference: &LanguagePreference,
    system: &SystemLocale,
    fallback: Option<&LanguageTag>,
) -> Vec<LanguageTag> {
    let mut candidates = Vec::with_capacity(2);
    match preference {
        LanguagePreference::Specified(tag) => candidates.push(tag.clone()),
        LanguagePreference::FollowSystem => candidates.extend(system.current()),
    }
    if let Some(fallback) = fallback {
        if !candidates.contains(fallback) {
            candidates.push(fallback.clone());
        }
    }
    candidates
}

/// Picks the best of `available` for `requested`.
///
/// Exact match first, then the bare language (e.g., "fr" for "fr-CA"), then
/// any regional variant of the same language.
pub fn negotiate<'a>(requested: &LanguageTag, available: &'a [LanguageTag]) -> Option<&'a LanguageTag> {
    if let Some(exact) = available.iter().find(|tag| *tag == requested) {
        return Some(exact);
    }
    let bare = requested.without_region();
    if let Some(language_only) = available.iter().find(|tag| **tag == bare) {
        return Some(language_only);
    }
    available
        .iter()
        .find(|tag| tag.language() == requested.language())
}

// =============================================================================
// TableResolver
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EntryKey {
    bundle: String,
    table: String,
    key: String,
}

/// In-memory string table.
///
/// ```
/// use reactive_l10n::i18n::{LanguagePreference, StringResolver, TableResolver};
///
/// let resolver = TableResolver::new()
///     .with_entry("hello", "en", "Hello")?
///     .with_entry("hello", "fr", "Bonjour")?;
///
/// let french = LanguagePreference::Specified("fr".parse()?);
/// assert_eq!(resolver.resolve("hello", None, None, &french), "Bonjour");
/// assert_eq!(resolver.resolve("missing", None, None, &french), "missing");
/// # Ok::<(), reactive_l10n::error::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableResolver {
    entries: HashMap<EntryKey, Vec<(LanguageTag, String)>>,
    system: SystemLocale,
    fallback: Option<LanguageTag>,
}

impl TableResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixes the language used for `FollowSystem`.
    #[must_use]
    pub fn with_system_language(mut self, language: LanguageTag) -> Self {
        self.system = SystemLocale::Fixed(language);
        self
    }

    /// Language consulted when the preferred one has no entry for a key.
    #[must_use]
    pub fn with_fallback(mut self, language: LanguageTag) -> Self {
        self.fallback = Some(language);
        self
    }

    /// Adds an entry to the default table of the default bundle.
    pub fn with_entry(mut self, key: &str, language: &str, text: &str) -> Result<Self> {
        self.insert(DEFAULT_BUNDLE, DEFAULT_TABLE, key, LanguageTag::parse(language)?, text);
        Ok(self)
    }

    /// Adds or replaces an entry.
    pub fn insert(
        &mut self,
        bundle: &str,
        table: &str,
        key: &str,
        language: LanguageTag,
        text: impl Into<String>,
    ) {
        let translations = self
            .entries
            .entry(EntryKey {
                bundle: bundle.to_string(),
                table: table.to_string(),
                key: key.to_string(),
            })
            .or_default();
        let text = text.into();
        match translations.iter_mut().find(|(tag, _)| *tag == language) {
            Some(entry) => entry.1 = text,
            None => translations.push((language, text)),
        }
    }
}

impl StringResolver for TableResolver {
    fn resolve(
        &self,
        key: &str,
        table: Option<&str>,
        bundle: Option<&str>,
        preference: &LanguagePreference,
    ) -> String {
        let entry_key = EntryKey {
            bundle: bundle.unwrap_or(DEFAULT_BUNDLE).to_string(),
            table: table.unwrap_or(DEFAULT_TABLE).to_string(),
            key: key.to_string(),
        };
        let Some(translations) = self.entries.get(&entry_key) else {
            tracing::trace!(key, "no entry, falling back to key");
            return key.to_string();
        };

        let languages: Vec<LanguageTag> = translations.iter().map(|(tag, _)| tag.clone()).collect();
        for candidate in candidates(preference, &self.system, self.fallback.as_ref()) {
            if let Some(language) = negotiate(&candidate, &languages) {
                if let Some((_, text)) = translations.iter().find(|(tag, _)| tag == language) {
                    return text.clone();
                }
            }
        }
        tracing::trace!(key, %preference, "no translation for preference, falling back to key");
        key.to_string()
    }

    fn available_languages(&self) -> Vec<LanguageTag> {
        let mut languages: Vec<LanguageTag> = self
            .entries
            .values()
            .flat_map(|translations| translations.iter().map(|(tag, _)| tag.clone()))
            .collect();
        languages.sort_by_key(ToString::to_string);
        languages.dedup();
        languages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(raw: &str) -> LanguageTag {
        LanguageTag::parse(raw).expect("valid tag")
    }

    fn greetings() -> TableResolver {
        TableResolver::new()
            .with_system_language(tag("en"))
            .with_entry("hello", "en", "Hello")
            .and_then(|r| r.with_entry("hello", "fr", "Bonjour"))
            .and_then(|r| r.with_entry("bye", "en", "Goodbye"))
            .expect("valid entries")
    }

    #[test]
    fn negotiate_prefers_exact_then_language_only_then_regional() {
        let available = vec![tag("fr"), tag("fr-CA"), tag("pt-BR")];
        assert_eq!(negotiate(&tag("fr-CA"), &available), Some(&tag("fr-CA")));
        assert_eq!(negotiate(&tag("fr-BE"), &available), Some(&tag("fr")));
        assert_eq!(negotiate(&tag("pt-PT"), &available), Some(&tag("pt-BR")));
        assert_eq!(negotiate(&tag("de"), &available), None);
    }

    #[test]
    fn follow_system_uses_the_system_language() {
        let resolver = greetings().with_system_language(tag("fr-FR"));
        assert_eq!(
            resolver.resolve("hello", None, None, &LanguagePreference::FollowSystem),
            "Bonjour"
        );
    }

    #[test]
    fn specified_language_wins_over_system() {
        let french = LanguagePreference::Specified(tag("fr"));
        assert_eq!(greetings().resolve("hello", None, None, &french), "Bonjour");
    }

    #[test]
    fn missing_key_resolves_to_itself() {
        let french = LanguagePreference::Specified(tag("fr"));
        assert_eq!(greetings().resolve("nope", None, None, &french), "nope");
    }

    #[test]
    fn missing_translation_uses_fallback_language_when_configured() {
        let french = LanguagePreference::Specified(tag("fr"));
        assert_eq!(greetings().resolve("bye", None, None, &french), "bye");

        let with_fallback = greetings().with_fallback(tag("en"));
        assert_eq!(with_fallback.resolve("bye", None, None, &french), "Goodbye");
    }

    #[test]
    fn tables_and_bundles_are_separate_namespaces() {
        let mut resolver = greetings();
        resolver.insert("main", "Menu", "hello", tag("en"), "Hi there");
        resolver.insert("plugin", DEFAULT_TABLE, "hello", tag("en"), "Howdy");
        let english = LanguagePreference::Specified(tag("en"));

        assert_eq!(resolver.resolve("hello", Some("Menu"), None, &english), "Hi there");
        assert_eq!(resolver.resolve("hello", None, Some("plugin"), &english), "Howdy");
        assert_eq!(resolver.resolve("hello", None, None, &english), "Hello");
    }

    #[test]
    fn insert_replaces_existing_translation() {
        let mut resolver = greetings();
        resolver.insert(DEFAULT_BUNDLE, DEFAULT_TABLE, "hello", tag("en"), "Hey");
        let english = LanguagePreference::Specified(tag("en"));
        assert_eq!(resolver.resolve("hello", None, None, &english), "Hey");
    }

    #[test]
    fn available_languages_are_sorted_and_unique() {
        assert_eq!(greetings().available_languages(), vec![tag("en"), tag("fr")]);
    }

    #[test]
    fn candidates_do_not_repeat_the_fallback() {
        let english = tag("en");
        let list = candidates(
            &LanguagePreference::Specified(english.clone()),
            &SystemLocale::Detect,
            Some(&english),
        );
        assert_eq!(list, vec![english]);
    }
}
