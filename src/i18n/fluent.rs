// SPDX-License-Identifier: MPL-2.0
//! Fluent-backed [`StringResolver`].
//!
//! Resources are grouped by bundle identifier and table. On disk (and in the
//! embedded assets) a table is a directory holding one `.ftl` file per locale:
//!
//! ```text
//! <root>/Localizable/en-US.ftl
//! <root>/Localizable/fr.ftl
//! <root>/Errors/en-US.ftl
//! ```

use super::language::{LanguagePreference, LanguageTag};
use super::resolver::{candidates, negotiate, StringResolver, SystemLocale};
use crate::config::{DEFAULT_BUNDLE, DEFAULT_TABLE};
use crate::error::{Error, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::FluentResource;
use rust_embed::RustEmbed;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(RustEmbed)]
#[folder = "assets/i18n/"]
struct Asset;

type Bundle = FluentBundle<FluentResource>;

/// Resolves keys against Fluent resources.
pub struct FluentResolver {
    tables: HashMap<(String, String), Vec<(LanguageTag, Bundle)>>,
    system: SystemLocale,
    fallback: Option<LanguageTag>,
}

impl Default for FluentResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl FluentResolver {
    /// Creates a resolver with no resources.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            system: SystemLocale::Detect,
            fallback: None,
        }
    }

    /// Creates a resolver holding the embedded resources under the default bundle.
    pub fn embedded() -> Result<Self> {
        let mut resolver = Self::new();
        resolver.load_embedded(DEFAULT_BUNDLE)?;
        Ok(resolver)
    }

    #[must_use]
    pub fn with_system_locale(mut self, system: SystemLocale) -> Self {
        self.system = system;
        self
    }

    /// Language consulted when the preferred one has no entry for a key.
    #[must_use]
    pub fn with_fallback(mut self, language: LanguageTag) -> Self {
        self.fallback = Some(language);
        self
    }

    /// Adds Fluent `source` for `language` to `table` of `bundle`.
    ///
    /// Messages already present for that locale are overridden.
    pub fn add_resource(
        &mut self,
        bundle: &str,
        table: &str,
        language: LanguageTag,
        source: &str,
    ) -> Result<()> {
        let resource = FluentResource::try_new(source.to_string()).map_err(|(_, errors)| {
            Error::Resource(format!(
                "{}/{}/{}: {} parse error(s), first: {:?}",
                bundle,
                table,
                language,
                errors.len(),
                errors.first()
            ))
        })?;

        let locales = self
            .tables
            .entry((bundle.to_string(), table.to_string()))
            .or_default();
        match locales.iter_mut().find(|(tag, _)| *tag == language) {
            Some((_, existing)) => existing.add_resource_overriding(resource),
            None => {
                let mut fluent = Bundle::new_concurrent(vec![language.identifier().clone()]);
                fluent.set_use_isolating(false);
                fluent.add_resource_overriding(resource);
                locales.push((language, fluent));
            }
        }
        Ok(())
    }

    /// Loads the embedded `<table>/<locale>.ftl` files into `bundle`.
    ///
    /// Returns the number of files loaded.
    pub fn load_embedded(&mut self, bundle: &str) -> Result<usize> {
        let mut loaded = 0;
        for file in Asset::iter() {
            let filename = file.as_ref();
            let Some((table, language)) = split_resource_path(Path::new(filename)) else {
                continue;
            };
            if let Some(content) = Asset::get(filename) {
                self.add_resource(
                    bundle,
                    &table,
                    language,
                    &String::from_utf8_lossy(content.data.as_ref()),
                )?;
                loaded += 1;
            }
        }
        tracing::debug!(bundle, loaded, "embedded resources loaded");
        Ok(loaded)
    }

    /// Loads `<dir>/<table>/<locale>.ftl` files into `bundle`.
    ///
    /// Files whose name is not a language tag are skipped. Returns the number
    /// of files loaded.
    pub fn load_dir(&mut self, bundle: &str, dir: &Path) -> Result<usize> {
        let mut loaded = 0;
        for table_entry in fs::read_dir(dir)? {
            let table_path = table_entry?.path();
            if !table_path.is_dir() {
                continue;
            }
            for file_entry in fs::read_dir(&table_path)? {
                let file_path = file_entry?.path();
                let relative = file_path.strip_prefix(dir).unwrap_or(&file_path);
                let Some((table, language)) = split_resource_path(relative) else {
                    tracing::debug!(path = %file_path.display(), "skipping non-resource file");
                    continue;
                };
                let source = fs::read_to_string(&file_path)?;
                self.add_resource(bundle, &table, language, &source)?;
                loaded += 1;
            }
        }
        tracing::debug!(bundle, dir = %dir.display(), loaded, "resource directory loaded");
        Ok(loaded)
    }

    /// Returns the locales that have resources for `table` in `bundle`.
    #[must_use]
    pub fn languages_for(&self, bundle: &str, table: &str) -> Vec<LanguageTag> {
        self.tables
            .get(&(bundle.to_string(), table.to_string()))
            .map(|locales| locales.iter().map(|(tag, _)| tag.clone()).collect())
            .unwrap_or_default()
    }

    fn format(bundle: &Bundle, key: &str) -> Option<String> {
        let message = bundle.get_message(key)?;
        let pattern = message.value()?;
        let mut errors = vec![];
        let value = bundle.format_pattern(pattern, None, &mut errors);
        if errors.is_empty() {
            Some(value.to_string())
        } else {
            tracing::debug!(key, ?errors, "message failed to format");
            None
        }
    }
}

/// Splits `<table>/<locale>.ftl` into its table name and language.
fn split_resource_path(path: &Path) -> Option<(String, LanguageTag)> {
    if path.extension()? != "ftl" {
        return None;
    }
    let language = LanguageTag::parse(path.file_stem()?.to_str()?).ok()?;
    let table = path
        .parent()
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .unwrap_or(DEFAULT_TABLE);
    Some((table.to_string(), language))
}

impl StringResolver for FluentResolver {
    fn resolve(
        &self,
        key: &str,
        table: Option<&str>,
        bundle: Option<&str>,
        preference: &LanguagePreference,
    ) -> String {
        let table_key = (
            bundle.unwrap_or(DEFAULT_BUNDLE).to_string(),
            table.unwrap_or(DEFAULT_TABLE).to_string(),
        );
        if let Some(locales) = self.tables.get(&table_key) {
            let languages: Vec<LanguageTag> = locales.iter().map(|(tag, _)| tag.clone()).collect();
            for candidate in candidates(preference, &self.system, self.fallback.as_ref()) {
                let Some(language) = negotiate(&candidate, &languages) else {
                    continue;
                };
                let found = locales
                    .iter()
                    .find(|(tag, _)| tag == language)
                    .and_then(|(_, fluent)| Self::format(fluent, key));
                if let Some(text) = found {
                    return text;
                }
            }
        }
        tracing::trace!(key, bundle = %table_key.0, table = %table_key.1, "missing message, falling back to key");
        key.to_string()
    }

    fn available_languages(&self) -> Vec<LanguageTag> {
        let mut languages: Vec<LanguageTag> = self
            .tables
            .values()
            .flat_map(|locales| locales.iter().map(|(tag, _)| tag.clone()))
            .collect();
        languages.sort_by_key(ToString::to_string);
        languages.dedup();
        languages
    }
}

impl fmt::Debug for FluentResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FluentResolver")
            .field("tables", &self.tables.keys().collect::<Vec<_>>())
            .field("system", &self.system)
            .field("fallback", &self.fallback)
            .finish()
    }
}
