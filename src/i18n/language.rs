// SPDX-License-Identifier: MPL-2.0
//! Language tags and the in-app language preference.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;
use unic_langid::LanguageIdentifier;

/// A validated, non-empty language tag (e.g., "fr", "en-US").
///
/// The tag is stored in canonical BCP 47 form, so "en_us" and "en-US" compare
/// equal and persist identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageTag(LanguageIdentifier);

impl LanguageTag {
    /// Parses a language tag, rejecting empty and malformed input.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::Language("empty language tag".to_string()));
        }
        let identifier: LanguageIdentifier = trimmed.parse()?;
        if identifier.language.is_empty() {
            return Err(Error::Language(format!(
                "language tag without a language subtag: {}",
                raw
            )));
        }
        Ok(Self(identifier))
    }

    /// Returns the underlying identifier.
    #[must_use]
    pub fn identifier(&self) -> &LanguageIdentifier {
        &self.0
    }

    /// Returns the primary language subtag (e.g., "en" for "en-US").
    #[must_use]
    pub fn language(&self) -> &str {
        self.0.language.as_str()
    }

    /// Returns the tag reduced to its language subtag.
    #[must_use]
    pub fn without_region(&self) -> Self {
        Self(LanguageIdentifier::from_parts(self.0.language, None, None, &[]))
    }
}

impl FromStr for LanguageTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<LanguageIdentifier> for LanguageTag {
    fn from(identifier: LanguageIdentifier) -> Self {
        Self(identifier)
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// In-app language preference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LanguagePreference {
    /// Dependent on the system preferences.
    #[default]
    FollowSystem,
    /// Explicitly selected language.
    Specified(LanguageTag),
}

impl LanguagePreference {
    /// Builds a preference from a persisted value.
    ///
    /// Absent, empty or unparsable values mean the system language is followed.
    #[must_use]
    pub fn from_persisted(value: Option<&str>) -> Self {
        match value.map(LanguageTag::parse) {
            Some(Ok(tag)) => Self::Specified(tag),
            Some(Err(error)) => {
                tracing::warn!(%error, "ignoring persisted language");
                Self::FollowSystem
            }
            None => Self::FollowSystem,
        }
    }

    /// Returns the value to persist, `None` meaning "remove the entry".
    #[must_use]
    pub fn to_persisted(&self) -> Option<String> {
        self.language().map(ToString::to_string)
    }

    /// Returns the explicitly selected language, if any.
    #[must_use]
    pub fn language(&self) -> Option<&LanguageTag> {
        match self {
            Self::FollowSystem => None,
            Self::Specified(tag) => Some(tag),
        }
    }

    #[must_use]
    pub fn follows_system(&self) -> bool {
        matches!(self, Self::FollowSystem)
    }
}

impl From<LanguageTag> for LanguagePreference {
    fn from(tag: LanguageTag) -> Self {
        Self::Specified(tag)
    }
}

impl fmt::Display for LanguagePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FollowSystem => write!(f, "system"),
            Self::Specified(tag) => write!(f, "{}", tag),
        }
    }
}
