// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for localization settings.
//!
//! This module serves as the single source of truth for the defaults used
//! when a lookup key does not name its table or bundle, and for the language
//! used when neither the preference nor the system locale can be served.

// ==========================================================================
// Lookup Defaults
// ==========================================================================

/// Table consulted when a lookup key does not name one.
pub const DEFAULT_TABLE: &str = "Localizable";

/// Bundle consulted when a lookup key does not name one.
///
/// The embedded resources are registered under this identifier.
pub const DEFAULT_BUNDLE: &str = "main";

// ==========================================================================
// Language Defaults
// ==========================================================================

/// Language served when negotiation finds nothing better.
pub const DEFAULT_FALLBACK_LANGUAGE: &str = "en-US";

/// Name under which the explicitly selected language is persisted.
///
/// Absence of the key means the application follows the system language.
pub const SPECIFIED_LANGUAGE_KEY: &str = "SpecifiedCurrentLanguageKey";
