// SPDX-License-Identifier: MPL-2.0
//! `reactive_l10n` binds UI properties to localized text that follows the
//! in-app language preference.
//!
//! Values are described as [`i18n::Localizer`]s, bound to host properties
//! through `.l10n()`, and re-applied every time the preference changes. The
//! preference is persisted in the application's `settings.toml`.

#![doc(html_root_url = "https://docs.rs/reactive_l10n/0.1.0")]

pub mod config;
pub mod error;
pub mod i18n;
