// SPDX-License-Identifier: MPL-2.0
use std::fmt;

/// Errors raised while loading configuration, resources or language tags.
///
/// Binding and localizer operations never return these: a missing string
/// falls back to its key and a failed preference write falls back to memory.
#[derive(Debug, Clone)]
pub enum Error {
    Io(String),
    Config(String),
    Resource(String),
    Language(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O Error: {}", e),
            Error::Config(e) => write!(f, "Config Error: {}", e),
            Error::Resource(e) => write!(f, "Resource Error: {}", e),
            Error::Language(e) => write!(f, "Language Error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<unic_langid::LanguageIdentifierError> for Error {
    fn from(err: unic_langid::LanguageIdentifierError) -> Self {
        Error::Language(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_io_error() {
        let err = Error::Io("disk failure".to_string());
        assert_eq!(format!("{}", err), "I/O Error: disk failure");
    }

    #[test]
    fn from_io_error_produces_io_variant() {
        let io_error = std::io::Error::other("boom");
        let err: Error = io_error.into();
        match err {
            Error::Io(message) => assert!(message.contains("boom")),
            _ => panic!("expected Io variant"),
        }
    }

    #[test]
    fn config_error_formats_properly() {
        let err = Error::Config("bad field".into());
        assert_eq!(format!("{}", err), "Config Error: bad field");
    }

    #[test]
    fn invalid_toml_converts_to_config_variant() {
        let parse_error = toml::from_str::<toml::Table>("not = valid = toml").unwrap_err();
        let err: Error = parse_error.into();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn invalid_language_identifier_converts_to_language_variant() {
        let parse_error = "!!".parse::<unic_langid::LanguageIdentifier>().unwrap_err();
        let err: Error = parse_error.into();
        assert!(matches!(err, Error::Language(_)));
    }
}
