//! Locale codes (`en-US`, `fr-FR`, ...)

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Pattern every locale code must match: two lowercase language letters,
/// a hyphen, two uppercase region letters
pub const LOCALE_PATTERN: &str = "^[a-z]{2}-[A-Z]{2}$";

/// Length in bytes of every locale code
const LOCALE_LEN: usize = 5;

static LOCALE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(LOCALE_PATTERN).expect("Invalid locale regex"));

/// A validated five character language-region code
///
/// Stored inline so the code is `Copy`, like the UUID keys it sits beside.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocaleCode([u8; LOCALE_LEN]);

impl LocaleCode {
    /// Parse and validate a locale code
    pub fn parse(s: &str) -> Result<Self, LocaleError> {
        s.parse()
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII codes pass the pattern
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Debug for LocaleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LocaleCode").field(&self.as_str()).finish()
    }
}

impl fmt::Display for LocaleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocaleCode {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if LOCALE_RE.is_match(s) {
            let mut code = [0u8; LOCALE_LEN];
            code.copy_from_slice(s.as_bytes());
            Ok(Self(code))
        } else {
            Err(LocaleError::Invalid(s.to_string()))
        }
    }
}

impl AsRef<str> for LocaleCode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for LocaleCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LocaleCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Error)]
pub enum LocaleError {
    #[error("invalid locale '{0}': expected a code like 'en-US'")]
    Invalid(String),
}
