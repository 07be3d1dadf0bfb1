//! Record identity: which descriptor a record belongs to, and its key

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::core::locale::LocaleCode;

/// The record kinds the service stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A language and region content is written in
    Locale,
    /// Parent template grouping the localized variants
    Template,
    /// Email variant of a template for one locale
    TemplateEmail,
    /// SMS variant of a template for one locale
    TemplateSms,
}

impl RecordKind {
    /// Get the string representation of the kind (also the definition file stem)
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Locale => "locale",
            RecordKind::Template => "template",
            RecordKind::TemplateEmail => "template_email",
            RecordKind::TemplateSms => "template_sms",
        }
    }

    /// Short name used on the command line and in file suffixes
    pub fn short_name(&self) -> &'static str {
        match self {
            RecordKind::Locale => "locale",
            RecordKind::Template => "template",
            RecordKind::TemplateEmail => "email",
            RecordKind::TemplateSms => "sms",
        }
    }

    /// Get all kinds
    pub fn all() -> &'static [RecordKind] {
        &[
            RecordKind::Locale,
            RecordKind::Template,
            RecordKind::TemplateEmail,
            RecordKind::TemplateSms,
        ]
    }

    /// Kinds that are localized variants of a template
    pub fn variants() -> &'static [RecordKind] {
        &[RecordKind::TemplateEmail, RecordKind::TemplateSms]
    }

    /// Try to determine the kind from a filename
    /// Looks for suffixes like "welcome.en-US.email.yaml", "welcome.template.json"
    /// or "fr-FR.locale.yaml"
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        let stem = lower
            .strip_suffix(".yaml")
            .or_else(|| lower.strip_suffix(".yml"))
            .or_else(|| lower.strip_suffix(".json"))?;

        let suffix = stem.rsplit('.').next()?;
        suffix.parse().ok()
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "locale" => Ok(RecordKind::Locale),
            "template" => Ok(RecordKind::Template),
            "template_email" | "email" => Ok(RecordKind::TemplateEmail),
            "template_sms" | "sms" => Ok(RecordKind::TemplateSms),
            _ => Err(IdParseError::InvalidKind(s.to_string())),
        }
    }
}

/// A record's primary key
///
/// Templates and their variants are keyed by a generated UUID, locales by
/// their code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordId {
    Uuid(Uuid),
    Locale(LocaleCode),
}

impl RecordId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self::Uuid(Uuid::new_v4())
    }

    /// Parse a RecordId from a string
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        s.parse()
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<LocaleCode> for RecordId {
    fn from(code: LocaleCode) -> Self {
        Self::Locale(code)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Uuid(uuid) => write!(f, "{}", uuid.hyphenated()),
            RecordId::Locale(code) => write!(f, "{}", code),
        }
    }
}

impl FromStr for RecordId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(code) = LocaleCode::parse(s) {
            return Ok(Self::Locale(code));
        }
        Uuid::parse_str(s)
            .map(Self::Uuid)
            .map_err(|e| IdParseError::InvalidId(s.to_string(), e.to_string()))
    }
}

impl Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing kinds and identifiers
#[derive(Debug, Error)]
pub enum IdParseError {
    #[error("invalid record kind: '{0}' (valid: template, email, sms, locale)")]
    InvalidKind(String),

    #[error("invalid record id '{0}': expected a UUID or a locale code ({1})")]
    InvalidId(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_generation() {
        let id = RecordId::new();
        assert_eq!(id.to_string().len(), 36);
        assert_ne!(id, RecordId::new());
    }

    #[test]
    fn test_record_id_parsing() {
        let generated = RecordId::new();
        let parsed = RecordId::parse(&generated.to_string()).unwrap();
        assert_eq!(generated, parsed);
    }

    #[test]
    fn test_record_id_invalid() {
        let err = RecordId::parse("3f2a-not-a-uuid").unwrap_err();
        assert!(matches!(err, IdParseError::InvalidId(_, _)));
    }

    #[test]
    fn test_locale_key() {
        let id = RecordId::parse("pt-BR").unwrap();
        assert_eq!(id, RecordId::Locale(LocaleCode::parse("pt-BR").unwrap()));
        assert_eq!(id.to_string(), "pt-BR");
        assert!(matches!(RecordId::new(), RecordId::Uuid(_)));
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"pt-BR\""
        );
    }

    #[test]
    fn test_record_id_serde() {
        let id = RecordId::parse("3f2a6c1e-9b7d-4e2a-8c41-0d5e6f7a8b9c").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"3f2a6c1e-9b7d-4e2a-8c41-0d5e6f7a8b9c\"");
        let back: RecordId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_kind_aliases() {
        assert_eq!("email".parse::<RecordKind>().unwrap(), RecordKind::TemplateEmail);
        assert_eq!("SMS".parse::<RecordKind>().unwrap(), RecordKind::TemplateSms);
        assert_eq!(
            "template_sms".parse::<RecordKind>().unwrap(),
            RecordKind::TemplateSms
        );
        assert!(matches!(
            "push".parse::<RecordKind>().unwrap_err(),
            IdParseError::InvalidKind(_)
        ));
    }

    #[test]
    fn test_kind_from_filename() {
        assert_eq!(
            RecordKind::from_filename("welcome.en-US.email.yaml"),
            Some(RecordKind::TemplateEmail)
        );
        assert_eq!(
            RecordKind::from_filename("welcome.fr-FR.sms.yml"),
            Some(RecordKind::TemplateSms)
        );
        assert_eq!(
            RecordKind::from_filename("welcome.template.json"),
            Some(RecordKind::Template)
        );
        assert_eq!(
            RecordKind::from_filename("fr-FR.locale.yaml"),
            Some(RecordKind::Locale)
        );
        assert_eq!(RecordKind::from_filename("notes.yaml"), None);
        assert_eq!(RecordKind::from_filename("welcome.email.txt"), None);
    }

    #[test]
    fn test_kind_roundtrip() {
        for kind in RecordKind::all() {
            assert_eq!(kind.as_str().parse::<RecordKind>().unwrap(), *kind);
            assert_eq!(kind.short_name().parse::<RecordKind>().unwrap(), *kind);
        }
    }
}
