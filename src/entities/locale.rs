//! Locale entity - a language and region variants are written in

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{from_record, Entity};
use crate::core::identity::{RecordId, RecordKind};
use crate::core::locale::LocaleCode;
use crate::core::record::{Record, RecordError};

/// A locale, keyed by its code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locale {
    #[serde(rename = "_id")]
    pub code: LocaleCode,

    /// Archived locales are hidden from listings and cannot be changed
    #[serde(rename = "_archived", default)]
    pub archived: bool,

    #[serde(rename = "_created")]
    pub created: DateTime<Utc>,

    #[serde(rename = "_updated")]
    pub updated: DateTime<Utc>,

    /// Display name, e.g. "English (US)"
    pub name: String,
}

impl Entity for Locale {
    const KIND: RecordKind = RecordKind::Locale;

    fn id(&self) -> RecordId {
        RecordId::Locale(self.code)
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }
}

impl TryFrom<Record> for Locale {
    type Error = RecordError;

    fn try_from(record: Record) -> Result<Self, Self::Error> {
        from_record(record)
    }
}
