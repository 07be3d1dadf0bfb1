//! Email variant of a template

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{from_record, Entity, Variant};
use crate::core::identity::{RecordId, RecordKind};
use crate::core::locale::LocaleCode;
use crate::core::record::{Record, RecordError};

/// The email content of a template in one locale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateEmail {
    #[serde(rename = "_id")]
    pub id: RecordId,

    #[serde(rename = "_created")]
    pub created: DateTime<Utc>,

    #[serde(rename = "_updated")]
    pub updated: DateTime<Utc>,

    pub template: RecordId,
    pub locale: LocaleCode,
    pub subject: String,

    /// Plain text body
    pub text: String,

    /// HTML body
    pub html: String,
}

impl Entity for TemplateEmail {
    const KIND: RecordKind = RecordKind::TemplateEmail;

    fn id(&self) -> RecordId {
        self.id
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }
}

impl Variant for TemplateEmail {
    fn template(&self) -> RecordId {
        self.template
    }

    fn locale(&self) -> LocaleCode {
        self.locale
    }

    fn preview(&self) -> &str {
        &self.subject
    }
}

impl TryFrom<Record> for TemplateEmail {
    type Error = RecordError;

    fn try_from(record: Record) -> Result<Self, Self::Error> {
        from_record(record)
    }
}
