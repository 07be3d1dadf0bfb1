//! SMS variant of a template

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{from_record, Entity, Variant};
use crate::core::identity::{RecordId, RecordKind};
use crate::core::locale::LocaleCode;
use crate::core::record::{Record, RecordError};

/// The SMS content of a template in one locale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSms {
    #[serde(rename = "_id")]
    pub id: RecordId,

    #[serde(rename = "_created")]
    pub created: DateTime<Utc>,

    #[serde(rename = "_updated")]
    pub updated: DateTime<Utc>,

    pub template: RecordId,
    pub locale: LocaleCode,
    pub content: String,
}

impl Entity for TemplateSms {
    const KIND: RecordKind = RecordKind::TemplateSms;

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

impl Variant for TemplateSms {
    fn template(&self) -> RecordId {
        self.template
    }

    fn locale(&self) -> LocaleCode {
        self.locale
    }

    fn preview(&self) -> &str {
        &self.content
    }
}

impl TryFrom<Record> for TemplateSms {
    type Error = RecordError;

    fn try_from(record: Record) -> Result<Self, Self::Error> {
        from_record(record)
    }
}
