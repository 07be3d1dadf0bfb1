//! Entity traits - common interface for the typed record kinds

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::core::identity::{RecordId, RecordKind};
use crate::core::locale::LocaleCode;
use crate::core::record::{Record, RecordError};

/// Common trait for all typed records
pub trait Entity: Serialize + DeserializeOwned + TryFrom<Record, Error = RecordError> {
    /// The record kind this type represents
    const KIND: RecordKind;

    /// Get the record's unique ID
    fn id(&self) -> RecordId;

    /// Get the creation timestamp
    fn created(&self) -> DateTime<Utc>;

    /// Get the last update timestamp
    fn updated(&self) -> DateTime<Utc>;
}

/// A localized variant of a template (email or SMS)
pub trait Variant: Entity {
    /// The parent template
    fn template(&self) -> RecordId;

    /// The variant's locale
    fn locale(&self) -> LocaleCode;

    /// Short text identifying the content: the email subject or the SMS body
    fn preview(&self) -> &str;
}

/// Convert a validated record into its typed form
pub(crate) fn from_record<T: Entity>(record: Record) -> Result<T, RecordError> {
    record.expect_kind(T::KIND)?;
    serde_json::from_value(record.to_value()).map_err(|source| RecordError::Conversion {
        kind: T::KIND,
        source,
    })
}
