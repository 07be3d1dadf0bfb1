//! Validated records
//!
//! A [`Record`] is what the validator hands back: every declared field has
//! passed its constraints and the server assigned fields are filled in. The
//! identity and audit timestamps are typed; the remaining fields are kept as
//! JSON values so one type serves every record kind.

use chrono::{DateTime, SecondsFormat, Utc};
use miette::Diagnostic;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use crate::core::identity::{RecordId, RecordKind};

pub const ID_FIELD: &str = "_id";
pub const CREATED_FIELD: &str = "_created";
pub const UPDATED_FIELD: &str = "_updated";
pub const ARCHIVED_FIELD: &str = "_archived";

/// Errors converting between records and their typed or raw forms
#[derive(Debug, Error, Diagnostic)]
pub enum RecordError {
    #[error("expected a {expected} record, found {found}")]
    #[diagnostic(code(mouth::record::kind_mismatch))]
    KindMismatch {
        expected: RecordKind,
        found: RecordKind,
    },

    #[error("{kind} record is missing '{field}'")]
    #[diagnostic(code(mouth::record::missing_field))]
    MissingField { kind: RecordKind, field: String },

    #[error("{kind} record has a malformed '{field}': {message}")]
    #[diagnostic(code(mouth::record::malformed_field))]
    MalformedField {
        kind: RecordKind,
        field: String,
        message: String,
    },

    #[error("{kind} record could not be converted: {source}")]
    #[diagnostic(code(mouth::record::conversion))]
    Conversion {
        kind: RecordKind,
        #[source]
        source: serde_json::Error,
    },
}

/// Format a timestamp the way records store it
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse a stored RFC 3339 timestamp
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|ts| ts.with_timezone(&Utc))
}

/// A validated, normalized record of some kind
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    kind: RecordKind,
    id: RecordId,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
    fields: Map<String, JsonValue>,
}

impl Record {
    /// Assemble a record from a raw field map that includes the identity and
    /// timestamp fields
    pub fn from_fields(
        kind: RecordKind,
        mut fields: Map<String, JsonValue>,
    ) -> Result<Self, RecordError> {
        let id = take_str(kind, &mut fields, ID_FIELD)?;
        let id = RecordId::parse(&id).map_err(|e| RecordError::MalformedField {
            kind,
            field: ID_FIELD.into(),
            message: e.to_string(),
        })?;
        let created = take_timestamp(kind, &mut fields, CREATED_FIELD)?;
        let updated = take_timestamp(kind, &mut fields, UPDATED_FIELD)?;

        Ok(Self {
            kind,
            id,
            created,
            updated,
            fields,
        })
    }

    pub(crate) fn new(
        kind: RecordKind,
        id: RecordId,
        created: DateTime<Utc>,
        updated: DateTime<Utc>,
        fields: Map<String, JsonValue>,
    ) -> Self {
        Self {
            kind,
            id,
            created,
            updated,
            fields,
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn updated(&self) -> DateTime<Utc> {
        self.updated
    }

    /// Non-identity fields
    pub fn fields(&self) -> &Map<String, JsonValue> {
        &self.fields
    }

    /// Get a field by name, including the identity and timestamp fields
    pub fn get(&self, name: &str) -> Option<JsonValue> {
        match name {
            ID_FIELD => Some(JsonValue::String(self.id.to_string())),
            CREATED_FIELD => Some(JsonValue::String(format_timestamp(&self.created))),
            UPDATED_FIELD => Some(JsonValue::String(format_timestamp(&self.updated))),
            _ => self.fields.get(name).cloned(),
        }
    }

    /// Get a string field
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(JsonValue::as_str)
    }

    /// Whether the record has been archived
    pub fn is_archived(&self) -> bool {
        self.fields
            .get(ARCHIVED_FIELD)
            .and_then(JsonValue::as_bool)
            .unwrap_or(false)
    }

    pub(crate) fn fields_mut(&mut self) -> &mut Map<String, JsonValue> {
        &mut self.fields
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.updated = now;
    }

    /// Flatten the record back into a single field map
    pub fn to_map(&self) -> Map<String, JsonValue> {
        let mut map = Map::with_capacity(self.fields.len() + 3);
        map.insert(ID_FIELD.into(), JsonValue::String(self.id.to_string()));
        map.insert(
            CREATED_FIELD.into(),
            JsonValue::String(format_timestamp(&self.created)),
        );
        map.insert(
            UPDATED_FIELD.into(),
            JsonValue::String(format_timestamp(&self.updated)),
        );
        for (k, v) in &self.fields {
            map.insert(k.clone(), v.clone());
        }
        map
    }

    pub fn to_value(&self) -> JsonValue {
        JsonValue::Object(self.to_map())
    }

    /// Check the record is of the expected kind
    pub fn expect_kind(&self, expected: RecordKind) -> Result<(), RecordError> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(RecordError::KindMismatch {
                expected,
                found: self.kind,
            })
        }
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_map().serialize(serializer)
    }
}

fn take_str(
    kind: RecordKind,
    fields: &mut Map<String, JsonValue>,
    name: &str,
) -> Result<String, RecordError> {
    match fields.remove(name) {
        Some(JsonValue::String(s)) => Ok(s),
        Some(other) => Err(RecordError::MalformedField {
            kind,
            field: name.into(),
            message: format!("expected a string, found {}", other),
        }),
        None => Err(RecordError::MissingField {
            kind,
            field: name.into(),
        }),
    }
}

fn take_timestamp(
    kind: RecordKind,
    fields: &mut Map<String, JsonValue>,
    name: &str,
) -> Result<DateTime<Utc>, RecordError> {
    let raw = take_str(kind, fields, name)?;
    parse_timestamp(&raw).map_err(|e| RecordError::MalformedField {
        kind,
        field: name.into(),
        message: e.to_string(),
    })
}
