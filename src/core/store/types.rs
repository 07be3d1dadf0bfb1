//! Store type definitions
//!
//! Errors, filters and change entries returned by the store.

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use crate::core::identity::{RecordId, RecordKind};
use crate::core::locale::LocaleCode;
use crate::schema::registry::RegistryError;

/// Index name reported when the primary key collides
pub const PRIMARY_INDEX: &str = "primary";

/// Errors raised by the storage adapter
///
/// These are distinct from validation errors: a record can be valid and still
/// be refused by the store.
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("a {kind} record with the same {index} already exists")]
    #[diagnostic(
        code(mouth::store::duplicate),
        help("update the existing record instead")
    )]
    Duplicate { kind: RecordKind, index: String },

    #[error("no {kind} record with id {id}")]
    #[diagnostic(code(mouth::store::no_record))]
    NoRecord { kind: RecordKind, id: RecordId },

    #[error("'{field}' of {kind} {id} cannot be changed")]
    #[diagnostic(
        code(mouth::store::immutable_field),
        help("create a new record instead")
    )]
    ImmutableField {
        kind: RecordKind,
        id: RecordId,
        field: String,
    },

    #[error("{kind} {id} is archived")]
    #[diagnostic(code(mouth::store::archived))]
    Archived { kind: RecordKind, id: RecordId },

    #[error("{kind} {id} is still used by {count} {by} record(s)")]
    #[diagnostic(
        code(mouth::store::in_use),
        help("delete those records first, or archive it instead")
    )]
    InUse {
        kind: RecordKind,
        id: RecordId,
        by: RecordKind,
        count: usize,
    },

    #[error("{kind} records have no field '{field}'")]
    #[diagnostic(code(mouth::store::unknown_field))]
    UnknownField { kind: RecordKind, field: String },

    #[error("the store has not been installed")]
    #[diagnostic(code(mouth::store::not_installed), help("run 'mouth install' first"))]
    NotInstalled,

    #[error("stored {kind} record {id} is unreadable: {message}")]
    #[diagnostic(code(mouth::store::corrupt))]
    Corrupt {
        kind: RecordKind,
        id: String,
        message: String,
    },

    #[error("could not create store directory: {0}")]
    #[diagnostic(code(mouth::store::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    #[error("database error: {0}")]
    #[diagnostic(code(mouth::store::sqlite))]
    Sqlite(#[source] rusqlite::Error),
}

/// Filter for listing records
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Only variants of this template
    pub template: Option<RecordId>,
    /// Only variants in this locale
    pub locale: Option<LocaleCode>,
    /// Include archived records
    pub archived: bool,
    /// Maximum number of records
    pub limit: Option<usize>,
}

impl ListFilter {
    pub fn template(template: RecordId) -> Self {
        Self {
            template: Some(template),
            ..Default::default()
        }
    }
}

/// The kind of mutation a change row records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeAction::Create => write!(f, "create"),
            ChangeAction::Update => write!(f, "update"),
            ChangeAction::Delete => write!(f, "delete"),
        }
    }
}

/// Items of a change row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeItems {
    /// Actor the mutation is attributed to
    pub user: String,
    pub action: ChangeAction,
    /// The created record, or changed fields with their old and new values
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, JsonValue>,
}

/// One row of a record's change history
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEntry {
    pub id: RecordId,
    pub created: DateTime<Utc>,
    pub items: ChangeItems,
}
