//! SQLite-backed storage adapter
//!
//! The store persists validated [`Record`]s in the tables their descriptors
//! declare and enforces the declared unique indexes. It never validates
//! field values itself; callers hand it records that already passed the
//! [`Validator`](crate::schema::Validator).
//!
//! Every mutation writes a row to the kind's `<table>_changes` table,
//! attributed to an actor.

mod queries;
mod schema;
mod types;

pub use types::*;

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, ErrorCode};
use serde_json::{json, Map, Value as JsonValue};

use crate::core::identity::{RecordId, RecordKind};
use crate::core::record::{format_timestamp, Record, CREATED_FIELD, ID_FIELD, UPDATED_FIELD};
use crate::schema::descriptor::{FieldSpec, FieldType, OnDelete, SchemaDescriptor};
use crate::schema::registry::SchemaRegistry;

/// The record store backed by SQLite
pub struct Store {
    conn: Connection,
    registry: SchemaRegistry,
}

impl Store {
    /// Open or create a store file
    ///
    /// Tables are not created until [`Store::install`] runs.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(StoreError::Sqlite)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(StoreError::Sqlite)?;

        tracing::debug!(path = %path.display(), "opened store");
        Self::with_connection(conn, SchemaRegistry::load()?)
    }

    /// Open a private in-memory store
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::Sqlite)?;
        Self::with_connection(conn, SchemaRegistry::load()?)
    }

    /// Wrap an existing connection
    pub fn with_connection(conn: Connection, registry: SchemaRegistry) -> Result<Self, StoreError> {
        Ok(Self { conn, registry })
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Insert a new record
    ///
    /// Fails with [`StoreError::Duplicate`] when a unique index already holds
    /// the record's values, and with [`StoreError::NoRecord`] when a
    /// referenced record does not exist.
    pub fn create(&mut self, record: &Record, actor: &str) -> Result<(), StoreError> {
        let kind = record.kind();
        let descriptor = self.registry.descriptor(kind)?;
        let tx = self.conn.transaction().map_err(StoreError::Sqlite)?;

        for (field, target) in descriptor.reference_fields() {
            let Some(raw) = record.get_str(&field.name) else {
                continue;
            };
            let parent = parse_stored_id(kind, raw)?;
            let target_descriptor = self.registry.descriptor(target)?;
            if !row_exists(&tx, target_descriptor, parent)
                .map_err(|e| map_sqlite_error(target_descriptor, e))?
            {
                return Err(StoreError::NoRecord {
                    kind: target,
                    id: parent,
                });
            }
        }

        let columns: Vec<&FieldSpec> = descriptor.fields().iter().collect();
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            descriptor.table(),
            column_list(&columns),
            placeholders(columns.len())
        );
        let values: Vec<Option<String>> = columns
            .iter()
            .map(|f| to_column(f, record.get(&f.name)))
            .collect();
        tx.execute(&sql, params_from_iter(values.iter()))
            .map_err(|e| map_sqlite_error(descriptor, e))?;

        write_change(
            &tx,
            descriptor,
            record.id(),
            ChangeItems {
                user: actor.to_string(),
                action: ChangeAction::Create,
                fields: record.to_map(),
            },
        )?;
        tx.commit().map_err(StoreError::Sqlite)?;

        tracing::info!(%kind, id = %record.id(), actor, "created record");
        Ok(())
    }

    /// Replace a stored record with an updated version of itself
    ///
    /// Fails with [`StoreError::ImmutableField`] when the new version changes
    /// a field declared immutable, and with [`StoreError::Archived`] when the
    /// stored record is archived.
    pub fn update(&mut self, record: &Record, actor: &str) -> Result<(), StoreError> {
        let kind = record.kind();
        let existing = self.get(kind, record.id())?;
        let descriptor = self.registry.descriptor(kind)?;

        if existing.is_archived() {
            return Err(StoreError::Archived {
                kind,
                id: record.id(),
            });
        }
        // `_updated` is assigned on every update
        if let Some(field) = descriptor
            .immutable_fields()
            .filter(|f| f.name != UPDATED_FIELD)
            .find(|f| existing.get(&f.name) != record.get(&f.name))
        {
            return Err(StoreError::ImmutableField {
                kind,
                id: record.id(),
                field: field.name.clone(),
            });
        }

        let columns: Vec<&FieldSpec> = descriptor
            .fields()
            .iter()
            .filter(|f| f.name != ID_FIELD && f.name != CREATED_FIELD)
            .collect();
        let assignments = columns
            .iter()
            .enumerate()
            .map(|(i, f)| format!("\"{}\" = ?{}", f.name, i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE \"{}\" SET {} WHERE \"_id\" = ?{}",
            descriptor.table(),
            assignments,
            columns.len() + 1
        );
        let mut values: Vec<Option<String>> = columns
            .iter()
            .map(|f| to_column(f, record.get(&f.name)))
            .collect();
        values.push(Some(record.id().to_string()));

        let tx = self.conn.transaction().map_err(StoreError::Sqlite)?;
        let affected = tx
            .execute(&sql, params_from_iter(values.iter()))
            .map_err(|e| map_sqlite_error(descriptor, e))?;
        if affected == 0 {
            return Err(StoreError::NoRecord {
                kind,
                id: record.id(),
            });
        }

        write_change(
            &tx,
            descriptor,
            record.id(),
            ChangeItems {
                user: actor.to_string(),
                action: ChangeAction::Update,
                fields: diff_fields(&existing, record),
            },
        )?;
        tx.commit().map_err(StoreError::Sqlite)?;

        tracing::info!(%kind, id = %record.id(), actor, "updated record");
        Ok(())
    }

    /// Delete a record
    ///
    /// Records referencing it through a cascading field are deleted with it;
    /// any other reference refuses the delete with [`StoreError::InUse`].
    /// Returns the number of records removed.
    pub fn delete(
        &mut self,
        kind: RecordKind,
        id: RecordId,
        actor: &str,
    ) -> Result<usize, StoreError> {
        let descriptor = self.registry.descriptor(kind)?;
        let tx = self.conn.transaction().map_err(StoreError::Sqlite)?;
        let mut removed = 0;

        for (child_kind, field) in self.registry.referencing(kind) {
            let child = self.registry.descriptor(child_kind)?;

            if field.on_delete == OnDelete::Restrict {
                let count = count_referencing(&tx, child, &field.name, id)?;
                if count > 0 {
                    return Err(StoreError::InUse {
                        kind,
                        id,
                        by: child_kind,
                        count,
                    });
                }
                continue;
            }

            let child_ids: Vec<String> = {
                let sql = format!(
                    "SELECT \"_id\" FROM \"{}\" WHERE \"{}\" = ?1",
                    child.table(),
                    field.name
                );
                let mut stmt = tx.prepare(&sql).map_err(|e| map_sqlite_error(child, e))?;
                let rows = stmt
                    .query_map([id.to_string()], |row| row.get::<_, String>(0))
                    .map_err(|e| map_sqlite_error(child, e))?;
                rows.collect::<Result<_, _>>().map_err(StoreError::Sqlite)?
            };

            for raw in child_ids {
                let child_id = parse_stored_id(child_kind, &raw)?;
                delete_row(&tx, child, child_id)?;
                write_change(&tx, child, child_id, deleted_by(actor))?;
                tracing::debug!(
                    kind = %child_kind,
                    id = %child_id,
                    parent = %id,
                    "cascading delete"
                );
                removed += 1;
            }
        }

        if delete_row(&tx, descriptor, id)? == 0 {
            return Err(StoreError::NoRecord { kind, id });
        }
        write_change(&tx, descriptor, id, deleted_by(actor))?;
        tx.commit().map_err(StoreError::Sqlite)?;

        tracing::info!(%kind, %id, actor, cascaded = removed, "deleted record");
        Ok(removed + 1)
    }
}

fn deleted_by(actor: &str) -> ChangeItems {
    ChangeItems {
        user: actor.to_string(),
        action: ChangeAction::Delete,
        fields: Map::new(),
    }
}

fn delete_row(
    conn: &Connection,
    descriptor: &SchemaDescriptor,
    id: RecordId,
) -> Result<usize, StoreError> {
    let sql = format!("DELETE FROM \"{}\" WHERE \"_id\" = ?1", descriptor.table());
    conn.execute(&sql, [id.to_string()])
        .map_err(|e| map_sqlite_error(descriptor, e))
}

fn row_exists(
    conn: &Connection,
    descriptor: &SchemaDescriptor,
    id: RecordId,
) -> rusqlite::Result<bool> {
    let sql = format!(
        "SELECT COUNT(*) FROM \"{}\" WHERE \"_id\" = ?1",
        descriptor.table()
    );
    let count: i64 = conn.query_row(&sql, [id.to_string()], |row| row.get(0))?;
    Ok(count > 0)
}

/// Number of records of `child` whose `field` points at `id`
fn count_referencing(
    conn: &Connection,
    child: &SchemaDescriptor,
    field: &str,
    id: RecordId,
) -> Result<usize, StoreError> {
    let sql = format!(
        "SELECT COUNT(*) FROM \"{}\" WHERE \"{}\" = ?1",
        child.table(),
        field
    );
    let count: i64 = conn
        .query_row(&sql, [id.to_string()], |row| row.get(0))
        .map_err(|e| map_sqlite_error(child, e))?;
    Ok(count as usize)
}

fn write_change(
    conn: &Connection,
    descriptor: &SchemaDescriptor,
    id: RecordId,
    items: ChangeItems,
) -> Result<(), StoreError> {
    let Some(table) = descriptor.changes_table() else {
        return Ok(());
    };
    let items = serde_json::to_string(&items).map_err(|e| StoreError::Corrupt {
        kind: descriptor.kind,
        id: id.to_string(),
        message: e.to_string(),
    })?;
    let sql = format!(
        "INSERT INTO \"{}\" (\"_id\", \"_created\", \"items\") VALUES (?1, ?2, ?3)",
        table
    );
    conn.execute(&sql, params![id.to_string(), format_timestamp(&Utc::now()), items])
        .map_err(|e| map_sqlite_error(descriptor, e))?;
    Ok(())
}

/// Old and new values of every field that differs between two versions
fn diff_fields(old: &Record, new: &Record) -> Map<String, JsonValue> {
    let old_fields = old.fields();
    let mut diff = Map::new();
    for (name, value) in new.fields() {
        let before = old_fields.get(name).cloned().unwrap_or(JsonValue::Null);
        if &before != value {
            diff.insert(name.clone(), json!({ "old": before, "new": value }));
        }
    }
    for (name, value) in old_fields {
        if !new.fields().contains_key(name) {
            diff.insert(name.clone(), json!({ "old": value, "new": null }));
        }
    }
    diff
}

fn parse_stored_id(kind: RecordKind, raw: &str) -> Result<RecordId, StoreError> {
    RecordId::parse(raw).map_err(|e| StoreError::Corrupt {
        kind,
        id: raw.to_string(),
        message: e.to_string(),
    })
}

fn column_list(columns: &[&FieldSpec]) -> String {
    columns
        .iter()
        .map(|f| format!("\"{}\"", f.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn placeholders(n: usize) -> String {
    (1..=n).map(|i| format!("?{}", i)).collect::<Vec<_>>().join(", ")
}

/// Column text for a field value; absent and null values are stored as NULL
fn to_column(field: &FieldSpec, value: Option<JsonValue>) -> Option<String> {
    match value? {
        JsonValue::Null => None,
        JsonValue::String(s) if field.field_type != FieldType::Object => Some(s),
        other => Some(other.to_string()),
    }
}

/// Field value for stored column text
fn from_column(field: &FieldSpec, text: String) -> Result<JsonValue, serde_json::Error> {
    match field.field_type {
        FieldType::Object | FieldType::Boolean => serde_json::from_str(&text),
        _ => Ok(JsonValue::String(text)),
    }
}

/// Turn a sqlite failure into a store error, recognizing unique index
/// violations and missing tables
fn map_sqlite_error(descriptor: &SchemaDescriptor, err: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(ref failure, Some(ref message)) = err {
        if failure.code == ErrorCode::ConstraintViolation {
            if let Some(index) = violated_index(descriptor, message) {
                return StoreError::Duplicate {
                    kind: descriptor.kind,
                    index,
                };
            }
        }
        if message.starts_with("no such table") {
            return StoreError::NotInstalled;
        }
    }
    StoreError::Sqlite(err)
}

/// Name the unique index behind a message like
/// `UNIQUE constraint failed: mouth_template_sms.template, mouth_template_sms.locale`
fn violated_index(descriptor: &SchemaDescriptor, message: &str) -> Option<String> {
    let columns: Vec<&str> = message
        .strip_prefix("UNIQUE constraint failed: ")?
        .split(", ")
        .map(|c| c.rsplit('.').next().unwrap_or(c))
        .collect();

    if columns == [ID_FIELD] {
        return Some(PRIMARY_INDEX.to_string());
    }

    let index = descriptor
        .storage
        .indexes
        .iter()
        .filter(|i| i.unique && i.fields.len() == columns.len())
        .find(|i| i.fields.iter().all(|f| columns.contains(&f.as_str())));

    Some(match index {
        Some(index) => index.name.clone(),
        None => columns.join(", "),
    })
}

/// Convert a stored timestamp column for change rows
fn parse_change_time(kind: RecordKind, id: &str, raw: &str) -> Result<DateTime<Utc>, StoreError> {
    crate::core::record::parse_timestamp(raw).map_err(|e| StoreError::Corrupt {
        kind,
        id: id.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::locale::LocaleCode;
    use crate::schema::Validator;
    use serde_json::json;

    struct Fixture {
        store: Store,
        validator: Validator,
        template: Record,
    }

    fn fixture() -> Fixture {
        let mut store = Store::open_in_memory().unwrap();
        store.install().unwrap();
        let validator = Validator::new(store.registry()).unwrap();
        for (code, name) in [("en-US", "English (US)"), ("fr-FR", "French")] {
            let locale = validator
                .validate(RecordKind::Locale, &json!({ "_id": code, "name": name }))
                .unwrap();
            store.create(&locale, "tester").unwrap();
        }
        let template = validator
            .validate(RecordKind::Template, &json!({ "name": "welcome" }))
            .unwrap();
        store.create(&template, "tester").unwrap();
        Fixture {
            store,
            validator,
            template,
        }
    }

    fn email(f: &Fixture, locale: &str) -> Record {
        f.validator
            .validate(
                RecordKind::TemplateEmail,
                &json!({
                    "template": f.template.id().to_string(),
                    "locale": locale,
                    "subject": "Welcome",
                    "text": "Hi",
                    "html": "<p>Hi</p>"
                }),
            )
            .unwrap()
    }

    fn sms(f: &Fixture, locale: &str) -> Record {
        f.validator
            .validate(
                RecordKind::TemplateSms,
                &json!({
                    "template": f.template.id().to_string(),
                    "locale": locale,
                    "content": "Hi"
                }),
            )
            .unwrap()
    }

    #[test]
    fn test_roundtrip_is_exact() {
        let mut f = fixture();
        let record = email(&f, "en-US");
        f.store.create(&record, "tester").unwrap();

        let loaded = f.store.get(RecordKind::TemplateEmail, record.id()).unwrap();
        assert_eq!(loaded, record);

        let template = f.store.get(RecordKind::Template, f.template.id()).unwrap();
        assert_eq!(template, f.template);
        assert_eq!(template.fields()["variables"], json!({}));
    }

    #[test]
    fn test_duplicate_locale_rejected_by_store() {
        let mut f = fixture();
        f.store.create(&email(&f, "en-US"), "tester").unwrap();

        // Valid on its own, refused by the unique index
        let second = email(&f, "en-US");
        let err = f.store.create(&second, "tester").unwrap_err();
        match err {
            StoreError::Duplicate { kind, index } => {
                assert_eq!(kind, RecordKind::TemplateEmail);
                assert_eq!(index, "ui_template_locale");
            }
            other => panic!("expected duplicate, got {other:?}"),
        }

        // Same locale in the other channel is fine
        f.store.create(&sms(&f, "en-US"), "tester").unwrap();
        f.store.create(&email(&f, "fr-FR"), "tester").unwrap();
    }

    #[test]
    fn test_duplicate_template_name() {
        let mut f = fixture();
        let again = f
            .validator
            .validate(RecordKind::Template, &json!({ "name": "welcome" }))
            .unwrap();
        let err = f.store.create(&again, "tester").unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { ref index, .. } if index == "ui_name"));
    }

    #[test]
    fn test_duplicate_id() {
        let mut f = fixture();
        let record = sms(&f, "en-US");
        f.store.create(&record, "tester").unwrap();
        let err = f.store.create(&record, "tester").unwrap_err();
        // Both the key and the locale collide; either index is a duplicate
        assert!(matches!(err, StoreError::Duplicate { .. }));
    }

    #[test]
    fn test_missing_parent_template() {
        let mut f = fixture();
        let orphan = f
            .validator
            .validate(
                RecordKind::TemplateSms,
                &json!({
                    "template": "3f2a6c1e-9b7d-4e2a-8c41-0d5e6f7a8b9c",
                    "locale": "en-US",
                    "content": "Hi"
                }),
            )
            .unwrap();
        let err = f.store.create(&orphan, "tester").unwrap_err();
        assert!(matches!(
            err,
            StoreError::NoRecord {
                kind: RecordKind::Template,
                ..
            }
        ));
    }

    #[test]
    fn test_update_and_history() {
        let mut f = fixture();
        let record = sms(&f, "en-US");
        f.store.create(&record, "alice").unwrap();

        let updated = f
            .validator
            .validate_update(&record, &json!({ "content": "Hello" }))
            .unwrap();
        f.store.update(&updated, "bob").unwrap();

        let loaded = f.store.get(RecordKind::TemplateSms, record.id()).unwrap();
        assert_eq!(loaded.get_str("content"), Some("Hello"));
        assert_eq!(loaded.created(), record.created());
        assert_eq!(loaded, updated);

        let history = f.store.changes(RecordKind::TemplateSms, record.id()).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].items.action, ChangeAction::Create);
        assert_eq!(history[0].items.user, "alice");
        assert_eq!(history[0].items.fields["content"], json!("Hi"));
        assert_eq!(history[1].items.action, ChangeAction::Update);
        assert_eq!(history[1].items.user, "bob");
        assert_eq!(
            history[1].items.fields["content"],
            json!({ "old": "Hi", "new": "Hello" })
        );
    }

    #[test]
    fn test_update_cannot_move_variant() {
        let mut f = fixture();
        let record = sms(&f, "en-US");
        f.store.create(&record, "tester").unwrap();

        // Bypass the validator, which drops immutable fields from a patch
        let mut moved = record.to_map();
        moved.insert("template".into(), json!(RecordId::new().to_string()));
        moved.insert("locale".into(), json!("fr-FR"));
        let moved = Record::from_fields(RecordKind::TemplateSms, moved).unwrap();

        let err = f.store.update(&moved, "tester").unwrap_err();
        assert!(matches!(
            err,
            StoreError::ImmutableField { ref field, .. } if field == "template"
        ));

        let stored = f.store.get(RecordKind::TemplateSms, record.id()).unwrap();
        assert_eq!(stored, record);
        assert_eq!(f.store.contents(f.template.id()).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_locale_rejected() {
        let mut f = fixture();
        let err = f.store.create(&sms(&f, "de-DE"), "tester").unwrap_err();
        match err {
            StoreError::NoRecord { kind, id } => {
                assert_eq!(kind, RecordKind::Locale);
                assert_eq!(id.to_string(), "de-DE");
            }
            other => panic!("expected missing locale, got {other:?}"),
        }
    }

    #[test]
    fn test_locale_in_use_cannot_be_deleted() {
        let mut f = fixture();
        f.store.create(&sms(&f, "fr-FR"), "tester").unwrap();
        let fr: RecordId = "fr-FR".parse().unwrap();

        let err = f.store.delete(RecordKind::Locale, fr, "tester").unwrap_err();
        assert!(matches!(
            err,
            StoreError::InUse {
                by: RecordKind::TemplateSms,
                count: 1,
                ..
            }
        ));
        assert!(f.store.get(RecordKind::Locale, fr).is_ok());

        let en: RecordId = "en-US".parse().unwrap();
        assert_eq!(f.store.delete(RecordKind::Locale, en, "tester").unwrap(), 1);
    }

    #[test]
    fn test_archived_locale() {
        let mut f = fixture();
        let fr: RecordId = "fr-FR".parse().unwrap();
        let locale = f.store.get(RecordKind::Locale, fr).unwrap();
        assert!(!locale.is_archived());

        let archived = f
            .validator
            .validate_update(&locale, &json!({ "_archived": true }))
            .unwrap();
        f.store.update(&archived, "tester").unwrap();

        let listed = f.store.list(RecordKind::Locale, &ListFilter::default()).unwrap();
        let codes: Vec<String> = listed.iter().map(|r| r.id().to_string()).collect();
        assert_eq!(codes, vec!["en-US"]);

        let all = ListFilter {
            archived: true,
            ..Default::default()
        };
        assert_eq!(f.store.list(RecordKind::Locale, &all).unwrap().len(), 2);

        // Archived records are read only
        let renamed = f
            .validator
            .validate_update(&archived, &json!({ "name": "Français" }))
            .unwrap();
        let err = f.store.update(&renamed, "tester").unwrap_err();
        assert!(matches!(err, StoreError::Archived { .. }));
    }

    #[test]
    fn test_find_by_unknown_field() {
        let f = fixture();
        let err = f
            .store
            .find_by(RecordKind::Template, "nope\" OR 1=1 --", "x")
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownField { .. }));

        let found = f.store.find_by(RecordKind::Template, "name", "welcome").unwrap();
        assert_eq!(found.map(|r| r.id()), Some(f.template.id()));
    }

    #[test]
    fn test_update_missing_record() {
        let mut f = fixture();
        let record = sms(&f, "en-US");
        let err = f.store.update(&record, "tester").unwrap_err();
        assert!(matches!(err, StoreError::NoRecord { .. }));
    }

    #[test]
    fn test_find_variant_and_list() {
        let mut f = fixture();
        f.store.create(&email(&f, "fr-FR"), "tester").unwrap();
        f.store.create(&email(&f, "en-US"), "tester").unwrap();

        let en = LocaleCode::parse("en-US").unwrap();
        let found = f
            .store
            .find_variant(RecordKind::TemplateEmail, f.template.id(), &en)
            .unwrap()
            .unwrap();
        assert_eq!(found.get_str("locale"), Some("en-US"));

        let de = LocaleCode::parse("de-DE").unwrap();
        assert!(f
            .store
            .find_variant(RecordKind::TemplateEmail, f.template.id(), &de)
            .unwrap()
            .is_none());

        let all = f
            .store
            .list(RecordKind::TemplateEmail, &ListFilter::template(f.template.id()))
            .unwrap();
        let locales: Vec<_> = all.iter().filter_map(|r| r.get_str("locale")).collect();
        assert_eq!(locales, vec!["en-US", "fr-FR"]);
    }

    #[test]
    fn test_contents_sorted_by_locale() {
        let mut f = fixture();
        f.store.create(&sms(&f, "fr-FR"), "tester").unwrap();
        f.store.create(&email(&f, "fr-FR"), "tester").unwrap();
        f.store.create(&email(&f, "en-US"), "tester").unwrap();

        let contents = f.store.contents(f.template.id()).unwrap();
        let order: Vec<_> = contents
            .iter()
            .map(|r| (r.get_str("locale").unwrap_or_default().to_string(), r.kind()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("en-US".to_string(), RecordKind::TemplateEmail),
                ("fr-FR".to_string(), RecordKind::TemplateEmail),
                ("fr-FR".to_string(), RecordKind::TemplateSms),
            ]
        );
    }

    #[test]
    fn test_delete_cascades_to_variants() {
        let mut f = fixture();
        let record = email(&f, "en-US");
        f.store.create(&record, "tester").unwrap();
        f.store.create(&sms(&f, "en-US"), "tester").unwrap();

        let removed = f
            .store
            .delete(RecordKind::Template, f.template.id(), "tester")
            .unwrap();
        assert_eq!(removed, 3);
        assert!(matches!(
            f.store.get(RecordKind::TemplateEmail, record.id()),
            Err(StoreError::NoRecord { .. })
        ));
        assert_eq!(f.store.count(RecordKind::TemplateSms).unwrap(), 0);

        let history = f.store.changes(RecordKind::TemplateEmail, record.id()).unwrap();
        assert_eq!(history.last().unwrap().items.action, ChangeAction::Delete);
    }

    #[test]
    fn test_delete_missing() {
        let mut f = fixture();
        let err = f
            .store
            .delete(RecordKind::TemplateSms, RecordId::new(), "tester")
            .unwrap_err();
        assert!(matches!(err, StoreError::NoRecord { .. }));
    }

    #[test]
    fn test_not_installed() {
        let store = Store::open_in_memory().unwrap();
        assert!(!store.is_installed(RecordKind::Template).unwrap());
        let err = store.get(RecordKind::Template, RecordId::new()).unwrap_err();
        assert!(matches!(err, StoreError::NotInstalled));
    }

    #[test]
    fn test_open_file_creates_parent() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/mouth.db");
        let mut store = Store::open(&path).unwrap();
        store.install().unwrap();
        store.install().unwrap();
        assert!(path.exists());
        assert!(store.is_installed(RecordKind::TemplateEmail).unwrap());
    }

    #[test]
    fn test_violated_index() {
        let registry = SchemaRegistry::load().unwrap();
        let desc = registry.descriptor(RecordKind::TemplateSms).unwrap();
        assert_eq!(
            violated_index(
                desc,
                "UNIQUE constraint failed: mouth_template_sms.locale, mouth_template_sms.template"
            )
            .as_deref(),
            Some("ui_template_locale")
        );
        assert_eq!(
            violated_index(desc, "UNIQUE constraint failed: mouth_template_sms._id").as_deref(),
            Some(PRIMARY_INDEX)
        );
        assert_eq!(violated_index(desc, "NOT NULL constraint failed: x.y"), None);
    }
}
