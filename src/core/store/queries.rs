//! Read queries

use rusqlite::params_from_iter;
use serde_json::Map;

use super::{
    from_column, map_sqlite_error, parse_change_time, parse_stored_id, ChangeEntry, ListFilter,
    Store, StoreError,
};
use crate::core::identity::{RecordId, RecordKind};
use crate::core::locale::LocaleCode;
use crate::core::record::{Record, ARCHIVED_FIELD, ID_FIELD};
use crate::schema::descriptor::SchemaDescriptor;

impl Store {
    /// Get a record by id
    pub fn get(&self, kind: RecordKind, id: RecordId) -> Result<Record, StoreError> {
        let descriptor = self.registry.descriptor(kind)?;
        self.select(descriptor, &[(ID_FIELD, id.to_string())], Some(1))?
            .pop()
            .ok_or(StoreError::NoRecord { kind, id })
    }

    /// Find the single record whose field holds the given value
    pub fn find_by(
        &self,
        kind: RecordKind,
        field: &str,
        value: &str,
    ) -> Result<Option<Record>, StoreError> {
        let descriptor = self.registry.descriptor(kind)?;
        Ok(self
            .select(descriptor, &[(field, value.to_string())], Some(1))?
            .pop())
    }

    /// Find the variant of a template in one locale
    pub fn find_variant(
        &self,
        kind: RecordKind,
        template: RecordId,
        locale: &LocaleCode,
    ) -> Result<Option<Record>, StoreError> {
        let descriptor = self.registry.descriptor(kind)?;
        let conditions = [
            ("template", template.to_string()),
            ("locale", locale.to_string()),
        ];
        Ok(self.select(descriptor, &conditions, Some(1))?.pop())
    }

    /// List records of a kind
    ///
    /// Filters naming fields the kind does not have are ignored. Archived
    /// records are left out unless the filter asks for them.
    pub fn list(&self, kind: RecordKind, filter: &ListFilter) -> Result<Vec<Record>, StoreError> {
        let descriptor = self.registry.descriptor(kind)?;
        let mut conditions = Vec::new();

        if let Some(template) = filter.template {
            if descriptor.field("template").is_some() {
                conditions.push(("template", template.to_string()));
            }
        }
        if let Some(ref locale) = filter.locale {
            if descriptor.field("locale").is_some() {
                conditions.push(("locale", locale.to_string()));
            }
        }
        if descriptor.is_archivable() && !filter.archived {
            conditions.push((ARCHIVED_FIELD, false.to_string()));
        }

        self.select(descriptor, &conditions, filter.limit)
    }

    /// Every variant of a template, ordered by locale then kind
    pub fn contents(&self, template: RecordId) -> Result<Vec<Record>, StoreError> {
        // Fails with NoRecord for an unknown template
        self.get(RecordKind::Template, template)?;

        let mut records = Vec::new();
        for (kind, field) in self.registry.referencing(RecordKind::Template) {
            let descriptor = self.registry.descriptor(kind)?;
            let condition = [(field.name.as_str(), template.to_string())];
            records.extend(self.select(descriptor, &condition, None)?);
        }

        records.sort_by(|a, b| {
            a.get_str("locale")
                .cmp(&b.get_str("locale"))
                .then(a.kind().cmp(&b.kind()))
        });
        Ok(records)
    }

    /// Number of stored records of a kind
    pub fn count(&self, kind: RecordKind) -> Result<usize, StoreError> {
        let descriptor = self.registry.descriptor(kind)?;
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", descriptor.table());
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|e| map_sqlite_error(descriptor, e))?;
        Ok(count as usize)
    }

    /// Change history of a record, oldest first
    pub fn changes(&self, kind: RecordKind, id: RecordId) -> Result<Vec<ChangeEntry>, StoreError> {
        let descriptor = self.registry.descriptor(kind)?;
        let Some(table) = descriptor.changes_table() else {
            return Ok(Vec::new());
        };

        let sql = format!(
            "SELECT \"_id\", \"_created\", \"items\" FROM \"{}\" \
             WHERE \"_id\" = ?1 ORDER BY rowid",
            table
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| map_sqlite_error(descriptor, e))?;
        let rows: Vec<(String, String, String)> = stmt
            .query_map([id.to_string()], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .map_err(|e| map_sqlite_error(descriptor, e))?
            .collect::<Result<_, _>>()
            .map_err(StoreError::Sqlite)?;

        rows.into_iter()
            .map(|(raw_id, created, items)| -> Result<ChangeEntry, StoreError> {
                Ok(ChangeEntry {
                    id: parse_stored_id(kind, &raw_id)?,
                    created: parse_change_time(kind, &raw_id, &created)?,
                    items: serde_json::from_str(&items).map_err(|e| StoreError::Corrupt {
                        kind,
                        id: raw_id.clone(),
                        message: e.to_string(),
                    })?,
                })
            })
            .collect()
    }

    /// Select records matching every condition, in index order
    ///
    /// Condition names must be declared fields; they are written into the
    /// statement as column names.
    fn select(
        &self,
        descriptor: &SchemaDescriptor,
        conditions: &[(&str, String)],
        limit: Option<usize>,
    ) -> Result<Vec<Record>, StoreError> {
        if let Some((field, _)) = conditions
            .iter()
            .find(|(field, _)| descriptor.field(field).is_none())
        {
            return Err(StoreError::UnknownField {
                kind: descriptor.kind,
                field: field.to_string(),
            });
        }

        let columns = descriptor
            .fields()
            .iter()
            .map(|f| format!("\"{}\"", f.name))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!("SELECT {} FROM \"{}\" WHERE 1=1", columns, descriptor.table());
        for (i, (field, _)) in conditions.iter().enumerate() {
            sql.push_str(&format!(" AND \"{}\" = ?{}", field, i + 1));
        }

        sql.push_str(&format!(" ORDER BY {}", order_by(descriptor)));

        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        tracing::trace!(%sql, "select");

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| map_sqlite_error(descriptor, e))?;
        let width = descriptor.fields().len();
        let rows: Vec<Vec<Option<String>>> = stmt
            .query_map(params_from_iter(conditions.iter().map(|(_, v)| v)), |row| {
                (0..width)
                    .map(|i| row.get::<_, Option<String>>(i))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })
            .map_err(|e| map_sqlite_error(descriptor, e))?
            .collect::<Result<_, _>>()
            .map_err(StoreError::Sqlite)?;

        rows.into_iter()
            .map(|row| row_to_record(descriptor, row))
            .collect()
    }
}

/// Order by the first unique index, then the key
fn order_by(descriptor: &SchemaDescriptor) -> String {
    let mut columns: Vec<String> = descriptor
        .storage
        .indexes
        .iter()
        .find(|i| i.unique)
        .map(|i| i.fields.iter().map(|f| format!("\"{}\"", f)).collect())
        .unwrap_or_default();
    columns.push(format!("\"{}\"", ID_FIELD));
    columns.join(", ")
}

fn row_to_record(
    descriptor: &SchemaDescriptor,
    row: Vec<Option<String>>,
) -> Result<Record, StoreError> {
    let kind = descriptor.kind;
    let mut fields = Map::new();
    let mut id = String::new();

    for (field, text) in descriptor.fields().iter().zip(row) {
        let Some(text) = text else {
            continue;
        };
        if field.name == ID_FIELD {
            id = text.clone();
        }
        let value = from_column(field, text).map_err(|e| StoreError::Corrupt {
            kind,
            id: id.clone(),
            message: format!("'{}': {}", field.name, e),
        })?;
        fields.insert(field.name.clone(), value);
    }

    Record::from_fields(kind, fields).map_err(|e| StoreError::Corrupt {
        kind,
        id,
        message: e.to_string(),
    })
}
