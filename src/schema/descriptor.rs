//! Record descriptors - the declarative definition of one record kind
//!
//! A descriptor lists the fields of a record with their type and constraints,
//! plus the storage hints an external SQL engine needs (table name, column
//! types, indexes, charset). Descriptors are loaded from the JSON files under
//! `definitions/` by the [`SchemaRegistry`](super::SchemaRegistry).

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use std::fmt;

use crate::core::identity::RecordKind;

/// Primitive type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Uuid,
    Timestamp,
    String,
    Boolean,
    /// String keys mapped to values from the field's `values` list
    Object,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Uuid => write!(f, "uuid"),
            FieldType::Timestamp => write!(f, "timestamp"),
            FieldType::String => write!(f, "string"),
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::Object => write!(f, "object"),
        }
    }
}

/// Column level storage hints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldStorage {
    /// Explicit SQL type, overriding the one derived from the field type
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub sql_type: Option<String>,

    /// Extra column options, e.g. "default CURRENT_TIMESTAMP"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opts: Option<String>,
}

/// What deleting a referenced record does to the records pointing at it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnDelete {
    /// Refuse the delete while references remain
    #[default]
    Restrict,
    /// Delete the referencing records too
    Cascade,
}

/// A single field of a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Display control hint (textarea, html, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui: Option<String>,

    /// May be absent on create
    #[serde(default)]
    pub optional: bool,

    /// Filled in by the service when absent on create
    #[serde(default)]
    pub server_assigned: bool,

    /// Cannot be changed by an update
    #[serde(default)]
    pub immutable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Value used when an optional field is absent on create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,

    /// Allowed values of an object field's entries
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,

    /// Kind of the record this field points at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<RecordKind>,

    #[serde(default, skip_serializing_if = "is_restrict")]
    pub on_delete: OnDelete,

    #[serde(default)]
    pub storage: FieldStorage,
}

fn is_restrict(on_delete: &OnDelete) -> bool {
    *on_delete == OnDelete::Restrict
}

impl FieldSpec {
    /// Required on create: not optional and not filled in by the service
    pub fn is_required(&self) -> bool {
        !self.optional && !self.server_assigned
    }

    /// The column can never hold NULL once a record is created
    pub fn is_not_null(&self) -> bool {
        !self.optional || self.default.is_some()
    }

    /// Label for display, falling back to the field name
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// JSON Schema fragment for this field
    pub fn to_json_schema(&self) -> JsonValue {
        let mut schema = Map::new();
        match self.field_type {
            FieldType::Uuid => {
                schema.insert("type".into(), json!("string"));
                schema.insert("format".into(), json!("uuid"));
            }
            FieldType::Timestamp => {
                schema.insert("type".into(), json!("string"));
                schema.insert("format".into(), json!("date-time"));
            }
            FieldType::String => {
                schema.insert("type".into(), json!("string"));
            }
            FieldType::Boolean => {
                schema.insert("type".into(), json!("boolean"));
            }
            FieldType::Object => {
                schema.insert("type".into(), json!("object"));
                let entry = if self.values.is_empty() {
                    json!({ "type": "string" })
                } else {
                    json!({ "type": "string", "enum": self.values })
                };
                schema.insert("additionalProperties".into(), entry);
            }
        }
        if let Some(min) = self.min {
            schema.insert("minLength".into(), json!(min));
        }
        if let Some(max) = self.max {
            schema.insert("maxLength".into(), json!(max));
        }
        if let Some(ref pattern) = self.pattern {
            schema.insert("pattern".into(), json!(pattern));
        }
        if let Some(ref label) = self.label {
            schema.insert("title".into(), json!(label));
        }
        JsonValue::Object(schema)
    }
}

/// A table index declared for the storage engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub fields: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

/// Table level storage hints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStorage {
    pub table: String,
    pub charset: String,
    pub collate: String,

    #[serde(default)]
    pub indexes: Vec<IndexSpec>,

    /// Actor types mutations are attributed to; non-empty enables change tracking
    #[serde(default)]
    pub revisions: Vec<String>,
}

/// Whether a candidate is a new record or a partial update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Create,
    Update,
}

/// The full definition of one record kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub kind: RecordKind,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub fields: Vec<FieldSpec>,
    pub storage: TableStorage,
}

impl SchemaDescriptor {
    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Fields that must be present on create
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.is_required())
    }

    /// Fields the service fills in when absent
    pub fn server_assigned_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.server_assigned)
    }

    /// Fields an update may not change
    pub fn immutable_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.immutable)
    }

    /// Fields pointing at another record kind, with that kind
    pub fn reference_fields(&self) -> impl Iterator<Item = (&FieldSpec, RecordKind)> {
        self.fields
            .iter()
            .filter_map(|f| f.references.map(|kind| (f, kind)))
    }

    pub fn table(&self) -> &str {
        &self.storage.table
    }

    /// Name of the change tracking table, if revisions are declared
    pub fn changes_table(&self) -> Option<String> {
        if self.storage.revisions.is_empty() {
            None
        } else {
            Some(format!("{}_changes", self.storage.table))
        }
    }

    /// Whether records of this kind can be archived instead of deleted
    pub fn is_archivable(&self) -> bool {
        self.field("_archived").is_some()
    }

    /// Check the descriptor is internally consistent
    ///
    /// The key may be client supplied (locale codes) but never changes; the
    /// timestamps are always assigned by the service.
    pub fn check(&self) -> Result<(), String> {
        match self.field("_id") {
            Some(f) if f.immutable => {}
            Some(_) => return Err("'_id' must be immutable".to_string()),
            None => return Err("missing '_id' field".to_string()),
        }
        for ts_field in ["_created", "_updated"] {
            match self.field(ts_field) {
                Some(f) if f.server_assigned => {}
                Some(_) => return Err(format!("'{}' must be server assigned", ts_field)),
                None => return Err(format!("missing '{}' field", ts_field)),
            }
        }
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(format!("duplicate field '{}'", field.name));
            }
            if let Some(ref pattern) = field.pattern {
                regex::Regex::new(pattern)
                    .map_err(|e| format!("field '{}' has a bad pattern: {}", field.name, e))?;
            }
            if !field.values.is_empty() && field.field_type != FieldType::Object {
                return Err(format!("only object fields take 'values' ('{}')", field.name));
            }
            if field.on_delete == OnDelete::Cascade && field.references.is_none() {
                return Err(format!("'{}' cascades but references nothing", field.name));
            }
        }
        for index in &self.storage.indexes {
            if let Some(missing) = index.fields.iter().find(|f| self.field(f).is_none()) {
                return Err(format!(
                    "index '{}' names unknown field '{}'",
                    index.name, missing
                ));
            }
        }
        Ok(())
    }

    /// Render the descriptor as a JSON Schema document
    ///
    /// In [`Mode::Create`] the required list is enforced; in [`Mode::Update`]
    /// every field is optional. Unknown fields are rejected in both modes.
    pub fn to_json_schema(&self, mode: Mode) -> JsonValue {
        let properties: Map<String, JsonValue> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.to_json_schema()))
            .collect();

        let mut schema = json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "title": self.title,
            "description": self.description,
            "type": "object",
            "properties": properties,
            "additionalProperties": false,
        });

        if mode == Mode::Create {
            let required: Vec<&str> = self.required_fields().map(|f| f.name.as_str()).collect();
            schema["required"] = json!(required);
        }

        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sms() -> SchemaDescriptor {
        serde_json::from_str(include_str!("../../definitions/template_sms.json")).unwrap()
    }

    #[test]
    fn test_parse_definition() {
        let desc = sms();
        assert_eq!(desc.kind, RecordKind::TemplateSms);
        assert_eq!(desc.table(), "mouth_template_sms");
        assert_eq!(desc.field("content").unwrap().max, Some(65535));
        assert_eq!(
            desc.field("locale").unwrap().storage.sql_type.as_deref(),
            Some("char(5)")
        );
        assert!(desc.check().is_ok());
    }

    #[test]
    fn test_required_and_server_assigned() {
        let desc = sms();
        let required: Vec<&str> = desc.required_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(required, vec!["template", "locale", "content"]);

        let assigned: Vec<&str> = desc
            .server_assigned_fields()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(assigned, vec!["_id", "_created", "_updated"]);
    }

    #[test]
    fn test_json_schema_modes() {
        let desc = sms();
        let create = desc.to_json_schema(Mode::Create);
        assert_eq!(create["required"], json!(["template", "locale", "content"]));
        assert_eq!(create["additionalProperties"], json!(false));
        assert_eq!(create["properties"]["_id"]["format"], json!("uuid"));
        assert_eq!(create["properties"]["locale"]["pattern"], json!("^[a-z]{2}-[A-Z]{2}$"));

        let update = desc.to_json_schema(Mode::Update);
        assert!(update.get("required").is_none());
    }

    #[test]
    fn test_check_rejects_unknown_index_field() {
        let mut desc = sms();
        desc.storage.indexes[0].fields.push("region".into());
        let err = desc.check().unwrap_err();
        assert!(err.contains("region"));
    }

    #[test]
    fn test_check_rejects_missing_identity() {
        let mut desc = sms();
        desc.fields.retain(|f| f.name != "_updated");
        assert!(desc.check().unwrap_err().contains("_updated"));
    }

    #[test]
    fn test_reference_policies() {
        let desc = sms();
        let refs: Vec<(&str, RecordKind, OnDelete)> = desc
            .reference_fields()
            .map(|(f, kind)| (f.name.as_str(), kind, f.on_delete))
            .collect();
        assert_eq!(
            refs,
            vec![
                ("template", RecordKind::Template, OnDelete::Cascade),
                ("locale", RecordKind::Locale, OnDelete::Restrict),
            ]
        );
    }

    #[test]
    fn test_locale_definition() {
        let desc: SchemaDescriptor =
            serde_json::from_str(include_str!("../../definitions/locale.json")).unwrap();
        assert!(desc.check().is_ok());
        assert!(desc.is_archivable());
        assert!(!sms().is_archivable());

        // The code is the key, so it is required on create
        let required: Vec<&str> = desc.required_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(required, vec!["_id", "name"]);

        let schema = desc.to_json_schema(Mode::Create);
        assert_eq!(schema["properties"]["_archived"]["type"], json!("boolean"));
        assert!(desc.changes_table().is_none());
    }

    #[test]
    fn test_check_rejects_cascade_without_reference() {
        let mut desc = sms();
        if let Some(content) = desc.fields.iter_mut().find(|f| f.name == "content") {
            content.on_delete = OnDelete::Cascade;
        }
        assert!(desc.check().unwrap_err().contains("content"));
    }

    #[test]
    fn test_changes_table() {
        let mut desc = sms();
        assert_eq!(desc.changes_table().as_deref(), Some("mouth_template_sms_changes"));
        desc.storage.revisions.clear();
        assert_eq!(desc.changes_table(), None);
    }
}
