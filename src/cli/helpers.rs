//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use console::style;
use miette::{IntoDiagnostic, Result};
use serde_json::Value as JsonValue;
use std::io::Read;
use std::path::Path;
use tabled::{builder::Builder, settings::Style};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::core::identity::{RecordId, RecordKind};
use crate::core::project::Project;
use crate::core::record::{Record, CREATED_FIELD, ID_FIELD, UPDATED_FIELD};
use crate::core::store::{Store, StoreError};
use crate::schema::descriptor::{FieldSpec, FieldType, SchemaDescriptor};
use crate::schema::registry::SchemaRegistry;
use crate::schema::report::DocumentError;
use crate::schema::validator::Validator;

/// Width of text columns in list tables
const COLUMN_WIDTH: usize = 40;

/// Format a RecordId for display, keeping the first UUID group
///
/// Locale codes are already short and are shown whole.
pub fn format_short_id(id: &RecordId) -> String {
    match id {
        RecordId::Uuid(uuid) => uuid.simple().to_string()[..8].to_string(),
        RecordId::Locale(code) => code.to_string(),
    }
}

/// Same as format_short_id but works with &str
pub fn format_short_id_str(id: &str) -> String {
    match RecordId::parse(id) {
        Ok(parsed) => format_short_id(&parsed),
        Err(_) => truncate_str(id, 8),
    }
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    if first_line.chars().count() <= max_len && first_line.len() == s.trim_end().len() {
        return first_line.to_string();
    }
    let kept: String = first_line.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Open the configured store
pub fn open_store(global: &GlobalOpts) -> Result<Store> {
    let path = match global.database {
        Some(ref path) => path.clone(),
        None => {
            let project = Project::discover().ok();
            Config::load().database_path(project.as_ref())
        }
    };
    tracing::debug!(path = %path.display(), "using store");
    Ok(Store::open(&path)?)
}

/// The actor mutations are attributed to
pub fn actor() -> String {
    Config::load().actor()
}

/// Build a validator over the embedded descriptors
pub fn load_validator() -> Result<Validator> {
    Ok(Validator::builtin()?)
}

/// Read a record file, or stdin when the path is "-"
///
/// Returns the content and the name to report it under.
pub fn read_input(path: &Path) -> Result<(String, String)> {
    if path.as_os_str() == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .into_diagnostic()?;
        return Ok((content, "<stdin>".to_string()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| miette::miette!("Cannot read {}: {}", path.display(), e))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok((content, filename))
}

/// Parse a YAML (or JSON) patch document
pub fn parse_patch(
    content: &str,
    filename: &str,
) -> std::result::Result<JsonValue, DocumentError> {
    let yaml: serde_yml::Value = serde_yml::from_str(content)
        .map_err(|e| DocumentError::from_yaml_error(filename, content, &e))?;
    serde_json::to_value(&yaml).map_err(|e| DocumentError::conversion(filename, content, &e))
}

/// Look up a template by id or by name
///
/// A UUID that matches no template is tried as a name, since names may look
/// like UUIDs too.
pub fn resolve_template(store: &Store, reference: &str) -> Result<RecordId> {
    if let Ok(id @ RecordId::Uuid(_)) = RecordId::parse(reference) {
        match store.get(RecordKind::Template, id) {
            Ok(_) => return Ok(id),
            Err(StoreError::NoRecord { .. }) => {}
            Err(e) => return Err(e.into()),
        }
    }
    match store.find_by(RecordKind::Template, "name", reference)? {
        Some(record) => Ok(record.id()),
        None => Err(miette::miette!("No template found matching '{}'", reference)),
    }
}

/// Print one record in the requested format
pub fn print_record(
    record: &Record,
    registry: &SchemaRegistry,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(record).into_diagnostic()?);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(record).into_diagnostic()?);
        }
        OutputFormat::Id => {
            println!("{}", record.id());
        }
        OutputFormat::Auto => {
            let descriptor = registry.descriptor(record.kind())?;
            println!("{}", style("─".repeat(60)).dim());
            println!(
                "{}: {}",
                style(&descriptor.title).bold(),
                style(record.id()).cyan()
            );
            println!("{}", style("─".repeat(60)).dim());
            for field in descriptor.fields() {
                if field.name == ID_FIELD {
                    continue;
                }
                let Some(value) = record.get(&field.name) else {
                    continue;
                };
                let text = display_value(&value);
                if text.contains('\n') {
                    println!("{}:", style(field.display_label()).bold());
                    for line in text.lines() {
                        println!("  {}", line);
                    }
                } else {
                    println!("{}: {}", style(field.display_label()).bold(), text);
                }
            }
            println!("{}", style("─".repeat(60)).dim());
        }
    }
    Ok(())
}

/// Print a list of records of one kind in the requested format
pub fn print_records(
    records: &[Record],
    descriptor: &SchemaDescriptor,
    global: &GlobalOpts,
) -> Result<()> {
    match global.format {
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&records).into_diagnostic()?);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(records).into_diagnostic()?);
        }
        OutputFormat::Id => {
            for record in records {
                println!("{}", record.id());
            }
        }
        OutputFormat::Auto => {
            let columns = list_columns(descriptor);
            let mut builder = Builder::default();
            builder.push_record(columns.iter().map(|f| f.display_label().to_uppercase()));

            for record in records {
                builder.push_record(columns.iter().map(|f| {
                    let value = record.get(&f.name).unwrap_or(JsonValue::Null);
                    if f.name == ID_FIELD || f.field_type == FieldType::Uuid {
                        format_short_id_str(value.as_str().unwrap_or_default())
                    } else {
                        truncate_str(&display_value(&value), COLUMN_WIDTH)
                    }
                }));
            }
            println!("{}", builder.build().with(Style::markdown()));

            if !global.quiet {
                println!();
                println!(
                    "{} {} record(s) found",
                    style(records.len()).cyan(),
                    descriptor.kind.short_name()
                );
            }
        }
    }
    Ok(())
}

/// Columns shown in list tables: the key, short fields, and the update time
fn list_columns(descriptor: &SchemaDescriptor) -> Vec<&FieldSpec> {
    descriptor
        .fields()
        .iter()
        .filter(|f| match f.name.as_str() {
            ID_FIELD | UPDATED_FIELD => true,
            CREATED_FIELD => false,
            _ => f.ui.is_none(),
        })
        .collect()
}

fn display_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        JsonValue::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v.as_str().unwrap_or_default()))
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_short_id() {
        let id = RecordId::parse("3f2a6c1e-9b7d-4e2a-8c41-0d5e6f7a8b9c").unwrap();
        assert_eq!(format_short_id(&id), "3f2a6c1e");
        assert_eq!(format_short_id_str("fr-FR"), "fr-FR");
        assert_eq!(format_short_id_str("short"), "short");
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("line one\nline two", 40), "line one...");
        assert_eq!(truncate_str("ééééé", 4), "é...");
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("x")), "x");
        assert_eq!(display_value(&json!(null)), "");
        assert_eq!(
            display_value(&json!({ "age": "integer", "name": "string" })),
            "age: integer, name: string"
        );
    }

    #[test]
    fn test_list_columns() {
        let registry = SchemaRegistry::load().unwrap();
        let email = registry.descriptor(RecordKind::TemplateEmail).unwrap();
        let names: Vec<&str> = list_columns(email).iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["_id", "_updated", "template", "locale", "subject"]);
    }

    #[test]
    fn test_resolve_template_by_id_or_name() {
        let mut store = Store::open_in_memory().unwrap();
        store.install().unwrap();
        let validator = Validator::new(store.registry()).unwrap();

        // A name that is itself a UUID
        let uuid_name = "3f2a6c1e-9b7d-4e2a-8c41-0d5e6f7a8b9c";
        let named = validator
            .validate(RecordKind::Template, &json!({ "name": uuid_name }))
            .unwrap();
        store.create(&named, "tester").unwrap();
        let plain = validator
            .validate(RecordKind::Template, &json!({ "name": "welcome" }))
            .unwrap();
        store.create(&plain, "tester").unwrap();

        assert_eq!(resolve_template(&store, uuid_name).unwrap(), named.id());
        assert_eq!(resolve_template(&store, "welcome").unwrap(), plain.id());
        assert_eq!(
            resolve_template(&store, &plain.id().to_string()).unwrap(),
            plain.id()
        );
        assert!(resolve_template(&store, "missing").is_err());
        assert!(resolve_template(&store, &RecordId::new().to_string()).is_err());
    }

    #[test]
    fn test_parse_patch() {
        let patch = parse_patch("subject: Hello\n", "patch.yaml").unwrap();
        assert_eq!(patch, json!({ "subject": "Hello" }));
        assert!(parse_patch("subject: [unclosed\n", "patch.yaml").is_err());
    }
}
