//! Schema introspection
//!
//! Shows the record descriptors, the JSON Schema they compile to, and the
//! tables they declare.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::{builder::Builder, settings::Style};

use crate::cli::GlobalOpts;
use crate::core::identity::RecordKind;
use crate::schema::ddl::{column_type, create_table, Dialect};
use crate::schema::descriptor::{FieldSpec, Mode, OnDelete};
use crate::schema::registry::SchemaRegistry;

#[derive(Subcommand, Debug)]
pub enum SchemaCommands {
    /// List all record kinds
    List,

    /// Show the fields of a record kind
    Show(ShowArgs),

    /// Print CREATE TABLE statements
    Ddl(DdlArgs),
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Record kind (locale, template, email, sms)
    pub kind: RecordKind,

    /// Show the generated JSON Schema instead of a field table
    #[arg(long)]
    pub raw: bool,
}

#[derive(clap::Args, Debug)]
pub struct DdlArgs {
    /// Record kind (default: all)
    pub kind: Option<RecordKind>,

    /// SQL dialect
    #[arg(long, short = 'd', value_enum, default_value = "mysql")]
    pub dialect: Dialect,
}

pub fn run(cmd: SchemaCommands, global: &GlobalOpts) -> Result<()> {
    let registry = SchemaRegistry::load()?;
    match cmd {
        SchemaCommands::List => list_schemas(&registry, global),
        SchemaCommands::Show(args) => show_schema(&registry, args),
        SchemaCommands::Ddl(args) => print_ddl(&registry, args),
    }
}

fn list_schemas(registry: &SchemaRegistry, global: &GlobalOpts) -> Result<()> {
    let mut builder = Builder::default();
    builder.push_record(["KIND", "TITLE", "TABLE", "FIELDS"]);
    for descriptor in registry.iter() {
        builder.push_record([
            descriptor.kind.short_name().to_string(),
            descriptor.title.clone(),
            descriptor.table().to_string(),
            descriptor.fields().len().to_string(),
        ]);
    }
    println!("{}", builder.build().with(Style::markdown()));

    if !global.quiet {
        println!("\nUse 'mouth schema show <kind>' for field details");
    }
    Ok(())
}

fn show_schema(registry: &SchemaRegistry, args: ShowArgs) -> Result<()> {
    let descriptor = registry.descriptor(args.kind)?;

    if args.raw {
        let schema = descriptor.to_json_schema(Mode::Create);
        println!("{}", serde_json::to_string_pretty(&schema).into_diagnostic()?);
        return Ok(());
    }

    println!("{}", style(&descriptor.title).bold());
    println!("{}", "=".repeat(descriptor.title.len()));
    if !descriptor.description.is_empty() {
        println!("{}\n", descriptor.description);
    }

    let mut builder = Builder::default();
    builder.push_record(["NAME", "TYPE", "REQ", "CONSTRAINTS", "COLUMN"]);
    for field in descriptor.fields() {
        let required = if field.is_required() {
            "yes"
        } else if field.server_assigned {
            "auto"
        } else {
            ""
        };
        builder.push_record([
            field.name.clone(),
            field.field_type.to_string(),
            required.to_string(),
            constraints(field),
            column_type(field),
        ]);
    }
    println!("{}", builder.build().with(Style::markdown()));

    if !descriptor.storage.indexes.is_empty() {
        println!("\nIndexes:");
        for index in &descriptor.storage.indexes {
            let kind = if index.unique { "unique" } else { "index" };
            println!("  {} ({}) on {}", index.name, kind, index.fields.join(", "));
        }
    }

    let assigned: Vec<&str> = descriptor
        .server_assigned_fields()
        .map(|f| f.name.as_str())
        .collect();
    if !assigned.is_empty() {
        println!("\nAssigned when absent: {}", assigned.join(", "));
    }

    println!("\nUse --raw for the full JSON Schema");
    Ok(())
}

fn constraints(field: &FieldSpec) -> String {
    let mut parts = Vec::new();
    if let Some(min) = field.min {
        parts.push(format!("min {}", min));
    }
    if let Some(max) = field.max {
        parts.push(format!("max {}", max));
    }
    if let Some(ref pattern) = field.pattern {
        parts.push(format!("pattern {}", pattern));
    }
    if !field.values.is_empty() {
        parts.push(format!("values {}", field.values.join("|")));
    }
    if let Some(target) = field.references {
        match field.on_delete {
            OnDelete::Cascade => parts.push(format!("-> {} (cascade)", target)),
            OnDelete::Restrict => parts.push(format!("-> {}", target)),
        }
    }
    if field.immutable && !field.server_assigned {
        parts.push("immutable".to_string());
    }
    parts.join(", ")
}

fn print_ddl(registry: &SchemaRegistry, args: DdlArgs) -> Result<()> {
    let statements: Vec<String> = match args.kind {
        Some(kind) => vec![create_table(registry.descriptor(kind)?, args.dialect)],
        None => registry
            .iter()
            .map(|d| create_table(d, args.dialect))
            .collect(),
    };
    println!("{}", statements.join("\n"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraints_summary() {
        let registry = SchemaRegistry::load().unwrap();
        let email = registry.descriptor(RecordKind::TemplateEmail).unwrap();
        assert_eq!(constraints(email.field("subject").unwrap()), "max 255");
        assert_eq!(
            constraints(email.field("locale").unwrap()),
            "pattern ^[a-z]{2}-[A-Z]{2}$, -> locale, immutable"
        );
        assert_eq!(
            constraints(email.field("template").unwrap()),
            "-> template (cascade), immutable"
        );
        assert_eq!(constraints(email.field("_id").unwrap()), "");
    }
}
