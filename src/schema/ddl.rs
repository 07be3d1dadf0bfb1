//! CREATE TABLE generation from descriptor storage hints

use clap::ValueEnum;
use std::fmt::Write as _;

use crate::schema::descriptor::{FieldSpec, FieldType, IndexSpec, SchemaDescriptor};

/// Strings up to this length become `varchar`, longer ones `text`
const VARCHAR_LIMIT: u64 = 255;

/// SQL dialect to render
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Dialect {
    /// MySQL / MariaDB with InnoDB table options
    #[default]
    Mysql,
    /// SQLite, as used by the local store
    Sqlite,
}

/// Render the statements creating a record table, and its change table when
/// the descriptor declares revisions
pub fn create_table(descriptor: &SchemaDescriptor, dialect: Dialect) -> String {
    let mut sql = match dialect {
        Dialect::Mysql => mysql_table(descriptor),
        Dialect::Sqlite => sqlite_table(descriptor),
    };

    if let Some(changes) = descriptor.changes_table() {
        sql.push('\n');
        sql.push_str(&match dialect {
            Dialect::Mysql => mysql_changes_table(&changes, descriptor),
            Dialect::Sqlite => sqlite_changes_table(&changes),
        });
    }

    sql
}

/// Name an index gets in the given dialect
///
/// SQLite index names share one namespace per database, so they are
/// prefixed with the table.
pub fn index_name(descriptor: &SchemaDescriptor, index: &IndexSpec, dialect: Dialect) -> String {
    match dialect {
        Dialect::Mysql => index.name.clone(),
        Dialect::Sqlite => format!("{}_{}", descriptor.table(), index.name),
    }
}

/// MySQL column type for a field
pub fn column_type(field: &FieldSpec) -> String {
    if let Some(ref sql_type) = field.storage.sql_type {
        return sql_type.clone();
    }
    match field.field_type {
        FieldType::Uuid => "char(36)".to_string(),
        FieldType::Timestamp => "timestamp".to_string(),
        FieldType::Boolean => "tinyint(1)".to_string(),
        FieldType::Object => "json".to_string(),
        FieldType::String => match field.max {
            Some(max) if max <= VARCHAR_LIMIT => format!("varchar({})", max),
            _ => "text".to_string(),
        },
    }
}

fn mysql_table(descriptor: &SchemaDescriptor) -> String {
    let mut lines: Vec<String> = descriptor
        .fields()
        .iter()
        .map(|field| {
            let mut line = format!("  `{}` {}", field.name, column_type(field));
            if field.is_not_null() {
                line.push_str(" NOT NULL");
            }
            if let Some(ref opts) = field.storage.opts {
                let _ = write!(line, " {}", opts);
            }
            line
        })
        .collect();

    lines.push("  PRIMARY KEY (`_id`)".to_string());
    for index in &descriptor.storage.indexes {
        let columns = index
            .fields
            .iter()
            .map(|f| format!("`{}`", f))
            .collect::<Vec<_>>()
            .join(", ");
        let key = if index.unique { "UNIQUE KEY" } else { "KEY" };
        lines.push(format!("  {} `{}` ({})", key, index.name, columns));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS `{}` (\n{}\n) ENGINE=InnoDB DEFAULT CHARSET={} COLLATE={};\n",
        descriptor.table(),
        lines.join(",\n"),
        descriptor.storage.charset,
        descriptor.storage.collate
    )
}

fn mysql_changes_table(table: &str, descriptor: &SchemaDescriptor) -> String {
    let key_type = descriptor
        .field("_id")
        .map(column_type)
        .unwrap_or_else(|| "char(36)".to_string());
    format!(
        "CREATE TABLE IF NOT EXISTS `{table}` (\n  \
         `_id` {key_type} NOT NULL,\n  \
         `_created` timestamp NOT NULL default CURRENT_TIMESTAMP,\n  \
         `items` json NOT NULL,\n  \
         KEY `i_id` (`_id`)\n\
         ) ENGINE=InnoDB DEFAULT CHARSET={} COLLATE={};\n",
        descriptor.storage.charset, descriptor.storage.collate
    )
}

fn sqlite_table(descriptor: &SchemaDescriptor) -> String {
    let table = descriptor.table();
    let columns = descriptor
        .fields()
        .iter()
        .map(|field| {
            let mut line = format!("    \"{}\" TEXT", field.name);
            if field.is_not_null() {
                line.push_str(" NOT NULL");
            }
            if field.name == "_id" {
                line.push_str(" PRIMARY KEY");
            }
            line
        })
        .collect::<Vec<_>>()
        .join(",\n");

    let mut sql = format!("CREATE TABLE IF NOT EXISTS \"{}\" (\n{}\n);\n", table, columns);

    for index in &descriptor.storage.indexes {
        let columns = index
            .fields
            .iter()
            .map(|f| format!("\"{}\"", f))
            .collect::<Vec<_>>()
            .join(", ");
        let create = if index.unique {
            "CREATE UNIQUE INDEX"
        } else {
            "CREATE INDEX"
        };
        let _ = writeln!(
            sql,
            "{} IF NOT EXISTS \"{}\" ON \"{}\" ({});",
            create,
            index_name(descriptor, index, Dialect::Sqlite),
            table,
            columns
        );
    }

    sql
}

fn sqlite_changes_table(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS \"{table}\" (\n    \
         \"_id\" TEXT NOT NULL,\n    \
         \"_created\" TEXT NOT NULL,\n    \
         \"items\" TEXT NOT NULL\n\
         );\n\
         CREATE INDEX IF NOT EXISTS \"{table}_i_id\" ON \"{table}\" (\"_id\");\n"
    )
}
