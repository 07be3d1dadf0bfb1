//! Source-annotated reports for documents that fail to parse or validate

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::schema::validator::{FieldViolation, ValidationError};

/// YAML syntax error with source location
#[derive(Debug, Error, Diagnostic)]
#[error("YAML syntax error: {message}")]
#[diagnostic(code(mouth::document::syntax))]
pub struct YamlSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("error here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    message: String,
}

impl YamlSyntaxError {
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A document that parsed but does not describe a valid record
#[derive(Debug, Error, Diagnostic)]
#[error("{filename} is invalid: {summary}")]
#[diagnostic(code(mouth::document::invalid))]
pub struct InvalidDocument {
    filename: String,
    summary: String,

    #[source_code]
    src: NamedSource<String>,

    #[related]
    spanned: Vec<SpannedViolation>,

    violations: Vec<FieldViolation>,
}

/// A single violation pointing into the document
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct SpannedViolation {
    #[label("{hint}")]
    span: SourceSpan,

    message: String,
    hint: String,

    #[help]
    help: Option<String>,
}

/// Failure to turn document text into a valid record
#[derive(Debug, Error, Diagnostic)]
pub enum DocumentError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Invalid(#[from] InvalidDocument),
}

impl DocumentError {
    /// Create a syntax error from a serde_yml error
    pub fn from_yaml_error(filename: &str, source: &str, err: &serde_yml::Error) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));

        let offset = line_col_to_offset(source, line, column);
        let message = err.to_string();
        let help = generate_help(&message);

        DocumentError::Syntax(YamlSyntaxError {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            help,
            message,
        })
    }

    /// The YAML parsed but could not be represented as JSON
    pub fn conversion(filename: &str, source: &str, err: &serde_json::Error) -> Self {
        DocumentError::Syntax(YamlSyntaxError {
            src: NamedSource::new(filename, source.to_string()),
            span: first_line_span(source),
            help: Some("Mapping keys must be plain strings".to_string()),
            message: err.to_string(),
        })
    }

    /// Attach source locations to a validation failure
    pub fn from_validation(filename: &str, source: &str, err: &ValidationError) -> Self {
        let spanned: Vec<SpannedViolation> = if err.violations().is_empty() {
            vec![SpannedViolation {
                span: first_line_span(source),
                message: err.to_string(),
                hint: "here".to_string(),
                help: None,
            }]
        } else {
            err.violations()
                .iter()
                .map(|v| SpannedViolation {
                    span: find_field_span(source, &v.field),
                    message: v.to_string(),
                    hint: v.constraint.name().to_string(),
                    help: v.help(),
                })
                .collect()
        };

        let count = spanned.len();
        let summary = if count == 1 {
            "1 error".to_string()
        } else {
            format!("{} errors", count)
        };

        DocumentError::Invalid(InvalidDocument {
            filename: filename.to_string(),
            summary,
            src: NamedSource::new(filename, source.to_string()),
            spanned,
            violations: err.violations().to_vec(),
        })
    }

    /// Field violations behind the failure, empty for syntax errors
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            DocumentError::Syntax(_) => &[],
            DocumentError::Invalid(doc) => &doc.violations,
        }
    }

    /// Get the number of violations
    pub fn violation_count(&self) -> usize {
        match self {
            DocumentError::Syntax(_) => 1,
            DocumentError::Invalid(doc) => doc.spanned.len(),
        }
    }
}

fn first_line_span(content: &str) -> SourceSpan {
    let len = content.find('\n').unwrap_or(content.len()).max(1);
    (0, len).into()
}

/// Find the span for a dotted field path in YAML content
fn find_field_span(content: &str, field: &str) -> SourceSpan {
    let parts: Vec<&str> = field.split('.').filter(|s| !s.is_empty()).collect();

    let Some(search_key) = parts.last() else {
        return first_line_span(content);
    };

    if let Some(span) = find_key_span(content, search_key) {
        return span;
    }

    // Missing nested keys point at their parent
    if parts.len() >= 2 {
        if let Some(span) = find_key_span(content, parts[parts.len() - 2]) {
            return span;
        }
    }

    first_line_span(content)
}

/// Find the span of a key line in YAML content
fn find_key_span(content: &str, key: &str) -> Option<SourceSpan> {
    let search_pattern = format!("{}:", key);

    let mut offset = 0;
    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with(&search_pattern) {
            let key_start = offset + (line.len() - trimmed.len());
            return Some((key_start, trimmed.len()).into());
        }
        offset += line.len() + 1;
    }
    None
}

/// Convert line/column to byte offset
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    for (i, content) in source.split('\n').enumerate() {
        if i + 1 == line {
            let col = content
                .char_indices()
                .nth(column.saturating_sub(1))
                .map(|(j, _)| j)
                .unwrap_or(content.len());
            return offset + col;
        }
        offset += content.len() + 1;
    }
    source.len().saturating_sub(1)
}

/// Generate helpful suggestions based on error message
fn generate_help(message: &str) -> Option<String> {
    let msg_lower = message.to_lowercase();

    if msg_lower.contains("tab") {
        return Some(
            "YAML requires spaces for indentation, not tabs. Replace tabs with spaces.".to_string(),
        );
    }

    if msg_lower.contains("duplicate") {
        return Some("Each field can only appear once. Remove the duplicate.".to_string());
    }

    if msg_lower.contains("mapping values are not allowed") {
        return Some(
            "Values containing ': ' must be quoted, or use a block scalar (content: |)".to_string(),
        );
    }

    if msg_lower.contains("found character that cannot start any token") {
        return Some("Quote values that start with special characters like @ or `".to_string());
    }

    None
}
