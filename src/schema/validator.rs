//! Record validation against the compiled descriptors

use chrono::{DateTime, Utc};
use jsonschema::{
    error::ValidationErrorKind, ValidationError as JsonSchemaError, Validator as JsonValidator,
};
use miette::Diagnostic;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::core::identity::{RecordId, RecordKind};
use crate::core::record::{parse_timestamp, Record, CREATED_FIELD, ID_FIELD, UPDATED_FIELD};
use crate::schema::descriptor::{Mode, SchemaDescriptor};
use crate::schema::registry::{RegistryError, SchemaRegistry};
use crate::schema::report::DocumentError;

/// The constraint a field violated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// A non-optional field is absent
    MissingRequiredField,
    /// The value is not of the declared type (uuid, string, timestamp, object)
    TypeMismatch { expected: String },
    /// The value does not match the declared pattern
    PatternMismatch { pattern: String },
    /// The string is longer than the declared maximum
    MaxLengthExceeded { limit: u64 },
    /// The string is shorter than the declared minimum
    MinLengthNotMet { limit: u64 },
    /// The value is not one of the allowed values
    InvalidValue { allowed: Vec<String> },
    /// The field is not declared by the descriptor
    UnknownField,
}

impl Constraint {
    /// Short name, used as a diagnostic label
    pub fn name(&self) -> &'static str {
        match self {
            Constraint::MissingRequiredField => "missing",
            Constraint::TypeMismatch { .. } => "wrong type",
            Constraint::PatternMismatch { .. } => "pattern mismatch",
            Constraint::MaxLengthExceeded { .. } => "too long",
            Constraint::MinLengthNotMet { .. } => "too short",
            Constraint::InvalidValue { .. } => "invalid value",
            Constraint::UnknownField => "unknown field",
        }
    }
}

/// One field failing one constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Dotted path of the field, e.g. `subject` or `variables.first_name`
    pub field: String,
    pub constraint: Constraint,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, constraint: Constraint) -> Self {
        Self {
            field: field.into(),
            constraint,
        }
    }

    /// Suggestion for fixing the violation
    pub fn help(&self) -> Option<String> {
        match &self.constraint {
            Constraint::MissingRequiredField => Some(format!("Add the '{}' field", self.field)),
            Constraint::PatternMismatch { pattern } if self.field == "locale" => Some(format!(
                "Locale codes look like 'en-US' ({})",
                pattern
            )),
            Constraint::InvalidValue { allowed } => {
                Some(format!("Valid values: {}", allowed.join(", ")))
            }
            Constraint::UnknownField => {
                Some(format!("Remove the '{}' field or check spelling", self.field))
            }
            _ => None,
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.constraint {
            Constraint::MissingRequiredField => write!(f, "'{}' is required", self.field),
            Constraint::TypeMismatch { expected } => {
                write!(f, "'{}' must be a {}", self.field, expected)
            }
            Constraint::PatternMismatch { pattern } => {
                write!(f, "'{}' does not match {}", self.field, pattern)
            }
            Constraint::MaxLengthExceeded { limit } => {
                write!(f, "'{}' is longer than {} characters", self.field, limit)
            }
            Constraint::MinLengthNotMet { limit } => {
                write!(f, "'{}' is shorter than {} characters", self.field, limit)
            }
            Constraint::InvalidValue { allowed } => {
                write!(f, "'{}' must be one of: {}", self.field, allowed.join(", "))
            }
            Constraint::UnknownField => write!(f, "'{}' is not a known field", self.field),
        }
    }
}

/// Validation failure for a candidate record
#[derive(Debug, Error, Diagnostic)]
pub enum ValidationError {
    #[error("invalid {kind}: {}", summarize(.violations))]
    #[diagnostic(code(mouth::validate::fields))]
    Fields {
        kind: RecordKind,
        violations: Vec<FieldViolation>,
    },

    #[error("invalid {kind}: expected a mapping of field names to values")]
    #[diagnostic(code(mouth::validate::not_a_mapping))]
    NotAMapping { kind: RecordKind },

    #[error("nothing to update on {kind}: only immutable or no fields were given")]
    #[diagnostic(code(mouth::validate::nothing_to_update))]
    NothingToUpdate { kind: RecordKind },

    #[error("no schema registered for {0}")]
    #[diagnostic(code(mouth::validate::unknown_kind))]
    UnknownKind(RecordKind),
}

impl ValidationError {
    /// The field violations, empty for structural errors
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            ValidationError::Fields { violations, .. } => violations,
            _ => &[],
        }
    }

    /// Get the number of violations
    pub fn violation_count(&self) -> usize {
        self.violations().len()
    }

    /// Find the violation reported for a field
    pub fn violation_for(&self, field: &str) -> Option<&FieldViolation> {
        self.violations().iter().find(|v| v.field == field)
    }
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Schema validator with compiled schemas
pub struct Validator {
    registry: SchemaRegistry,
    /// Compiled JSON schemas by kind and mode
    compiled: HashMap<(RecordKind, Mode), JsonValidator>,
}

impl Validator {
    /// Create a new validator with schemas from the registry
    pub fn new(registry: &SchemaRegistry) -> Result<Self, RegistryError> {
        let mut compiled = HashMap::new();

        for descriptor in registry.iter() {
            for mode in [Mode::Create, Mode::Update] {
                let schema = descriptor.to_json_schema(mode);
                let validator = jsonschema::options()
                    .should_validate_formats(true)
                    .build(&schema)
                    .map_err(|e| RegistryError::Invalid {
                        kind: descriptor.kind,
                        message: e.to_string(),
                    })?;
                compiled.insert((descriptor.kind, mode), validator);
            }
        }

        Ok(Self {
            registry: registry.clone(),
            compiled,
        })
    }

    /// Create a validator over the embedded definitions
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::new(&SchemaRegistry::load()?)
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Validate a new record and fill in its server assigned fields
    pub fn validate(&self, kind: RecordKind, input: &JsonValue) -> Result<Record, ValidationError> {
        self.validate_at(kind, input, Utc::now())
    }

    /// Like [`Validator::validate`] with an explicit creation time
    pub fn validate_at(
        &self,
        kind: RecordKind,
        input: &JsonValue,
        now: DateTime<Utc>,
    ) -> Result<Record, ValidationError> {
        let descriptor = self.descriptor(kind)?;
        let candidate = input
            .as_object()
            .ok_or(ValidationError::NotAMapping { kind })?;

        let mut violations = self.check(descriptor, Mode::Create, input);

        let id = match candidate.get(ID_FIELD).and_then(JsonValue::as_str) {
            Some(raw) => RecordId::parse(raw).ok().or_else(|| {
                push_type_mismatch(&mut violations, descriptor, ID_FIELD);
                None
            }),
            None => Some(RecordId::new()),
        };
        let created = read_timestamp(candidate, descriptor, CREATED_FIELD, &mut violations);
        let updated = read_timestamp(candidate, descriptor, UPDATED_FIELD, &mut violations);

        if !violations.is_empty() {
            return Err(fields_error(kind, violations));
        }

        let created = created.unwrap_or(now);
        // Never earlier than the creation time, as on update
        let updated = updated.unwrap_or(created).max(created);

        let mut fields = Map::new();
        for field in descriptor.fields() {
            if is_identity(&field.name) {
                continue;
            }
            match candidate.get(&field.name) {
                Some(value) => {
                    fields.insert(field.name.clone(), value.clone());
                }
                None => {
                    if let Some(ref default) = field.default {
                        fields.insert(field.name.clone(), default.clone());
                    }
                }
            }
        }

        // Checked above; a parse failure was pushed as a violation
        let id = id.unwrap_or_default();

        tracing::debug!(%kind, %id, "validated new record");
        Ok(Record::new(kind, id, created, updated, fields))
    }

    /// Validate a partial update against an existing record and merge it
    ///
    /// Immutable fields in the patch are ignored. The returned record has
    /// its `_updated` timestamp refreshed.
    pub fn validate_update(
        &self,
        existing: &Record,
        patch: &JsonValue,
    ) -> Result<Record, ValidationError> {
        self.validate_update_at(existing, patch, Utc::now())
    }

    /// Like [`Validator::validate_update`] with an explicit update time
    pub fn validate_update_at(
        &self,
        existing: &Record,
        patch: &JsonValue,
        now: DateTime<Utc>,
    ) -> Result<Record, ValidationError> {
        let kind = existing.kind();
        let descriptor = self.descriptor(kind)?;
        let candidate = patch
            .as_object()
            .ok_or(ValidationError::NotAMapping { kind })?;

        let mut changes = candidate.clone();
        for field in descriptor.immutable_fields() {
            if changes.remove(&field.name).is_some() {
                tracing::debug!(%kind, field = %field.name, "ignoring immutable field in update");
            }
        }

        if changes.is_empty() {
            return Err(ValidationError::NothingToUpdate { kind });
        }

        let changes = JsonValue::Object(changes);
        let violations = self.check(descriptor, Mode::Update, &changes);
        if !violations.is_empty() {
            return Err(fields_error(kind, violations));
        }

        let mut merged = existing.clone();
        if let JsonValue::Object(changes) = changes {
            merged.fields_mut().extend(changes);
        }
        merged.touch(now.max(existing.created()));

        tracing::debug!(%kind, id = %merged.id(), "validated update");
        Ok(merged)
    }

    /// Validate YAML (or JSON) document text as a new record
    ///
    /// Failures carry the source text and a span for each violation.
    pub fn validate_document(
        &self,
        content: &str,
        filename: &str,
        kind: RecordKind,
    ) -> Result<Record, DocumentError> {
        let yaml_value: serde_yml::Value = serde_yml::from_str(content)
            .map_err(|e| DocumentError::from_yaml_error(filename, content, &e))?;

        let json_value: JsonValue = serde_json::to_value(&yaml_value)
            .map_err(|e| DocumentError::conversion(filename, content, &e))?;

        self.validate(kind, &json_value)
            .map_err(|e| DocumentError::from_validation(filename, content, &e))
    }

    fn descriptor(&self, kind: RecordKind) -> Result<&SchemaDescriptor, ValidationError> {
        self.registry
            .get(kind)
            .ok_or(ValidationError::UnknownKind(kind))
    }

    /// Run the compiled schema and collect every violation
    fn check(
        &self,
        descriptor: &SchemaDescriptor,
        mode: Mode,
        value: &JsonValue,
    ) -> Vec<FieldViolation> {
        let Some(schema) = self.compiled.get(&(descriptor.kind, mode)) else {
            return Vec::new();
        };

        schema
            .iter_errors(value)
            .flat_map(|e| error_to_violations(descriptor, &e))
            .collect()
    }
}

fn is_identity(name: &str) -> bool {
    matches!(name, ID_FIELD | CREATED_FIELD | UPDATED_FIELD)
}

fn fields_error(kind: RecordKind, mut violations: Vec<FieldViolation>) -> ValidationError {
    violations.sort_by(|a, b| a.field.cmp(&b.field));
    violations.dedup();
    ValidationError::Fields { kind, violations }
}

fn push_type_mismatch(
    violations: &mut Vec<FieldViolation>,
    descriptor: &SchemaDescriptor,
    field: &str,
) {
    if violations.iter().any(|v| v.field == field) {
        return;
    }
    violations.push(FieldViolation::new(
        field,
        Constraint::TypeMismatch {
            expected: expected_type(descriptor, field),
        },
    ));
}

fn read_timestamp(
    candidate: &Map<String, JsonValue>,
    descriptor: &SchemaDescriptor,
    field: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<DateTime<Utc>> {
    let raw = candidate.get(field)?.as_str()?;
    match parse_timestamp(raw) {
        Ok(ts) => Some(ts),
        Err(_) => {
            push_type_mismatch(violations, descriptor, field);
            None
        }
    }
}

/// Convert a JSON pointer such as `/variables/name` into `variables.name`
fn pointer_to_field(pointer: &str) -> String {
    pointer
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// Declared type name for a (possibly nested) field path
fn expected_type(descriptor: &SchemaDescriptor, path: &str) -> String {
    match path.split_once('.') {
        // Entries of object fields are strings
        Some(_) => "string".to_string(),
        None => descriptor
            .field(path)
            .map(|f| f.field_type.to_string())
            .unwrap_or_else(|| "object".to_string()),
    }
}

/// Convert a JSON Schema validation error to our violation format
fn error_to_violations(
    descriptor: &SchemaDescriptor,
    error: &JsonSchemaError,
) -> Vec<FieldViolation> {
    let path = pointer_to_field(&error.instance_path.to_string());

    let constraint = match &error.kind {
        ValidationErrorKind::Required { property } => {
            let prop_str = property
                .as_str()
                .map(|s| s.to_string())
                .unwrap_or_else(|| property.to_string());
            let field = if path.is_empty() {
                prop_str
            } else {
                format!("{}.{}", path, prop_str)
            };
            return vec![FieldViolation::new(field, Constraint::MissingRequiredField)];
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => {
            return unexpected
                .iter()
                .map(|name| {
                    let field = if path.is_empty() {
                        name.clone()
                    } else {
                        format!("{}.{}", path, name)
                    };
                    FieldViolation::new(field, Constraint::UnknownField)
                })
                .collect();
        }
        ValidationErrorKind::Type { .. } | ValidationErrorKind::Format { .. } => {
            Constraint::TypeMismatch {
                expected: expected_type(descriptor, &path),
            }
        }
        ValidationErrorKind::Pattern { pattern } => Constraint::PatternMismatch {
            pattern: pattern.clone(),
        },
        ValidationErrorKind::MaxLength { limit } => Constraint::MaxLengthExceeded { limit: *limit },
        ValidationErrorKind::MinLength { limit } => Constraint::MinLengthNotMet { limit: *limit },
        ValidationErrorKind::Enum { options } => Constraint::InvalidValue {
            allowed: options
                .as_array()
                .map(|arr| {
                    arr.iter()
                        .map(|v| v.as_str().map(|s| s.to_string()).unwrap_or_else(|| v.to_string()))
                        .collect()
                })
                .unwrap_or_default(),
        },
        _ => {
            tracing::warn!(field = %path, error = %error, "unmapped schema error");
            Constraint::TypeMismatch {
                expected: expected_type(descriptor, &path),
            }
        }
    };

    vec![FieldViolation::new(path, constraint)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    const TEMPLATE_ID: &str = "3f2a6c1e-9b7d-4e2a-8c41-0d5e6f7a8b9c";

    fn validator() -> Validator {
        Validator::builtin().unwrap()
    }

    fn email(locale: &str, subject: &str) -> JsonValue {
        json!({
            "template": TEMPLATE_ID,
            "locale": locale,
            "subject": subject,
            "text": "Hi",
            "html": "<p>Hi</p>"
        })
    }

    fn sms(content: &str) -> JsonValue {
        json!({
            "template": TEMPLATE_ID,
            "locale": "en-US",
            "content": content
        })
    }

    fn only_constraint(err: &ValidationError, field: &str) -> Constraint {
        let violation = err
            .violation_for(field)
            .unwrap_or_else(|| panic!("no violation for {field}: {err}"));
        violation.constraint.clone()
    }

    #[test]
    fn test_valid_email_assigns_identity() {
        let record = validator()
            .validate(RecordKind::TemplateEmail, &email("en-US", "Welcome"))
            .unwrap();

        assert_eq!(record.kind(), RecordKind::TemplateEmail);
        assert_eq!(record.created(), record.updated());
        assert_eq!(record.get_str("subject"), Some("Welcome"));
        assert_eq!(record.get_str("html"), Some("<p>Hi</p>"));
        assert_eq!(record.get_str("template"), Some(TEMPLATE_ID));
        assert!(!record.id().to_string().is_empty());
    }

    #[test]
    fn test_each_create_gets_a_new_id() {
        let v = validator();
        let a = v.validate(RecordKind::TemplateSms, &sms("Hi")).unwrap();
        let b = v.validate(RecordKind::TemplateSms, &sms("Hi")).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_valid_locales_pass() {
        let v = validator();
        for locale in ["en-US", "fr-FR", "de-DE"] {
            let result = v.validate(RecordKind::TemplateEmail, &email(locale, "Welcome"));
            assert!(result.is_ok(), "{locale} should pass: {:?}", result.err());
        }
    }

    #[test]
    fn test_invalid_locales_fail_with_pattern_mismatch() {
        let v = validator();
        for locale in ["EN-us", "eng-US", "en_US"] {
            let err = v
                .validate(RecordKind::TemplateEmail, &email(locale, "Welcome"))
                .unwrap_err();
            assert!(
                matches!(only_constraint(&err, "locale"), Constraint::PatternMismatch { .. }),
                "{locale}: {err}"
            );
        }
    }

    #[test]
    fn test_subject_length_limit() {
        let v = validator();
        let ok = "s".repeat(255);
        assert!(v.validate(RecordKind::TemplateEmail, &email("en-US", &ok)).is_ok());

        let too_long = "s".repeat(256);
        let err = v
            .validate(RecordKind::TemplateEmail, &email("en-US", &too_long))
            .unwrap_err();
        assert_eq!(
            only_constraint(&err, "subject"),
            Constraint::MaxLengthExceeded { limit: 255 }
        );
    }

    #[test]
    fn test_body_length_limits() {
        let v = validator();
        let ok = "x".repeat(65535);
        let too_long = "x".repeat(65536);

        assert!(v.validate(RecordKind::TemplateSms, &sms(&ok)).is_ok());
        let err = v.validate(RecordKind::TemplateSms, &sms(&too_long)).unwrap_err();
        assert_eq!(
            only_constraint(&err, "content"),
            Constraint::MaxLengthExceeded { limit: 65535 }
        );

        for field in ["text", "html"] {
            let mut input = email("en-US", "Welcome");
            input[field] = json!(ok);
            assert!(v.validate(RecordKind::TemplateEmail, &input).is_ok());

            input[field] = json!(too_long);
            let err = v.validate(RecordKind::TemplateEmail, &input).unwrap_err();
            assert_eq!(
                only_constraint(&err, field),
                Constraint::MaxLengthExceeded { limit: 65535 }
            );
        }
    }

    #[test]
    fn test_length_counts_characters() {
        let v = validator();
        // 255 two-byte characters is still within the limit
        let subject = "é".repeat(255);
        assert!(v
            .validate(RecordKind::TemplateEmail, &email("en-US", &subject))
            .is_ok());
    }

    #[test]
    fn test_missing_required_fields() {
        let err = validator()
            .validate(RecordKind::TemplateEmail, &json!({ "locale": "en-US" }))
            .unwrap_err();

        for field in ["template", "subject", "text", "html"] {
            assert_eq!(only_constraint(&err, field), Constraint::MissingRequiredField);
        }
        assert!(err.violation_for("_id").is_none());
        assert!(err.violation_for("_created").is_none());
        assert_eq!(err.violation_count(), 4);
    }

    #[test]
    fn test_template_must_be_uuid() {
        let mut input = sms("Hi");
        input["template"] = json!("3f2a-not-a-uuid");
        let err = validator().validate(RecordKind::TemplateSms, &input).unwrap_err();
        assert_eq!(
            only_constraint(&err, "template"),
            Constraint::TypeMismatch {
                expected: "uuid".into()
            }
        );
    }

    #[test]
    fn test_wrong_primitive_type() {
        let mut input = sms("Hi");
        input["content"] = json!(42);
        let err = validator().validate(RecordKind::TemplateSms, &input).unwrap_err();
        assert_eq!(
            only_constraint(&err, "content"),
            Constraint::TypeMismatch {
                expected: "string".into()
            }
        );
    }

    #[test]
    fn test_bad_timestamp() {
        let mut input = sms("Hi");
        input["_created"] = json!("yesterday");
        let err = validator().validate(RecordKind::TemplateSms, &input).unwrap_err();
        assert_eq!(
            only_constraint(&err, "_created"),
            Constraint::TypeMismatch {
                expected: "timestamp".into()
            }
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut input = sms("Hi");
        input["subject"] = json!("SMS has no subject");
        let err = validator().validate(RecordKind::TemplateSms, &input).unwrap_err();
        assert_eq!(only_constraint(&err, "subject"), Constraint::UnknownField);
    }

    #[test]
    fn test_not_a_mapping() {
        let err = validator()
            .validate(RecordKind::TemplateSms, &json!(["content"]))
            .unwrap_err();
        assert!(matches!(err, ValidationError::NotAMapping { .. }));
    }

    #[test]
    fn test_supplied_identity_is_kept() {
        let mut input = sms("Hi");
        input["_id"] = json!("0b1c2d3e-4f50-4a6b-9c7d-8e9fa0b1c2d3");
        input["_created"] = json!("2024-01-01T00:00:00Z");
        let record = validator().validate(RecordKind::TemplateSms, &input).unwrap();

        assert_eq!(record.id().to_string(), "0b1c2d3e-4f50-4a6b-9c7d-8e9fa0b1c2d3");
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(record.created(), created);
        assert_eq!(record.updated(), created);
    }

    #[test]
    fn test_supplied_updated_never_precedes_created() {
        let mut input = sms("Hi");
        input["_created"] = json!("2024-02-01T00:00:00Z");
        input["_updated"] = json!("2024-01-01T00:00:00Z");
        let record = validator().validate(RecordKind::TemplateSms, &input).unwrap();

        let created = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        assert_eq!(record.created(), created);
        assert_eq!(record.updated(), created);

        input["_updated"] = json!("2024-03-01T00:00:00Z");
        let record = validator().validate(RecordKind::TemplateSms, &input).unwrap();
        assert_eq!(
            record.updated(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_locale_requires_code() {
        let v = validator();
        let record = v
            .validate(
                RecordKind::Locale,
                &json!({ "_id": "pt-BR", "name": "Portuguese (Brazil)" }),
            )
            .unwrap();
        assert_eq!(record.id().to_string(), "pt-BR");
        assert_eq!(record.fields()["_archived"], json!(false));

        let err = v
            .validate(RecordKind::Locale, &json!({ "name": "Portuguese" }))
            .unwrap_err();
        assert_eq!(only_constraint(&err, "_id"), Constraint::MissingRequiredField);

        let err = v
            .validate(RecordKind::Locale, &json!({ "_id": "pt_BR", "name": "Portuguese" }))
            .unwrap_err();
        assert!(matches!(
            only_constraint(&err, "_id"),
            Constraint::PatternMismatch { .. }
        ));
    }

    #[test]
    fn test_locale_update_keeps_code() {
        let v = validator();
        let record = v
            .validate(RecordKind::Locale, &json!({ "_id": "de-DE", "name": "German" }))
            .unwrap();
        let updated = v
            .validate_update(&record, &json!({ "_id": "de-AT", "name": "Deutsch" }))
            .unwrap();
        assert_eq!(updated.id(), record.id());
        assert_eq!(updated.get_str("name"), Some("Deutsch"));
    }

    #[test]
    fn test_template_defaults_and_variables() {
        let v = validator();
        let record = v
            .validate(RecordKind::Template, &json!({ "name": "welcome" }))
            .unwrap();
        assert_eq!(record.fields()["variables"], json!({}));

        let err = v
            .validate(
                RecordKind::Template,
                &json!({ "name": "welcome", "variables": { "first_name": "text" } }),
            )
            .unwrap_err();
        assert!(matches!(
            only_constraint(&err, "variables.first_name"),
            Constraint::InvalidValue { .. }
        ));
    }

    #[test]
    fn test_template_name_rules() {
        let v = validator();
        let err = v
            .validate(RecordKind::Template, &json!({ "name": "" }))
            .unwrap_err();
        assert_eq!(
            only_constraint(&err, "name"),
            Constraint::MinLengthNotMet { limit: 1 }
        );

        let err = v
            .validate(RecordKind::Template, &json!({ "name": "has spaces" }))
            .unwrap_err();
        assert!(matches!(
            only_constraint(&err, "name"),
            Constraint::PatternMismatch { .. }
        ));
    }

    #[test]
    fn test_update_refreshes_timestamp_and_ignores_immutable() {
        let v = validator();
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
        let record = v
            .validate_at(RecordKind::TemplateEmail, &email("en-US", "Welcome"), created)
            .unwrap();

        let patch = json!({
            "_id": "0b1c2d3e-4f50-4a6b-9c7d-8e9fa0b1c2d3",
            "locale": "fr-FR",
            "subject": "Bienvenue"
        });
        let updated = v.validate_update_at(&record, &patch, later).unwrap();

        assert_eq!(updated.id(), record.id());
        assert_eq!(updated.get_str("locale"), Some("en-US"));
        assert_eq!(updated.get_str("subject"), Some("Bienvenue"));
        assert_eq!(updated.get_str("text"), Some("Hi"));
        assert_eq!(updated.created(), created);
        assert_eq!(updated.updated(), later);
    }

    #[test]
    fn test_update_validates_changed_fields() {
        let v = validator();
        let record = v.validate(RecordKind::TemplateSms, &sms("Hi")).unwrap();
        let err = v
            .validate_update(&record, &json!({ "content": "x".repeat(65536) }))
            .unwrap_err();
        assert_eq!(
            only_constraint(&err, "content"),
            Constraint::MaxLengthExceeded { limit: 65535 }
        );
    }

    #[test]
    fn test_update_with_only_immutable_fields() {
        let v = validator();
        let record = v.validate(RecordKind::TemplateSms, &sms("Hi")).unwrap();
        let err = v
            .validate_update(
                &record,
                &json!({ "template": TEMPLATE_ID, "_updated": "2024-01-01T00:00:00Z" }),
            )
            .unwrap_err();
        assert!(matches!(err, ValidationError::NothingToUpdate { .. }));
    }

    #[test]
    fn test_violations_sorted_by_field() {
        let err = validator()
            .validate(
                RecordKind::TemplateEmail,
                &json!({ "template": TEMPLATE_ID, "locale": "en_US", "subject": "s".repeat(300) }),
            )
            .unwrap_err();
        let fields: Vec<&str> = err.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["html", "locale", "subject", "text"]);
    }

    #[test]
    fn test_validate_document_yaml() {
        let yaml = format!(
            "template: {}\nlocale: en-US\ncontent: |\n  Your code is {{code}}\n",
            TEMPLATE_ID
        );
        let record = validator()
            .validate_document(&yaml, "welcome.en-US.sms.yaml", RecordKind::TemplateSms)
            .unwrap();
        assert_eq!(record.get_str("content"), Some("Your code is {code}\n"));
    }

    #[test]
    fn test_validate_document_reports_violations() {
        let yaml = format!("template: {}\nlocale: en_US\n", TEMPLATE_ID);
        let err = validator()
            .validate_document(&yaml, "bad.sms.yaml", RecordKind::TemplateSms)
            .unwrap_err();
        assert_eq!(err.violation_count(), 2);
    }

    #[test]
    fn test_pointer_to_field() {
        assert_eq!(pointer_to_field(""), "");
        assert_eq!(pointer_to_field("/subject"), "subject");
        assert_eq!(pointer_to_field("/variables/first_name"), "variables.first_name");
    }
}
