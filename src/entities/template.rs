//! Template entity - the parent of localized email and SMS variants

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::entity::{from_record, Entity};
use crate::core::identity::{RecordId, RecordKind};
use crate::core::record::{Record, RecordError};

/// Declared type of a template variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    String,
    Integer,
    Decimal,
    Boolean,
    Timestamp,
}

impl std::fmt::Display for VariableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableType::String => write!(f, "string"),
            VariableType::Integer => write!(f, "integer"),
            VariableType::Decimal => write!(f, "decimal"),
            VariableType::Boolean => write!(f, "boolean"),
            VariableType::Timestamp => write!(f, "timestamp"),
        }
    }
}

impl std::str::FromStr for VariableType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "string" => Ok(VariableType::String),
            "integer" => Ok(VariableType::Integer),
            "decimal" => Ok(VariableType::Decimal),
            "boolean" => Ok(VariableType::Boolean),
            "timestamp" => Ok(VariableType::Timestamp),
            _ => Err(format!(
                "Invalid variable type: {}. Use string, integer, decimal, boolean, or timestamp",
                s
            )),
        }
    }
}

/// A template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "_id")]
    pub id: RecordId,

    #[serde(rename = "_created")]
    pub created: DateTime<Utc>,

    #[serde(rename = "_updated")]
    pub updated: DateTime<Utc>,

    /// Unique name, used to look the template up when sending
    pub name: String,

    /// Variables the variants may reference, by name
    #[serde(default)]
    pub variables: BTreeMap<String, VariableType>,
}

impl Entity for Template {
    const KIND: RecordKind = RecordKind::Template;

    fn id(&self) -> RecordId {
        self.id
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }
}

impl TryFrom<Record> for Template {
    type Error = RecordError;

    fn try_from(record: Record) -> Result<Self, Self::Error> {
        from_record(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Validator;
    use serde_json::json;

    #[test]
    fn test_from_validated_record() {
        let validator = Validator::builtin().unwrap();
        let record = validator
            .validate(
                RecordKind::Template,
                &json!({
                    "name": "welcome",
                    "variables": { "first_name": "string", "age": "integer" }
                }),
            )
            .unwrap();
        let id = record.id();

        let template = Template::try_from(record).unwrap();
        assert_eq!(template.id, id);
        assert_eq!(template.name, "welcome");
        assert_eq!(template.variables["age"], VariableType::Integer);
        assert_eq!(template.created, template.updated);
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let validator = Validator::builtin().unwrap();
        let record = validator
            .validate(
                RecordKind::TemplateSms,
                &json!({
                    "template": "3f2a6c1e-9b7d-4e2a-8c41-0d5e6f7a8b9c",
                    "locale": "en-US",
                    "content": "Hi"
                }),
            )
            .unwrap();
        assert!(matches!(
            Template::try_from(record),
            Err(RecordError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_variable_type_parse() {
        assert_eq!("Boolean".parse::<VariableType>().unwrap(), VariableType::Boolean);
        assert!("text".parse::<VariableType>().is_err());
        assert_eq!(VariableType::Decimal.to_string(), "decimal");
    }
}
