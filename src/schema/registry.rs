//! Registry of the record descriptors shipped with the crate

use miette::Diagnostic;
use rust_embed::Embed;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::identity::RecordKind;
use crate::schema::descriptor::{FieldSpec, SchemaDescriptor};

#[derive(Embed)]
#[folder = "definitions/"]
struct EmbeddedDefinitions;

/// Errors raised while loading descriptors
#[derive(Debug, Error, Diagnostic)]
pub enum RegistryError {
    #[error("no definition found for record kind '{0}'")]
    #[diagnostic(code(mouth::schema::missing_definition))]
    Missing(RecordKind),

    #[error("definition '{file}' could not be parsed: {message}")]
    #[diagnostic(code(mouth::schema::malformed_definition))]
    Malformed { file: String, message: String },

    #[error("definition '{file}' declares kind '{found}'")]
    #[diagnostic(
        code(mouth::schema::kind_mismatch),
        help("the file name must match the kind, e.g. template_sms.json")
    )]
    KindMismatch { file: String, found: RecordKind },

    #[error("definition for '{kind}' is inconsistent: {message}")]
    #[diagnostic(code(mouth::schema::invalid_definition))]
    Invalid { kind: RecordKind, message: String },
}

/// All known descriptors, keyed by record kind
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    descriptors: BTreeMap<RecordKind, SchemaDescriptor>,
}

impl SchemaRegistry {
    /// Load the embedded definitions, one per [`RecordKind`]
    pub fn load() -> Result<Self, RegistryError> {
        let mut descriptors = Vec::with_capacity(RecordKind::all().len());

        for kind in RecordKind::all() {
            let file = format!("{}.json", kind.as_str());
            let embedded = EmbeddedDefinitions::get(&file).ok_or(RegistryError::Missing(*kind))?;

            let descriptor: SchemaDescriptor = serde_json::from_slice(&embedded.data)
                .map_err(|e| RegistryError::Malformed {
                    file: file.clone(),
                    message: e.to_string(),
                })?;

            if descriptor.kind != *kind {
                return Err(RegistryError::KindMismatch {
                    file,
                    found: descriptor.kind,
                });
            }
            descriptors.push(descriptor);
        }

        Self::from_descriptors(descriptors)
    }

    /// Build a registry from already parsed descriptors
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = SchemaDescriptor>,
    ) -> Result<Self, RegistryError> {
        let mut map = BTreeMap::new();
        for descriptor in descriptors {
            descriptor.check().map_err(|message| RegistryError::Invalid {
                kind: descriptor.kind,
                message,
            })?;
            tracing::trace!(
                kind = %descriptor.kind,
                table = descriptor.table(),
                "loaded descriptor"
            );
            map.insert(descriptor.kind, descriptor);
        }
        Ok(Self { descriptors: map })
    }

    /// Get the descriptor for a kind, if registered
    pub fn get(&self, kind: RecordKind) -> Option<&SchemaDescriptor> {
        self.descriptors.get(&kind)
    }

    /// Get the descriptor for a kind, or an error naming the kind
    pub fn descriptor(&self, kind: RecordKind) -> Result<&SchemaDescriptor, RegistryError> {
        self.get(kind).ok_or(RegistryError::Missing(kind))
    }

    /// Iterate descriptors in kind order
    pub fn iter(&self) -> impl Iterator<Item = &SchemaDescriptor> {
        self.descriptors.values()
    }

    /// Kinds whose records reference `parent`, with the referencing field
    pub fn referencing(&self, parent: RecordKind) -> Vec<(RecordKind, &FieldSpec)> {
        self.descriptors
            .values()
            .flat_map(|d| {
                d.reference_fields()
                    .filter(move |(_, target)| *target == parent)
                    .map(move |(field, _)| (d.kind, field))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_embedded_definitions() {
        let registry = SchemaRegistry::load().unwrap();
        for kind in RecordKind::all() {
            assert!(registry.get(*kind).is_some(), "missing {kind}");
        }
        assert_eq!(registry.iter().count(), RecordKind::all().len());
    }

    #[test]
    fn test_tables() {
        let registry = SchemaRegistry::load().unwrap();
        assert_eq!(
            registry.descriptor(RecordKind::TemplateEmail).unwrap().table(),
            "mouth_template_email"
        );
        assert_eq!(
            registry.descriptor(RecordKind::TemplateSms).unwrap().table(),
            "mouth_template_sms"
        );
        assert_eq!(
            registry.descriptor(RecordKind::Template).unwrap().table(),
            "mouth_template"
        );
        assert_eq!(
            registry.descriptor(RecordKind::Locale).unwrap().table(),
            "mouth_locale"
        );
    }

    #[test]
    fn test_referencing() {
        let registry = SchemaRegistry::load().unwrap();
        let names = |parent| -> Vec<(RecordKind, String)> {
            registry
                .referencing(parent)
                .into_iter()
                .map(|(kind, field)| (kind, field.name.clone()))
                .collect()
        };
        assert_eq!(
            names(RecordKind::Template),
            vec![
                (RecordKind::TemplateEmail, "template".to_string()),
                (RecordKind::TemplateSms, "template".to_string())
            ]
        );
        assert_eq!(
            names(RecordKind::Locale),
            vec![
                (RecordKind::TemplateEmail, "locale".to_string()),
                (RecordKind::TemplateSms, "locale".to_string())
            ]
        );
        assert!(registry.referencing(RecordKind::TemplateSms).is_empty());
    }

    #[test]
    fn test_missing_kind() {
        let registry = SchemaRegistry::from_descriptors(Vec::new()).unwrap();
        assert!(matches!(
            registry.descriptor(RecordKind::Template).unwrap_err(),
            RegistryError::Missing(RecordKind::Template)
        ));
    }

    #[test]
    fn test_inconsistent_descriptor_rejected() {
        let registry = SchemaRegistry::load().unwrap();
        let mut desc = registry.descriptor(RecordKind::TemplateSms).unwrap().clone();
        desc.fields.push(desc.fields[0].clone());
        let err = SchemaRegistry::from_descriptors(vec![desc]).unwrap_err();
        assert!(matches!(err, RegistryError::Invalid { .. }));
    }
}
