//! Schema system - record descriptors, validation and DDL generation

pub mod ddl;
pub mod descriptor;
pub mod registry;
pub mod report;
pub mod validator;

pub use ddl::{create_table, Dialect};
pub use descriptor::{FieldSpec, FieldType, Mode, OnDelete, SchemaDescriptor};
pub use registry::{RegistryError, SchemaRegistry};
pub use report::DocumentError;
pub use validator::{Constraint, FieldViolation, ValidationError, Validator};
