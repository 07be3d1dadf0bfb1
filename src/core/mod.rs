//! Core module - fundamental types and utilities

pub mod config;
pub mod entity;
pub mod identity;
pub mod locale;
pub mod project;
pub mod record;
pub mod store;

pub use config::Config;
pub use entity::{Entity, Variant};
pub use identity::{IdParseError, RecordId, RecordKind};
pub use locale::{LocaleCode, LocaleError};
pub use project::{Project, ProjectError};
pub use record::{Record, RecordError};
pub use store::{ListFilter, Store, StoreError};
