//! mouth: template records for a notification service
//!
//! Declarative descriptors for templates and their localized email and SMS
//! variants, a validator built from those descriptors, and a SQLite storage
//! adapter that enforces the declared unique indexes.

pub mod cli;
pub mod core;
pub mod entities;
pub mod schema;
