//! CLI command implementations

pub mod completions;
pub mod init;
pub mod install;
pub mod locale;
pub mod schema;
pub mod template;
pub mod validate;
pub mod variant;
