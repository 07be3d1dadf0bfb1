//! Typed record kinds
//!
//! - [`Locale`] - a language and region content is written in
//! - [`Template`] - a named template declaring its variables
//! - [`TemplateEmail`] - the email content of a template in one locale
//! - [`TemplateSms`] - the SMS content of a template in one locale

pub mod locale;
pub mod template;
pub mod template_email;
pub mod template_sms;

pub use locale::Locale;
pub use template::{Template, VariableType};
pub use template_email::TemplateEmail;
pub use template_sms::TemplateSms;
