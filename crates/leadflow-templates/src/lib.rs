//! # Leadflow Templates
//!
//! Per-stage email templates with the user → global → builtin fallback
//! chain, and the `{{TOKEN}}` variable substitution engine.

pub mod defaults;
pub mod render;
pub mod store;
pub mod template;

pub use render::{RenderedEmail, VariableSet, render};
pub use store::{TemplateRepo, TemplateStore};
pub use template::EmailTemplate;
