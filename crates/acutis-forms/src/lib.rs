//! acutis-forms
//!
//! The intake form engine. Pure and synchronous, with no storage dependency.
//! Resolves reusable form elements, expands templates into renderable
//! field lists, validates answers, and gates step transitions.

pub mod catalog;
pub mod expand;
pub mod library;
pub mod progress;
pub mod registry;
pub mod validate;

pub use expand::Expander;
pub use library::ElementLibrary;
pub use registry::TemplateRegistry;
