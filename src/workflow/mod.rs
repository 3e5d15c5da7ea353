//! Workflow Module
//!
//! The protected-form flow from passive snapshot to decision and step-up.

pub mod form;

pub use form::{FormOptions, ProtectedForm};
