//! acutis-core
//!
//! Pure domain types and storage key conventions for the intake form engine.
//! No I/O. This is the shared vocabulary of the Acutis admissions system.

pub mod error;
pub mod keys;
pub mod models;
