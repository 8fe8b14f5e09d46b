//! acutis-storage
//!
//! The get/put object store behind the intake service. Templates, sessions
//! and the element library are persisted as JSON objects in S3, a local
//! directory, or memory.

pub mod error;
pub mod fs;
pub mod memory;
pub mod objects;
pub mod s3;
pub mod state;

pub use objects::ObjectStore;
