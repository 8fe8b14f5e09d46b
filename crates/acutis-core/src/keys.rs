//! Object key conventions.
//!
//! Pure string functions. These define the canonical layout of objects in
//! whichever store backs the intake service.

use uuid::Uuid;

pub const LIBRARY: &str = "library/elements.json";

pub const TEMPLATES_PREFIX: &str = "templates/";

pub const SESSIONS_PREFIX: &str = "sessions/";

pub fn template(id: Uuid) -> String {
    format!("{TEMPLATES_PREFIX}{id}.json")
}

pub fn session(id: Uuid) -> String {
    format!("{SESSIONS_PREFIX}{id}.json")
}
