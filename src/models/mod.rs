//! Typed resource payloads.
//!
//! Both API surfaces have a `Server`, `Database` and so on with different
//! shapes, so the two sets live in separate modules. Request bodies are
//! plain structs; optional fields are skipped when `None`.

pub mod application;
pub mod client;
