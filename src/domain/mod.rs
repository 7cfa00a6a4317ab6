//! Domain Layer
//!
//! Pure business logic: the data model, the migration classifier, the known
//! program tables, and the persisted dedup state.

pub mod classifier;
pub mod dedup;
pub mod known_programs;
pub mod models;
