//! Domain model for Docket notes.
//!
//! # Responsibility
//! - Define the note record shared by store, service and backup layers.
//!
//! # Invariants
//! - Every note is identified by a store-assigned integer `NoteId`.
//! - Deletion is permanent; there is no tombstone state.

pub mod note;
