//! Pure, deterministic logic for the agent loop. No I/O.

pub mod generator;
pub mod invariants;
pub mod milestone;
pub mod selector;
pub mod types;
