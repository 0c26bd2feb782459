//! Services behind the HTTP handlers.

pub mod analysis;
pub mod ingest;
