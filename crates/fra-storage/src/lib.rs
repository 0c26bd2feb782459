//! FRA Storage Library
//!
//! Durable blob storage for accepted uploads: the `Storage` trait, a local filesystem
//! backend, the staging area in-flight uploads are written to, and storage key generation.
//!
//! # Storage key format
//!
//! `{sanitized stem}-{unix millis}-{sequence}-{random hex}{extension}`, e.g.
//! `readings-1717171717171-42-9f3a01bc.csv`. Keys are flat (no directories), never start with
//! a dot and never contain `..`, so they cannot collide with the staging area or escape the
//! storage root. Key generation is centralized in the `keys` module.

pub mod factory;
pub mod keys;
pub mod local;
pub mod staging;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use fra_core::StorageBackend;
pub use keys::generate_storage_key;
pub use local::LocalStorage;
pub use staging::{StagedFile, StagingArea};
pub use traits::{Storage, StorageError, StorageResult};
