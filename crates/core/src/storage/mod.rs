//! Document blob storage using Apache OpenDAL.
//!
//! Blobs live under `{grant_id or "unassigned"}/{document_id}/{file_name}` on
//! whichever backend is configured:
//! - S3-compatible object stores
//! - Local filesystem
//! - In-process memory (tests and throwaway servers)

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::DocumentStorageError;
pub use service::{DocumentStorage, StoredBlob};
