//! Entity store for Grantwise.
//!
//! This crate provides:
//! - In-memory collections for every entity, edited through [`EntityStore`]
//! - JSON snapshot persistence with migration of legacy expense flags

mod collection;
pub mod error;
pub mod snapshot;
pub mod store;


pub use error::StoreError;
pub use snapshot::{Snapshot, load_snapshot, save_snapshot};
pub use store::{EntityStore, GrantRemoval};
