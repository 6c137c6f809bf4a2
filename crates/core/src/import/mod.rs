//! Document import reconciliation: staging extracted rows and merging them
//! into a budget tree.

pub mod draft;
pub mod error;
pub mod service;
pub mod session;


pub use draft::{
    DraftLayout, ImportDraft, ImportGroup, ImportRow, RowIndex, document_type_label,
    provenance_note,
};
pub use error::ImportError;
pub use service::{
    CategoryTarget, FlatDestination, GroupedDestination, ImportDestination, ImportOutcome,
    ImportService, ImportSuggestion, MiniPoolTarget, RowMatch,
};
pub use session::{FailureKind, ImportSession, ImportState};
