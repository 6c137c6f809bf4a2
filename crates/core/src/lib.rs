//! Core business logic for Grantwise.
//!
//! This crate contains pure domain logic with ZERO web framework or store
//! dependencies. The only I/O lives behind the extraction client and the
//! document storage service.
//!
//! # Modules
//!
//! - `grant` - Grants, aims, sub-aims and aim spend distribution
//! - `budget` - Budget tree arena and spent/allocated roll-up
//! - `matching` - Fuzzy matching of suggested names to budget nodes
//! - `extraction` - Expense extraction collaborator and HTTP client
//! - `import` - Reconciling extracted items into a budget tree
//! - `navigation` - Aim -> sub-aim -> activity drill-down
//! - `payment` - Payment request approvals
//! - `storage` - Document blob storage
//! - `document` - Document and template records

pub mod budget;
pub mod document;
pub mod extraction;
pub mod grant;
pub mod import;
pub mod matching;
pub mod navigation;
pub mod payment;
pub mod storage;
