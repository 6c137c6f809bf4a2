//! Payment request approvals.
//!
//! - `types` - Request, status and action types
//! - `error` - Payment-specific error types
//! - `service` - State transition logic

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::PaymentError;
pub use service::PaymentWorkflow;
pub use types::{NewPaymentRequest, PaymentAction, PaymentRequest, PaymentStatus};
