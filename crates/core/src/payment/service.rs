//! Payment request state machine.
//!
//! Every transition is a pure function of the current status. The caller
//! records the returned [`PaymentAction`] on the request.

use chrono::Utc;
use grantwise_shared::types::{MiniPoolId, PaymentRequestId, UserId};
use rust_decimal::Decimal;

use crate::budget::{ExpenseStatus, NewExpense};
use crate::payment::error::PaymentError;
use crate::payment::types::{NewPaymentRequest, PaymentAction, PaymentRequest, PaymentStatus};

/// Stateless service for payment request transitions.
pub struct PaymentWorkflow;

impl PaymentWorkflow {
    /// Builds a pending request from its input.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveAmount` unless the amount is above zero, and
    /// `MissingField` for a blank payee.
    pub fn create(input: NewPaymentRequest) -> Result<PaymentRequest, PaymentError> {
        if input.amount <= Decimal::ZERO {
            return Err(PaymentError::NonPositiveAmount(input.amount));
        }
        let payee = input.payee.trim();
        if payee.is_empty() {
            return Err(PaymentError::MissingField("payee"));
        }

        Ok(PaymentRequest {
            id: PaymentRequestId::new(),
            grant_id: input.grant_id,
            budget_id: input.budget_id,
            category_id: input.category_id,
            mini_pool_id: input.mini_pool_id,
            payee: payee.to_string(),
            description: input.description.trim().to_string(),
            amount: input.amount,
            status: PaymentStatus::Pending,
            requested_by: input.requested_by,
            requested_at: Utc::now(),
            decided_by: None,
            decided_at: None,
            decision_notes: None,
            rejection_reason: None,
            paid_at: None,
            expense_id: None,
        })
    }

    /// Approves a pending request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the request is not pending.
    pub fn approve(
        current_status: PaymentStatus,
        approved_by: UserId,
        notes: Option<String>,
    ) -> Result<PaymentAction, PaymentError> {
        match current_status {
            PaymentStatus::Pending => Ok(PaymentAction::Approve {
                new_status: PaymentStatus::Approved,
                approved_by,
                approved_at: Utc::now(),
                notes: notes.filter(|n| !n.trim().is_empty()),
            }),
            _ => Err(PaymentError::InvalidTransition {
                from: current_status,
                to: PaymentStatus::Approved,
            }),
        }
    }

    /// Rejects a pending request.
    ///
    /// # Errors
    ///
    /// Returns `RejectionReasonRequired` for a blank reason, and
    /// `InvalidTransition` if the request is not pending.
    pub fn reject(
        current_status: PaymentStatus,
        rejected_by: UserId,
        rejection_reason: String,
    ) -> Result<PaymentAction, PaymentError> {
        if rejection_reason.trim().is_empty() {
            return Err(PaymentError::RejectionReasonRequired);
        }

        match current_status {
            PaymentStatus::Pending => Ok(PaymentAction::Reject {
                new_status: PaymentStatus::Rejected,
                rejected_by,
                rejected_at: Utc::now(),
                rejection_reason,
            }),
            _ => Err(PaymentError::InvalidTransition {
                from: current_status,
                to: PaymentStatus::Rejected,
            }),
        }
    }

    /// Marks an approved request as paid.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the request is not approved.
    pub fn mark_paid(current_status: PaymentStatus) -> Result<PaymentAction, PaymentError> {
        match current_status {
            PaymentStatus::Approved => Ok(PaymentAction::MarkPaid {
                new_status: PaymentStatus::Paid,
                paid_at: Utc::now(),
            }),
            _ => Err(PaymentError::InvalidTransition {
                from: current_status,
                to: PaymentStatus::Paid,
            }),
        }
    }

    /// Sends a rejected request back for review.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the request is not rejected.
    pub fn resubmit(current_status: PaymentStatus) -> Result<PaymentAction, PaymentError> {
        match current_status {
            PaymentStatus::Rejected => Ok(PaymentAction::Resubmit {
                new_status: PaymentStatus::Pending,
                resubmitted_at: Utc::now(),
            }),
            _ => Err(PaymentError::InvalidTransition {
                from: current_status,
                to: PaymentStatus::Pending,
            }),
        }
    }

    /// Check if a status transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: PaymentStatus, to: PaymentStatus) -> bool {
        matches!(
            (from, to),
            (
                PaymentStatus::Pending,
                PaymentStatus::Approved | PaymentStatus::Rejected
            ) | (PaymentStatus::Approved, PaymentStatus::Paid)
                | (PaymentStatus::Rejected, PaymentStatus::Pending)
        )
    }

    /// The spent expense to record when a request is paid.
    ///
    /// `None` when the request names no mini-pool.
    #[must_use]
    pub fn paid_expense(request: &PaymentRequest) -> Option<(MiniPoolId, NewExpense)> {
        let mini_pool_id = request.mini_pool_id?;
        let description = if request.description.is_empty() {
            format!("Payment to {}", request.payee)
        } else {
            request.description.clone()
        };
        Some((
            mini_pool_id,
            NewExpense {
                description,
                amount: Some(request.amount),
                vendor: Some(request.payee.clone()),
                date: request.paid_at.map(|t| t.date_naive()),
                status: ExpenseStatus::Spent,
                notes: Some(format!("Payment request {}", request.id)),
                ..NewExpense::default()
            },
        ))
    }
}
