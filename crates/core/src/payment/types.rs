//! Payment request domain types.

use chrono::{DateTime, Utc};
use grantwise_shared::types::{
    BudgetId, CategoryId, ExpenseId, GrantId, MiniPoolId, PaymentRequestId, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment request status.
///
/// The valid transitions are:
/// - Pending → Approved (approve)
/// - Pending → Rejected (reject)
/// - Approved → Paid (mark paid)
/// - Rejected → Pending (resubmit)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Awaiting a decision.
    #[default]
    Pending,
    /// Approved, not yet paid.
    Approved,
    /// Turned down; may be resubmitted.
    Rejected,
    /// Money has gone out (terminal).
    Paid,
}

impl PaymentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Paid => "paid",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A request to pay money out of a grant budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Request ID.
    pub id: PaymentRequestId,
    /// Grant charged.
    pub grant_id: GrantId,
    /// Budget charged.
    pub budget_id: BudgetId,
    /// Category charged.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// Mini-pool charged; paying the request records the expense here.
    #[serde(default)]
    pub mini_pool_id: Option<MiniPoolId>,
    /// Who gets paid.
    pub payee: String,
    /// What the payment is for.
    pub description: String,
    /// Amount, always positive.
    pub amount: Decimal,
    /// Status.
    #[serde(default)]
    pub status: PaymentStatus,
    /// Who asked.
    pub requested_by: UserId,
    /// When it was asked.
    pub requested_at: DateTime<Utc>,
    /// Who approved or rejected it.
    #[serde(default)]
    pub decided_by: Option<UserId>,
    /// When it was approved or rejected.
    #[serde(default)]
    pub decided_at: Option<DateTime<Utc>>,
    /// Approver's notes.
    #[serde(default)]
    pub decision_notes: Option<String>,
    /// Why it was rejected.
    #[serde(default)]
    pub rejection_reason: Option<String>,
    /// When it was paid.
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    /// Expense recorded on payment.
    #[serde(default)]
    pub expense_id: Option<ExpenseId>,
}

/// Input for creating a payment request.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPaymentRequest {
    /// Grant charged.
    pub grant_id: GrantId,
    /// Budget charged.
    pub budget_id: BudgetId,
    /// Category charged.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// Mini-pool charged.
    #[serde(default)]
    pub mini_pool_id: Option<MiniPoolId>,
    /// Who gets paid.
    pub payee: String,
    /// What it is for.
    #[serde(default)]
    pub description: String,
    /// Amount.
    pub amount: Decimal,
    /// Who asks.
    pub requested_by: UserId,
}

/// A state transition with its audit data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentAction {
    /// Pending → Approved.
    Approve {
        /// Resulting status.
        new_status: PaymentStatus,
        /// Approver.
        approved_by: UserId,
        /// Decision time.
        approved_at: DateTime<Utc>,
        /// Approver's notes.
        notes: Option<String>,
    },
    /// Pending → Rejected.
    Reject {
        /// Resulting status.
        new_status: PaymentStatus,
        /// Reviewer.
        rejected_by: UserId,
        /// Decision time.
        rejected_at: DateTime<Utc>,
        /// Reason given.
        rejection_reason: String,
    },
    /// Approved → Paid.
    MarkPaid {
        /// Resulting status.
        new_status: PaymentStatus,
        /// Payment time.
        paid_at: DateTime<Utc>,
    },
    /// Rejected → Pending.
    Resubmit {
        /// Resulting status.
        new_status: PaymentStatus,
        /// Resubmission time.
        resubmitted_at: DateTime<Utc>,
    },
}

impl PaymentAction {
    /// Returns the new status resulting from this action.
    #[must_use]
    pub fn new_status(&self) -> PaymentStatus {
        match self {
            Self::Approve { new_status, .. }
            | Self::Reject { new_status, .. }
            | Self::MarkPaid { new_status, .. }
            | Self::Resubmit { new_status, .. } => *new_status,
        }
    }
}

impl PaymentRequest {
    /// Records an action on the request.
    pub fn record(&mut self, action: PaymentAction) {
        self.status = action.new_status();
        match action {
            PaymentAction::Approve {
                approved_by,
                approved_at,
                notes,
                ..
            } => {
                self.decided_by = Some(approved_by);
                self.decided_at = Some(approved_at);
                self.decision_notes = notes;
                self.rejection_reason = None;
            }
            PaymentAction::Reject {
                rejected_by,
                rejected_at,
                rejection_reason,
                ..
            } => {
                self.decided_by = Some(rejected_by);
                self.decided_at = Some(rejected_at);
                self.rejection_reason = Some(rejection_reason);
            }
            PaymentAction::MarkPaid { paid_at, .. } => {
                self.paid_at = Some(paid_at);
            }
            PaymentAction::Resubmit { resubmitted_at, .. } => {
                self.requested_at = resubmitted_at;
                self.decided_by = None;
                self.decided_at = None;
                self.decision_notes = None;
            }
        }
    }
}
