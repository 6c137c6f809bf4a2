//! Property-based tests for PaymentWorkflow.

use proptest::prelude::*;
use uuid::Uuid;

use grantwise_shared::types::UserId;

use crate::payment::error::PaymentError;
use crate::payment::service::PaymentWorkflow;
use crate::payment::types::{PaymentAction, PaymentStatus};

fn arb_status() -> impl Strategy<Value = PaymentStatus> {
    prop_oneof![
        Just(PaymentStatus::Pending),
        Just(PaymentStatus::Approved),
        Just(PaymentStatus::Rejected),
        Just(PaymentStatus::Paid),
    ]
}

fn arb_user() -> impl Strategy<Value = UserId> {
    any::<u128>().prop_map(|n| UserId::from_uuid(Uuid::from_u128(n)))
}

fn arb_reason() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9][a-zA-Z0-9 ]{0,60}"
}

/// Runs every transition against `status` and returns the statuses reached.
fn reachable(status: PaymentStatus, user: UserId, reason: &str) -> Vec<PaymentStatus> {
    [
        PaymentWorkflow::approve(status, user, None),
        PaymentWorkflow::reject(status, user, reason.to_string()),
        PaymentWorkflow::mark_paid(status),
        PaymentWorkflow::resubmit(status),
    ]
    .into_iter()
    .filter_map(Result::ok)
    .map(|a| a.new_status())
    .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Property 1: transitions agree with the transition table
    // =========================================================================

    #[test]
    fn prop_reachable_matches_table(
        from in arb_status(),
        user in arb_user(),
        reason in arb_reason(),
    ) {
        for to in reachable(from, user, &reason) {
            prop_assert!(PaymentWorkflow::is_valid_transition(from, to));
        }
    }

    #[test]
    fn prop_failed_transition_names_both_ends(from in arb_status(), user in arb_user()) {
        match PaymentWorkflow::approve(from, user, None) {
            Ok(_) => prop_assert_eq!(from, PaymentStatus::Pending),
            Err(PaymentError::InvalidTransition { from: f, to }) => {
                prop_assert_eq!(f, from);
                prop_assert_eq!(to, PaymentStatus::Approved);
            }
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }

    // =========================================================================
    // Property 2: paid is terminal
    // =========================================================================

    #[test]
    fn prop_paid_is_terminal(user in arb_user(), reason in arb_reason()) {
        prop_assert!(reachable(PaymentStatus::Paid, user, &reason).is_empty());
    }

    // =========================================================================
    // Property 3: audit fields carry the actor
    // =========================================================================

    #[test]
    fn prop_reject_records_reviewer_and_reason(user in arb_user(), reason in arb_reason()) {
        let action = PaymentWorkflow::reject(PaymentStatus::Pending, user, reason.clone());
        match action {
            Ok(PaymentAction::Reject { rejected_by, rejection_reason, .. }) => {
                prop_assert_eq!(rejected_by, user);
                prop_assert_eq!(rejection_reason, reason);
            }
            other => prop_assert!(false, "expected Reject, got {other:?}"),
        }
    }
}
