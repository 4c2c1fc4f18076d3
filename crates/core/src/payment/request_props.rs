//! Property-based tests for the payment request state machine.

use proptest::prelude::*;
use tally_shared::types::ParticipantId;
use uuid::Uuid;

use crate::payment::request::{
    PaymentRequestError, PaymentRequestParties, PaymentRequestService, PaymentRequestStatus,
};

fn arb_status() -> impl Strategy<Value = PaymentRequestStatus> {
    prop_oneof![
        Just(PaymentRequestStatus::Pending),
        Just(PaymentRequestStatus::Confirmed),
        Just(PaymentRequestStatus::Canceled),
    ]
}

fn arb_participant() -> impl Strategy<Value = ParticipantId> {
    any::<u128>().prop_map(|n| ParticipantId::from_uuid(Uuid::from_u128(n)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Property 7: Terminal states are final
    // =========================================================================

    #[test]
    fn prop_no_exit_from_terminal_states(
        current in arb_status(),
        target in arb_status(),
        payer in arb_participant(),
        receiver in arb_participant(),
    ) {
        if current.is_terminal() {
            prop_assert!(!current.can_transition_to(target));
        }

        let parties = PaymentRequestParties { payer_id: payer, receiver_id: receiver };
        let confirm = PaymentRequestService::confirm(current, receiver, parties);
        let cancel = PaymentRequestService::cancel(current, receiver, parties);

        if current == PaymentRequestStatus::Pending {
            prop_assert_eq!(confirm, Ok(PaymentRequestStatus::Confirmed));
            prop_assert_eq!(cancel, Ok(PaymentRequestStatus::Canceled));
        } else {
            let is_transition_error =
                matches!(confirm, Err(PaymentRequestError::InvalidTransition { .. }));
            prop_assert!(is_transition_error);
            prop_assert!(cancel.is_err());
        }
    }

    // =========================================================================
    // Property 8: Only the receiver acts on a request
    // =========================================================================

    #[test]
    fn prop_only_receiver_transitions(
        current in arb_status(),
        payer in arb_participant(),
        receiver in arb_participant(),
        other in arb_participant(),
    ) {
        prop_assume!(other != receiver);
        let parties = PaymentRequestParties { payer_id: payer, receiver_id: receiver };

        let is_not_receiver = matches!(
            PaymentRequestService::confirm(current, other, parties),
            Err(PaymentRequestError::NotReceiver { .. })
        );
        prop_assert!(is_not_receiver);
    }
}
