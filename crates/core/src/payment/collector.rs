//! Collector selection.
//!
//! An event has at most one active collector: the participant whose bank
//! account is the default target for payments.

use tally_shared::{AppError, AppResult};

use crate::bank::BankInfo;

/// Rules for choosing collector and payment bank details.
pub struct CollectorPolicy;

impl CollectorPolicy {
    /// Bank details for a new collector.
    ///
    /// The participant's own details win when complete; otherwise the
    /// caller-supplied details are used and must be able to receive money.
    pub fn resolve_bank_info(participant: &BankInfo, supplied: Option<BankInfo>) -> AppResult<BankInfo> {
        if participant.is_complete() {
            return Ok(participant.clone());
        }

        let supplied = supplied.map(BankInfo::normalized).unwrap_or_default();
        if supplied.can_receive() {
            Ok(supplied)
        } else {
            Err(AppError::InvalidInput(
                "collector needs a bank name and account number".into(),
            ))
        }
    }

    /// Where a payment should land: the receiver's own account when usable,
    /// else the active collector's.
    pub fn payment_target(receiver: Option<&BankInfo>, collector: Option<&BankInfo>) -> AppResult<BankInfo> {
        receiver
            .filter(|bank| bank.can_receive())
            .or_else(|| collector.filter(|bank| bank.can_receive()))
            .cloned()
            .ok_or_else(|| {
                AppError::InvalidInput(
                    "no bank information available; set a collector or add bank details".into(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank(name: &str, account: &str, holder: &str) -> BankInfo {
        BankInfo::new(Some(name.into()), Some(account.into()), Some(holder.into()))
    }

    #[test]
    fn test_participant_details_preferred_when_complete() {
        let own = bank("VCB", "111", "AN");
        let supplied = bank("ACB", "222", "AN");
        assert_eq!(
            CollectorPolicy::resolve_bank_info(&own, Some(supplied)).unwrap(),
            own
        );
    }

    #[test]
    fn test_supplied_details_used_when_participant_incomplete() {
        let own = BankInfo::new(Some("VCB".into()), None, None);
        let supplied = bank("ACB", "222", "");
        let resolved = CollectorPolicy::resolve_bank_info(&own, Some(supplied)).unwrap();
        assert_eq!(resolved.bank_name.as_deref(), Some("ACB"));
        assert_eq!(resolved.account_holder, None);
    }

    #[test]
    fn test_no_usable_details() {
        let err = CollectorPolicy::resolve_bank_info(&BankInfo::default(), None).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_payment_target_falls_back_to_collector() {
        let receiver = BankInfo::new(Some("VCB".into()), None, Some("BINH".into()));
        let collector = bank("ACB", "222", "AN");

        assert_eq!(
            CollectorPolicy::payment_target(Some(&receiver), Some(&collector)).unwrap(),
            collector
        );
        assert_eq!(
            CollectorPolicy::payment_target(Some(&collector), None).unwrap(),
            collector
        );
        assert!(CollectorPolicy::payment_target(Some(&receiver), None).is_err());
        assert!(CollectorPolicy::payment_target(None, None).is_err());
    }
}
