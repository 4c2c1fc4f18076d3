//! Participant lifecycle policy.

use rust_decimal::Decimal;
use tally_shared::types::{ParticipantId, UserId, is_settled};
use tally_shared::{AppError, AppResult};

/// The identity facts policy decisions need about a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticipantRef {
    /// Participant id.
    pub id: ParticipantId,
    /// Backing user, `None` for guests.
    pub user_id: Option<UserId>,
}

impl ParticipantRef {
    /// True for guest participants with no login.
    #[must_use]
    pub const fn is_guest(&self) -> bool {
        self.user_id.is_none()
    }
}

/// Stateless participant lifecycle rules.
pub struct ParticipantPolicy;

impl ParticipantPolicy {
    /// Maximum display name length in characters.
    pub const MAX_NAME_LEN: usize = 100;

    /// Trims and checks a display name.
    pub fn validate_name(name: &str) -> AppResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("participant name is required".into()));
        }
        if name.chars().count() > Self::MAX_NAME_LEN {
            return Err(AppError::InvalidInput(format!(
                "participant name is longer than {} characters",
                Self::MAX_NAME_LEN
            )));
        }
        Ok(name.to_string())
    }

    /// A user may hold at most one active participant row per event.
    pub fn ensure_not_joined(existing_active: Option<ParticipantId>) -> AppResult<()> {
        match existing_active {
            Some(id) => Err(AppError::AlreadyExists(format!(
                "user already joined this event as participant {id}"
            ))),
            None => Ok(()),
        }
    }

    /// The user-backed participant may edit itself; the creator may edit guests.
    pub fn ensure_can_update(
        requester: UserId,
        creator: UserId,
        target: &ParticipantRef,
    ) -> AppResult<()> {
        match target.user_id {
            Some(owner) if owner == requester => Ok(()),
            None if requester == creator => Ok(()),
            _ => Err(AppError::PermissionDenied(
                "only the participant or, for guests, the event creator may edit".into(),
            )),
        }
    }

    /// Only the creator may remove others, and never themselves.
    pub fn ensure_can_kick(
        requester: UserId,
        creator: UserId,
        target: &ParticipantRef,
    ) -> AppResult<()> {
        if requester != creator {
            return Err(AppError::PermissionDenied(
                "only the event creator can remove participants".into(),
            ));
        }
        if target.user_id == Some(requester) {
            return Err(AppError::InvalidInput("creator cannot remove themselves".into()));
        }
        Ok(())
    }

    /// The creator owns the event and cannot walk away from it.
    pub fn ensure_can_leave(user: UserId, creator: UserId) -> AppResult<()> {
        if user == creator {
            return Err(AppError::InvalidInput(
                "event creator cannot leave; delete the event instead".into(),
            ));
        }
        Ok(())
    }

    /// Removal requires a balance within tolerance of zero.
    pub fn ensure_zero_balance(balance: Decimal) -> AppResult<()> {
        if is_settled(balance) {
            Ok(())
        } else {
            Err(AppError::BalanceNotZero(format!(
                "participant balance is {balance:.2}, settle up first"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn user_backed(user: UserId) -> ParticipantRef {
        ParticipantRef {
            id: ParticipantId::new(),
            user_id: Some(user),
        }
    }

    fn guest() -> ParticipantRef {
        ParticipantRef {
            id: ParticipantId::new(),
            user_id: None,
        }
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(ParticipantPolicy::validate_name("  Lan ").unwrap(), "Lan");
        assert!(ParticipantPolicy::validate_name("   ").is_err());
        assert!(ParticipantPolicy::validate_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_second_join_rejected() {
        let err = ParticipantPolicy::ensure_not_joined(Some(ParticipantId::new())).unwrap_err();
        assert_eq!(err.error_code(), "ALREADY_EXISTS");
        assert!(ParticipantPolicy::ensure_not_joined(None).is_ok());
    }

    #[test]
    fn test_update_permissions() {
        let creator = UserId::new();
        let member = UserId::new();
        let stranger = UserId::new();

        assert!(ParticipantPolicy::ensure_can_update(member, creator, &user_backed(member)).is_ok());
        assert!(ParticipantPolicy::ensure_can_update(creator, creator, &guest()).is_ok());
        // creator cannot edit another user's profile row
        assert!(ParticipantPolicy::ensure_can_update(creator, creator, &user_backed(member)).is_err());
        // members cannot edit guests
        assert!(ParticipantPolicy::ensure_can_update(member, creator, &guest()).is_err());
        assert!(ParticipantPolicy::ensure_can_update(stranger, creator, &user_backed(member)).is_err());
    }

    #[test]
    fn test_kick_permissions() {
        let creator = UserId::new();
        let member = UserId::new();

        assert!(ParticipantPolicy::ensure_can_kick(creator, creator, &user_backed(member)).is_ok());
        assert!(ParticipantPolicy::ensure_can_kick(creator, creator, &guest()).is_ok());

        let err = ParticipantPolicy::ensure_can_kick(member, creator, &guest()).unwrap_err();
        assert_eq!(err.error_code(), "PERMISSION_DENIED");

        let err = ParticipantPolicy::ensure_can_kick(creator, creator, &user_backed(creator)).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_creator_cannot_leave() {
        let creator = UserId::new();
        assert!(ParticipantPolicy::ensure_can_leave(creator, creator).is_err());
        assert!(ParticipantPolicy::ensure_can_leave(UserId::new(), creator).is_ok());
    }

    #[test]
    fn test_zero_balance_gate() {
        assert!(ParticipantPolicy::ensure_zero_balance(dec!(0)).is_ok());
        assert!(ParticipantPolicy::ensure_zero_balance(dec!(0.01)).is_ok());
        assert!(ParticipantPolicy::ensure_zero_balance(dec!(-0.01)).is_ok());

        let err = ParticipantPolicy::ensure_zero_balance(dec!(0.02)).unwrap_err();
        assert_eq!(err.error_code(), "BALANCE_NOT_ZERO");
        assert!(ParticipantPolicy::ensure_zero_balance(dec!(-150)).is_err());
    }
}
