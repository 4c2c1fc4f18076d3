//! Participant repository: joining, guests, edits and balance-gated removal.
//!
//! Leaving and removal are logical: `left_at` is set and the row stays, so
//! historic expenses and settlements keep pointing at it.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tally_core::BankInfo;
use tally_core::event::EventService;
use tally_core::participant::{ParticipantPolicy, ParticipantRef};
use tally_shared::types::{EventId, ParticipantId, UserId};
use tally_shared::{AppError, AppResult};
use uuid::Uuid;

use crate::entities::{participants, users};
use crate::repositories::collector::deactivate_for_participant;
use crate::repositories::ledger::LedgerSnapshot;
use crate::repositories::scope::{
    all_participants, creator_of, db_error, event_status, find_active_participant,
    insert_error, load_for_member, lock_event, lock_for_member, now, require_member,
};

/// Input for joining an event. Absent fields default to the user's profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinEventInput {
    /// Display name within the event.
    #[serde(default)]
    pub name: Option<String>,
    /// Bank details; each absent field falls back to the profile.
    #[serde(default)]
    pub bank_info: Option<BankInfo>,
}

/// Input for adding a guest participant.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddGuestInput {
    /// Guest display name.
    pub name: String,
    /// Guest bank details.
    #[serde(default)]
    pub bank_info: Option<BankInfo>,
}

/// Input for editing a participant. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateParticipantInput {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Replacement bank details.
    #[serde(default)]
    pub bank_info: Option<BankInfo>,
}

/// A participant as shown to other members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    /// Participant id.
    pub id: ParticipantId,
    /// Display name.
    pub name: String,
    /// Backing user, absent for guests.
    pub user_id: Option<UserId>,
    /// True for guests.
    pub is_guest: bool,
    /// True for the event creator.
    pub is_creator: bool,
    /// Bank details.
    pub bank_info: BankInfo,
    /// Join time.
    pub joined_at: DateTime<Utc>,
}

impl ParticipantView {
    fn new(model: &participants::Model, creator: UserId) -> Self {
        let user_id = model.user_id.map(UserId::from_uuid);
        Self {
            id: ParticipantId::from_uuid(model.id),
            name: model.name.clone(),
            user_id,
            is_guest: user_id.is_none(),
            is_creator: user_id == Some(creator),
            bank_info: model.bank_info(),
            joined_at: model.joined_at.with_timezone(&Utc),
        }
    }
}

fn reference(model: &participants::Model) -> ParticipantRef {
    ParticipantRef {
        id: ParticipantId::from_uuid(model.id),
        user_id: model.user_id.map(UserId::from_uuid),
    }
}

/// Participant repository.
#[derive(Debug, Clone)]
pub struct ParticipantRepository {
    db: DatabaseConnection,
}

impl ParticipantRepository {
    /// Creates a new participant repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Active participants of the event in join order.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown event, `PermissionDenied` for non-members.
    pub async fn list(&self, event_id: EventId, requester: UserId) -> AppResult<Vec<ParticipantView>> {
        let (event, _) = load_for_member(&self.db, event_id, requester).await?;
        let creator = creator_of(&event);
        Ok(all_participants(&self.db, event_id)
            .await?
            .iter()
            .filter(|p| p.is_active())
            .map(|p| ParticipantView::new(p, creator))
            .collect())
    }

    /// Joins the event as the given user.
    ///
    /// A user who left earlier gets the same row back.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` when the user is already an active participant
    /// - `InvalidInput` for a closed event or a bad name
    /// - `NotFound` for an unknown event or user
    pub async fn join(
        &self,
        event_id: EventId,
        user_id: UserId,
        input: JoinEventInput,
    ) -> AppResult<ParticipantView> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let event = lock_event(&txn, event_id).await?;
        EventService::ensure_open(event_status(&event)?)?;

        let user = users::Entity::find_by_id(user_id.into_inner())
            .one(&txn)
            .await
            .map_err(db_error)?
            .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;

        let existing = participants::Entity::find()
            .filter(participants::Column::EventId.eq(event_id.into_inner()))
            .filter(participants::Column::UserId.eq(user_id.into_inner()))
            .one(&txn)
            .await
            .map_err(db_error)?;
        ParticipantPolicy::ensure_not_joined(
            existing
                .as_ref()
                .filter(|p| p.is_active())
                .map(|p| ParticipantId::from_uuid(p.id)),
        )?;

        let name = ParticipantPolicy::validate_name(input.name.as_deref().unwrap_or(user.name.as_str()))?;
        let bank = input
            .bank_info
            .unwrap_or_default()
            .normalized()
            .or_fields_from(&user.bank_info());

        let model = if let Some(previous) = existing {
            let mut active: participants::ActiveModel = previous.into();
            active.name = Set(name);
            active.bank_name = Set(bank.bank_name);
            active.account_number = Set(bank.account_number);
            active.account_holder = Set(bank.account_holder);
            active.joined_at = Set(now());
            active.left_at = Set(None);
            active.update(&txn).await.map_err(db_error)?
        } else {
            participants::ActiveModel {
                id: Set(Uuid::now_v7()),
                event_id: Set(event_id.into_inner()),
                user_id: Set(Some(user_id.into_inner())),
                name: Set(name),
                bank_name: Set(bank.bank_name),
                account_number: Set(bank.account_number),
                account_holder: Set(bank.account_holder),
                joined_at: Set(now()),
                left_at: Set(None),
            }
            .insert(&txn)
            .await
            .map_err(|e| insert_error(e, "participant"))?
        };

        txn.commit().await.map_err(db_error)?;

        tracing::info!(event_id = %event_id, participant_id = %model.id, "Participant joined");
        Ok(ParticipantView::new(&model, creator_of(&event)))
    }

    /// Adds a guest without a login.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` for non-members, `InvalidInput` for a closed event or bad name.
    pub async fn add_guest(
        &self,
        event_id: EventId,
        requester: UserId,
        input: AddGuestInput,
    ) -> AppResult<ParticipantView> {
        let name = ParticipantPolicy::validate_name(&input.name)?;
        let bank = input.bank_info.unwrap_or_default().normalized();

        let txn = self.db.begin().await.map_err(db_error)?;

        let event = lock_event(&txn, event_id).await?;
        require_member(&txn, event_id, requester).await?;
        EventService::ensure_open(event_status(&event)?)?;

        let model = participants::ActiveModel {
            id: Set(Uuid::now_v7()),
            event_id: Set(event_id.into_inner()),
            user_id: Set(None),
            name: Set(name),
            bank_name: Set(bank.bank_name),
            account_number: Set(bank.account_number),
            account_holder: Set(bank.account_holder),
            joined_at: Set(now()),
            left_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(db_error)?;

        txn.commit().await.map_err(db_error)?;

        tracing::info!(event_id = %event_id, participant_id = %model.id, "Guest added");
        Ok(ParticipantView::new(&model, creator_of(&event)))
    }

    /// Edits a participant's name or bank details.
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` unless editing yourself, or a guest as the creator
    /// - `NotFound` for an unknown participant
    pub async fn update(
        &self,
        event_id: EventId,
        requester: UserId,
        participant_id: ParticipantId,
        input: UpdateParticipantInput,
    ) -> AppResult<ParticipantView> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let (event, _) = lock_for_member(&txn, event_id, requester).await?;
        let target = find_active_participant(&txn, event_id, participant_id).await?;
        ParticipantPolicy::ensure_can_update(requester, creator_of(&event), &reference(&target))?;

        let mut active: participants::ActiveModel = target.into();
        if let Some(name) = input.name.as_deref() {
            active.name = Set(ParticipantPolicy::validate_name(name)?);
        }
        if let Some(bank) = input.bank_info {
            let bank = bank.normalized();
            active.bank_name = Set(bank.bank_name);
            active.account_number = Set(bank.account_number);
            active.account_holder = Set(bank.account_holder);
        }
        let model = active.update(&txn).await.map_err(db_error)?;

        txn.commit().await.map_err(db_error)?;

        tracing::info!(event_id = %event_id, participant_id = %participant_id, "Participant updated");
        Ok(ParticipantView::new(&model, creator_of(&event)))
    }

    /// Leaves the event. The balance must be settled first.
    ///
    /// # Errors
    ///
    /// - `BalanceNotZero` while the participant owes or is owed money
    /// - `InvalidInput` for the creator
    /// - `PermissionDenied` for non-members
    pub async fn leave(&self, event_id: EventId, user_id: UserId) -> AppResult<()> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let (event, member) = lock_for_member(&txn, event_id, user_id).await?;
        ParticipantPolicy::ensure_can_leave(user_id, creator_of(&event))?;

        let participant_id = ParticipantId::from_uuid(member.id);
        let balance = LedgerSnapshot::load(&txn, event_id).await?.balance_of(participant_id);
        if let Err(err) = ParticipantPolicy::ensure_zero_balance(balance) {
            tracing::warn!(event_id = %event_id, participant_id = %participant_id, %balance, "Leave rejected");
            return Err(err);
        }

        deactivate_for_participant(&txn, event_id, participant_id).await?;
        let mut active: participants::ActiveModel = member.into();
        active.left_at = Set(Some(now()));
        active.update(&txn).await.map_err(db_error)?;

        txn.commit().await.map_err(db_error)?;

        tracing::info!(event_id = %event_id, participant_id = %participant_id, "Participant left");
        Ok(())
    }

    /// Removes another participant. Creator only; the balance must be settled.
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` unless the requester created the event
    /// - `InvalidInput` when the creator targets themselves
    /// - `BalanceNotZero` while the target owes or is owed money
    /// - `NotFound` for an unknown participant
    pub async fn kick(
        &self,
        event_id: EventId,
        requester: UserId,
        participant_id: ParticipantId,
    ) -> AppResult<()> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let event = lock_event(&txn, event_id).await?;
        let target = find_active_participant(&txn, event_id, participant_id).await?;
        ParticipantPolicy::ensure_can_kick(requester, creator_of(&event), &reference(&target))?;

        let balance = LedgerSnapshot::load(&txn, event_id).await?.balance_of(participant_id);
        if let Err(err) = ParticipantPolicy::ensure_zero_balance(balance) {
            tracing::warn!(event_id = %event_id, participant_id = %participant_id, %balance, "Removal rejected");
            return Err(err);
        }

        deactivate_for_participant(&txn, event_id, participant_id).await?;
        let mut active: participants::ActiveModel = target.into();
        active.left_at = Set(Some(now()));
        active.update(&txn).await.map_err(db_error)?;

        txn.commit().await.map_err(db_error)?;

        tracing::info!(event_id = %event_id, participant_id = %participant_id, "Participant removed");
        Ok(())
    }
}
