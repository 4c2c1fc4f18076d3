//! Collector repository: the event's default receiving account, and payment links.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use tally_core::BankInfo;
use tally_core::event::EventService;
use tally_core::payment::{
    CollectorPolicy, PaymentLink, PaymentLinkRenderer, ReceivingAccount, build_link,
};
use tally_shared::types::{CollectorId, EventId, ParticipantId, UserId};
use tally_shared::{AppError, AppResult};
use uuid::Uuid;

use crate::entities::{collectors, participants};
use crate::repositories::scope::{
    all_participants, creator_of, db_error, find_active_participant, insert_error,
    load_for_member, lock_event, now,
};

/// Input for choosing a collector.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCollectorInput {
    /// Participant who collects.
    pub participant_id: ParticipantId,
    /// Bank details, used when the participant has none on file.
    #[serde(default)]
    pub bank_info: Option<BankInfo>,
}

/// Input for a payment link.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLinkInput {
    /// Receiving participant; the collector is used when absent or without bank details.
    #[serde(default)]
    pub receiver_id: Option<ParticipantId>,
    /// Amount to pay.
    pub amount: Decimal,
}

/// The active collector of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectorView {
    /// Collector row id.
    pub id: CollectorId,
    /// Collecting participant.
    pub participant_id: ParticipantId,
    /// Collecting participant's name.
    pub participant_name: String,
    /// Receiving account.
    pub bank_info: BankInfo,
    /// When this collector was set.
    pub created_at: DateTime<Utc>,
}

impl CollectorView {
    fn from_model(model: &collectors::Model, participant_name: String) -> Self {
        Self {
            id: CollectorId::from_uuid(model.id),
            participant_id: ParticipantId::from_uuid(model.participant_id),
            participant_name,
            bank_info: model.bank_info(),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// The active collector row joined with its participant name.
pub(crate) async fn active_collector<C: ConnectionTrait>(
    conn: &C,
    event_id: EventId,
    participants: &[participants::Model],
) -> AppResult<Option<CollectorView>> {
    let Some(model) = collectors::Entity::find()
        .filter(collectors::Column::EventId.eq(event_id.into_inner()))
        .filter(collectors::Column::IsActive.eq(true))
        .one(conn)
        .await
        .map_err(db_error)?
    else {
        return Ok(None);
    };

    let name = participants
        .iter()
        .find(|p| p.id == model.participant_id)
        .map(|p| p.name.clone())
        .unwrap_or_default();
    Ok(Some(CollectorView::from_model(&model, name)))
}

/// Retires any active collector of `participant_id`.
pub(crate) async fn deactivate_for_participant<C: ConnectionTrait>(
    conn: &C,
    event_id: EventId,
    participant_id: ParticipantId,
) -> AppResult<u64> {
    let result = collectors::Entity::update_many()
        .col_expr(collectors::Column::IsActive, Expr::value(false))
        .filter(collectors::Column::EventId.eq(event_id.into_inner()))
        .filter(collectors::Column::ParticipantId.eq(participant_id.into_inner()))
        .filter(collectors::Column::IsActive.eq(true))
        .exec(conn)
        .await
        .map_err(db_error)?;
    Ok(result.rows_affected)
}

/// Collector repository.
#[derive(Debug, Clone)]
pub struct CollectorRepository {
    db: DatabaseConnection,
}

impl CollectorRepository {
    /// Creates a new collector repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Makes `input.participant_id` the event's only active collector.
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` unless the requester created the event
    /// - `NotFound` for an unknown event or participant
    /// - `InvalidInput` when no usable bank details exist
    pub async fn set(
        &self,
        event_id: EventId,
        requester: UserId,
        input: SetCollectorInput,
    ) -> AppResult<CollectorView> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let event = lock_event(&txn, event_id).await?;
        EventService::ensure_creator(requester, creator_of(&event), "set the collector")?;
        let participant = find_active_participant(&txn, event_id, input.participant_id).await?;

        let bank = CollectorPolicy::resolve_bank_info(&participant.bank_info(), input.bank_info)?;
        let (Some(bank_name), Some(account_number)) = (bank.bank_name, bank.account_number) else {
            return Err(AppError::InvalidInput(
                "collector needs a bank name and account number".into(),
            ));
        };

        collectors::Entity::update_many()
            .col_expr(collectors::Column::IsActive, Expr::value(false))
            .filter(collectors::Column::EventId.eq(event_id.into_inner()))
            .filter(collectors::Column::IsActive.eq(true))
            .exec(&txn)
            .await
            .map_err(db_error)?;

        let model = collectors::ActiveModel {
            id: Set(Uuid::now_v7()),
            event_id: Set(event_id.into_inner()),
            participant_id: Set(participant.id),
            bank_name: Set(bank_name),
            account_number: Set(account_number),
            account_holder: Set(bank.account_holder.unwrap_or_else(|| participant.name.clone())),
            is_active: Set(true),
            created_at: Set(now()),
        }
        .insert(&txn)
        .await
        .map_err(|e| insert_error(e, "active collector"))?;

        txn.commit().await.map_err(db_error)?;

        tracing::info!(
            event_id = %event_id,
            participant_id = %participant.id,
            "Collector set"
        );

        Ok(CollectorView::from_model(&model, participant.name))
    }

    /// The event's active collector.
    ///
    /// # Errors
    ///
    /// `NotFound` when none is set, `PermissionDenied` for non-members.
    pub async fn get(&self, event_id: EventId, requester: UserId) -> AppResult<CollectorView> {
        load_for_member(&self.db, event_id, requester).await?;
        let participants = all_participants(&self.db, event_id).await?;
        active_collector(&self.db, event_id, &participants)
            .await?
            .ok_or_else(|| AppError::NotFound("no collector set for this event".into()))
    }

    /// Renders a payment link into the receiver's account, falling back to the collector's.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a non-positive amount or when no bank details are usable
    /// - `NotFound` for an unknown receiver
    /// - `PermissionDenied` for non-members
    pub async fn payment_link(
        &self,
        event_id: EventId,
        requester: UserId,
        input: PaymentLinkInput,
        renderer: &dyn PaymentLinkRenderer,
    ) -> AppResult<PaymentLink> {
        if input.amount <= Decimal::ZERO {
            return Err(AppError::InvalidInput(format!(
                "payment amount must be positive, got {}",
                input.amount
            )));
        }

        let (event, _) = load_for_member(&self.db, event_id, requester).await?;

        let receiver_bank = match input.receiver_id {
            Some(id) => Some(find_active_participant(&self.db, event_id, id).await?.bank_info()),
            None => None,
        };
        let collector_bank = collectors::Entity::find()
            .filter(collectors::Column::EventId.eq(event_id.into_inner()))
            .filter(collectors::Column::IsActive.eq(true))
            .one(&self.db)
            .await
            .map_err(db_error)?
            .map(|c| c.bank_info());

        let target = CollectorPolicy::payment_target(receiver_bank.as_ref(), collector_bank.as_ref())?;
        build_link(renderer, ReceivingAccount::try_from(target)?, input.amount, &event.name)
    }
}
