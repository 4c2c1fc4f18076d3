//! Settlement repository: direct transfers recorded between participants.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tally_core::balance::SettlementRecord;
use tally_shared::AppResult;
use tally_shared::types::{EventId, ParticipantId, PaymentRequestId, SettlementId, UserId};

use crate::entities::settlements;
use crate::repositories::ledger::amount;
use crate::repositories::scope::{
    all_participants, db_error, find_active_participant, load_for_member, lock_for_member,
    now,
};

/// Input for recording a settlement.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSettlementInput {
    /// Participant who paid.
    pub payer_id: ParticipantId,
    /// Participant who received.
    pub receiver_id: ParticipantId,
    /// Amount transferred.
    pub amount: Decimal,
}

/// A settlement with participant names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementView {
    /// Settlement id.
    pub id: SettlementId,
    /// Paying participant.
    pub payer_id: ParticipantId,
    /// Paying participant's name.
    pub payer_name: String,
    /// Receiving participant.
    pub receiver_id: ParticipantId,
    /// Receiving participant's name.
    pub receiver_name: String,
    /// Amount transferred.
    pub amount: Decimal,
    /// Originating payment request, if any.
    pub payment_request_id: Option<PaymentRequestId>,
    /// When it was recorded.
    pub created_at: DateTime<Utc>,
}

impl SettlementView {
    pub(crate) fn new(model: &settlements::Model, names: &HashMap<uuid::Uuid, String>) -> Self {
        let name = |id| names.get(&id).cloned().unwrap_or_default();
        Self {
            id: SettlementId::from_uuid(model.id),
            payer_id: ParticipantId::from_uuid(model.payer_id),
            payer_name: name(model.payer_id),
            receiver_id: ParticipantId::from_uuid(model.receiver_id),
            receiver_name: name(model.receiver_id),
            amount: amount(model.amount),
            payment_request_id: model.payment_request_id.map(PaymentRequestId::from_uuid),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Settlement repository.
#[derive(Debug, Clone)]
pub struct SettlementRepository {
    db: DatabaseConnection,
}

impl SettlementRepository {
    /// Creates a new settlement repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a transfer that already happened outside the app.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a bad amount or identical parties
    /// - `PermissionDenied` for non-members
    /// - `NotFound` when either party is not active in the event
    pub async fn create(
        &self,
        event_id: EventId,
        requester: UserId,
        input: CreateSettlementInput,
    ) -> AppResult<SettlementView> {
        let record = SettlementRecord::new(input.payer_id, input.receiver_id, input.amount)?;

        let txn = self.db.begin().await.map_err(db_error)?;

        lock_for_member(&txn, event_id, requester).await?;
        let payer = find_active_participant(&txn, event_id, record.payer_id).await?;
        let receiver = find_active_participant(&txn, event_id, record.receiver_id).await?;

        let model = settlements::ActiveModel {
            id: Set(SettlementId::new().into_inner()),
            event_id: Set(event_id.into_inner()),
            payer_id: Set(payer.id),
            receiver_id: Set(receiver.id),
            amount: Set(record.amount),
            payment_request_id: Set(None),
            created_at: Set(now()),
        }
        .insert(&txn)
        .await
        .map_err(db_error)?;

        txn.commit().await.map_err(db_error)?;

        tracing::info!(
            event_id = %event_id,
            settlement_id = %model.id,
            payer_id = %payer.id,
            receiver_id = %receiver.id,
            amount = %record.amount,
            "Settlement recorded"
        );

        let names = HashMap::from([(payer.id, payer.name), (receiver.id, receiver.name)]);
        Ok(SettlementView::new(&model, &names))
    }

    /// All settlements of the event, newest first.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` for non-members.
    pub async fn list(&self, event_id: EventId, requester: UserId) -> AppResult<Vec<SettlementView>> {
        load_for_member(&self.db, event_id, requester).await?;

        let names: HashMap<uuid::Uuid, String> = all_participants(&self.db, event_id)
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();

        Ok(settlements::Entity::find()
            .filter(settlements::Column::EventId.eq(event_id.into_inner()))
            .order_by_desc(settlements::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_error)?
            .iter()
            .map(|s| SettlementView::new(s, &names))
            .collect())
    }
}
