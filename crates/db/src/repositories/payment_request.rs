//! Payment request repository.
//!
//! Confirmation and cancellation are conditional writes keyed on the
//! `pending` status: whichever transaction flips the row first wins, the
//! other sees zero affected rows and gets `StateConflict`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use tally_core::payment::{PaymentRequestParties, PaymentRequestService, PaymentRequestStatus};
use tally_shared::types::{EventId, ParticipantId, PaymentRequestId, SettlementId, UserId};
use tally_shared::{AppError, AppResult};

use crate::entities::{participants, payment_requests, settlements};
use crate::repositories::ledger::amount;
use crate::repositories::scope::{
    all_participants, db_error, find_active_participant, load_for_member, lock_for_member,
    now,
};

/// Input for opening a payment request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequestInput {
    /// Participant paying; must be the requester.
    pub payer_id: ParticipantId,
    /// Participant receiving.
    pub receiver_id: ParticipantId,
    /// Amount.
    pub amount: Decimal,
}

/// One side of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentParty {
    /// Participant id.
    pub id: ParticipantId,
    /// Participant name.
    pub name: String,
}

/// A payment request with party names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequestView {
    /// Request id.
    pub id: PaymentRequestId,
    /// Owning event.
    pub event_id: EventId,
    /// Paying side.
    pub payer: PaymentParty,
    /// Receiving side.
    pub receiver: PaymentParty,
    /// Amount.
    pub amount: Decimal,
    /// Current status.
    pub status: PaymentRequestStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

fn view(
    model: &payment_requests::Model,
    status: PaymentRequestStatus,
    people: &[participants::Model],
) -> PaymentRequestView {
    let party = |id| PaymentParty {
        id: ParticipantId::from_uuid(id),
        name: people
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.clone())
            .unwrap_or_default(),
    };
    PaymentRequestView {
        id: PaymentRequestId::from_uuid(model.id),
        event_id: EventId::from_uuid(model.event_id),
        payer: party(model.payer_id),
        receiver: party(model.receiver_id),
        amount: amount(model.amount),
        status,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn parties(model: &payment_requests::Model) -> PaymentRequestParties {
    PaymentRequestParties {
        payer_id: ParticipantId::from_uuid(model.payer_id),
        receiver_id: ParticipantId::from_uuid(model.receiver_id),
    }
}

/// Flips a pending request to `to`; zero affected rows means someone else got there first.
async fn transition_pending(
    txn: &DatabaseTransaction,
    request_id: PaymentRequestId,
    to: PaymentRequestStatus,
) -> AppResult<()> {
    let result = payment_requests::Entity::update_many()
        .col_expr(payment_requests::Column::Status, Expr::value(to.as_str()))
        .col_expr(payment_requests::Column::UpdatedAt, Expr::value(now()))
        .filter(payment_requests::Column::Id.eq(request_id.into_inner()))
        .filter(payment_requests::Column::Status.eq(PaymentRequestStatus::Pending.as_str()))
        .exec(txn)
        .await
        .map_err(db_error)?;

    if result.rows_affected == 0 {
        tracing::warn!(request_id = %request_id, to = %to, "Payment request no longer pending");
        return Err(AppError::StateConflict(format!(
            "payment request {request_id} is no longer pending"
        )));
    }
    Ok(())
}

/// Payment request repository.
#[derive(Debug, Clone)]
pub struct PaymentRequestRepository {
    db: DatabaseConnection,
}

impl PaymentRequestRepository {
    /// Creates a new payment request repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Opens a request as the payer.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a bad amount or identical parties
    /// - `PermissionDenied` unless the requester is the payer
    /// - `NotFound` when either party is not active in the event
    pub async fn create(
        &self,
        event_id: EventId,
        requester: UserId,
        input: CreatePaymentRequestInput,
    ) -> AppResult<PaymentRequestView> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let (_, member) = lock_for_member(&txn, event_id, requester).await?;
        let payer = find_active_participant(&txn, event_id, input.payer_id).await?;
        let receiver = find_active_participant(&txn, event_id, input.receiver_id).await?;

        let status = PaymentRequestService::validate_create(
            ParticipantId::from_uuid(member.id),
            PaymentRequestParties {
                payer_id: input.payer_id,
                receiver_id: input.receiver_id,
            },
            input.amount,
        )?;

        let ts = now();
        let model = payment_requests::ActiveModel {
            id: Set(PaymentRequestId::new().into_inner()),
            event_id: Set(event_id.into_inner()),
            payer_id: Set(payer.id),
            receiver_id: Set(receiver.id),
            amount: Set(input.amount),
            status: Set(status.as_str().to_string()),
            created_at: Set(ts),
            updated_at: Set(ts),
        }
        .insert(&txn)
        .await
        .map_err(db_error)?;

        txn.commit().await.map_err(db_error)?;

        tracing::info!(
            event_id = %event_id,
            request_id = %model.id,
            amount = %input.amount,
            "Payment request created"
        );
        Ok(view(&model, status, &[payer, receiver]))
    }

    /// Requests where the caller is payer or receiver, newest first.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` for non-members.
    pub async fn list(
        &self,
        event_id: EventId,
        requester: UserId,
    ) -> AppResult<Vec<PaymentRequestView>> {
        let (_, member) = load_for_member(&self.db, event_id, requester).await?;
        let people = all_participants(&self.db, event_id).await?;

        payment_requests::Entity::find()
            .filter(payment_requests::Column::EventId.eq(event_id.into_inner()))
            .filter(
                Condition::any()
                    .add(payment_requests::Column::PayerId.eq(member.id))
                    .add(payment_requests::Column::ReceiverId.eq(member.id)),
            )
            .order_by_desc(payment_requests::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_error)?
            .iter()
            .map(|r| -> AppResult<PaymentRequestView> {
                Ok(view(r, r.status.parse::<PaymentRequestStatus>()?, &people))
            })
            .collect()
    }

    /// Receiver confirms; the settlement is recorded in the same transaction.
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` unless the requester is the receiver
    /// - `StateConflict` when the request is no longer pending
    /// - `NotFound` for an unknown request
    pub async fn confirm(
        &self,
        event_id: EventId,
        request_id: PaymentRequestId,
        requester: UserId,
    ) -> AppResult<PaymentRequestView> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let (request, member) = Self::load_for_receiver(&txn, event_id, request_id, requester).await?;
        let to = PaymentRequestService::confirm(
            request.status.parse()?,
            ParticipantId::from_uuid(member.id),
            parties(&request),
        )?;

        transition_pending(&txn, request_id, to).await?;

        let settlement = settlements::ActiveModel {
            id: Set(SettlementId::new().into_inner()),
            event_id: Set(event_id.into_inner()),
            payer_id: Set(request.payer_id),
            receiver_id: Set(request.receiver_id),
            amount: Set(request.amount),
            payment_request_id: Set(Some(request.id)),
            created_at: Set(now()),
        }
        .insert(&txn)
        .await
        .map_err(db_error)?;

        let people = all_participants(&txn, event_id).await?;
        let updated = Self::reload(&txn, request_id).await?;
        txn.commit().await.map_err(db_error)?;

        tracing::info!(
            event_id = %event_id,
            request_id = %request_id,
            settlement_id = %settlement.id,
            "Payment request confirmed"
        );
        Ok(view(&updated, to, &people))
    }

    /// Receiver declines the request.
    ///
    /// # Errors
    ///
    /// Same as [`Self::confirm`].
    pub async fn cancel(
        &self,
        event_id: EventId,
        request_id: PaymentRequestId,
        requester: UserId,
    ) -> AppResult<PaymentRequestView> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let (request, member) = Self::load_for_receiver(&txn, event_id, request_id, requester).await?;
        let to = PaymentRequestService::cancel(
            request.status.parse()?,
            ParticipantId::from_uuid(member.id),
            parties(&request),
        )?;

        transition_pending(&txn, request_id, to).await?;

        let people = all_participants(&txn, event_id).await?;
        let updated = Self::reload(&txn, request_id).await?;
        txn.commit().await.map_err(db_error)?;

        tracing::info!(event_id = %event_id, request_id = %request_id, "Payment request canceled");
        Ok(view(&updated, to, &people))
    }

    async fn load_for_receiver(
        txn: &DatabaseTransaction,
        event_id: EventId,
        request_id: PaymentRequestId,
        requester: UserId,
    ) -> AppResult<(payment_requests::Model, participants::Model)> {
        let (_, member) = lock_for_member(txn, event_id, requester).await?;
        let request = payment_requests::Entity::find_by_id(request_id.into_inner())
            .filter(payment_requests::Column::EventId.eq(event_id.into_inner()))
            .one(txn)
            .await
            .map_err(db_error)?
            .ok_or_else(|| AppError::NotFound(format!("payment request {request_id}")))?;
        Ok((request, member))
    }

    async fn reload(
        txn: &DatabaseTransaction,
        request_id: PaymentRequestId,
    ) -> AppResult<payment_requests::Model> {
        payment_requests::Entity::find_by_id(request_id.into_inner())
            .one(txn)
            .await
            .map_err(db_error)?
            .ok_or_else(|| AppError::NotFound(format!("payment request {request_id}")))
    }
}
