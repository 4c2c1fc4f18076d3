//! Expense repository.
//!
//! An expense and its payer/beneficiary rows are always written together in
//! one transaction; edits replace the whole breakdown.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tally_core::balance::{BalanceCalculator, ExpenseRecord};
use tally_core::event::EventService;
use tally_core::expense::{BeneficiaryWeight, ExpenseDraft, ExpenseSplitter, SplitPlan};
use tally_shared::types::{EventId, ExpenseId, ParticipantId, UserId};
use tally_shared::{AppError, AppResult};
use uuid::Uuid;

use crate::entities::{expense_beneficiaries, expense_payers, expenses, participants};
use crate::repositories::ledger::{amount, load_breakdowns};
use crate::repositories::scope::{
    all_participants, db_error, event_status, load_for_member, lock_event, lock_for_member, now,
    require_member,
};

/// Input for creating or replacing an expense.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseInput {
    /// What the money was spent on.
    pub description: String,
    /// Total amount.
    pub amount: Decimal,
    /// Participants who paid, sharing the amount equally.
    pub payers: Vec<ParticipantId>,
    /// Participants who benefit, with relative weights.
    pub beneficiaries: Vec<BeneficiaryWeight>,
    /// When the expense happened; defaults to now.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl ExpenseInput {
    fn draft(&self) -> ExpenseDraft {
        ExpenseDraft {
            description: self.description.clone(),
            total: self.amount,
            payer_ids: self.payers.clone(),
            beneficiaries: self.beneficiaries.clone(),
        }
    }
}

/// A payer line with its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayerView {
    /// Participant id.
    pub participant_id: ParticipantId,
    /// Participant name.
    pub name: String,
    /// Amount paid.
    pub amount: Decimal,
}

/// A beneficiary line with its name and resulting share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeneficiaryView {
    /// Participant id.
    pub participant_id: ParticipantId,
    /// Participant name.
    pub name: String,
    /// Normalized ratio.
    pub ratio: Decimal,
    /// `amount * ratio`, allocated so shares sum to the amount.
    pub share: Decimal,
}

/// An expense with its full breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDetail {
    /// Expense id.
    pub id: ExpenseId,
    /// Owning event.
    pub event_id: EventId,
    /// Description.
    pub description: String,
    /// Total amount.
    pub amount: Decimal,
    /// When the expense happened.
    pub date: DateTime<Utc>,
    /// Who paid.
    pub payers: Vec<PayerView>,
    /// Who benefits.
    pub beneficiaries: Vec<BeneficiaryView>,
}

/// One row of the transaction list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionItem {
    /// Expense id.
    pub id: ExpenseId,
    /// Description.
    pub description: String,
    /// Total amount.
    pub amount: Decimal,
    /// When the expense happened.
    pub date: DateTime<Utc>,
    /// Names of the payers.
    pub payer_names: Vec<String>,
}

fn names(participants: &[participants::Model]) -> HashMap<ParticipantId, String> {
    participants
        .iter()
        .map(|p| (ParticipantId::from_uuid(p.id), p.name.clone()))
        .collect()
}

fn name_in(names: &HashMap<ParticipantId, String>, id: ParticipantId) -> String {
    names.get(&id).cloned().unwrap_or_default()
}

async fn find_expense<C: ConnectionTrait>(
    conn: &C,
    event_id: EventId,
    expense_id: ExpenseId,
) -> AppResult<expenses::Model> {
    expenses::Entity::find_by_id(expense_id.into_inner())
        .filter(expenses::Column::EventId.eq(event_id.into_inner()))
        .one(conn)
        .await
        .map_err(db_error)?
        .ok_or_else(|| AppError::NotFound(format!("expense {expense_id}")))
}

async fn load_detail<C: ConnectionTrait>(
    conn: &C,
    event_id: EventId,
    expense: &expenses::Model,
) -> AppResult<ExpenseDetail> {
    let names = names(&all_participants(conn, event_id).await?);
    let (mut payers, mut beneficiaries) = load_breakdowns(conn, &[expense.id]).await?;

    let record = ExpenseRecord {
        total: amount(expense.total),
        payers: payers.remove(&expense.id).unwrap_or_default(),
        beneficiaries: beneficiaries.remove(&expense.id).unwrap_or_default(),
    };
    let shares = BalanceCalculator::beneficiary_shares(&record);

    Ok(ExpenseDetail {
        id: ExpenseId::from_uuid(expense.id),
        event_id,
        description: expense.description.clone(),
        amount: record.total,
        date: expense.expense_date.with_timezone(&Utc),
        payers: record
            .payers
            .iter()
            .map(|p| PayerView {
                participant_id: p.participant_id,
                name: name_in(&names, p.participant_id),
                amount: p.amount,
            })
            .collect(),
        beneficiaries: record
            .beneficiaries
            .iter()
            .zip(shares)
            .map(|(b, (_, share))| BeneficiaryView {
                participant_id: b.participant_id,
                name: name_in(&names, b.participant_id),
                ratio: b.ratio,
                share,
            })
            .collect(),
    })
}

/// Validates `input` against the event's active participants.
async fn plan_for(
    txn: &DatabaseTransaction,
    event_id: EventId,
    requester: UserId,
    input: &ExpenseInput,
) -> AppResult<SplitPlan> {
    let event = lock_event(txn, event_id).await?;
    require_member(txn, event_id, requester).await?;
    EventService::ensure_open(event_status(&event)?)?;

    let active: Vec<ParticipantId> = all_participants(txn, event_id)
        .await?
        .iter()
        .filter(|p| p.is_active())
        .map(|p| ParticipantId::from_uuid(p.id))
        .collect();

    Ok(ExpenseSplitter::split(&input.draft(), |id| active.contains(&id))?)
}

async fn insert_breakdown(
    txn: &DatabaseTransaction,
    expense_id: Uuid,
    plan: &SplitPlan,
) -> AppResult<()> {
    let payers = plan.payers.iter().map(|p| expense_payers::ActiveModel {
        id: Set(Uuid::now_v7()),
        expense_id: Set(expense_id),
        participant_id: Set(p.participant_id.into_inner()),
        amount: Set(p.amount),
    });
    expense_payers::Entity::insert_many(payers)
        .exec_without_returning(txn)
        .await
        .map_err(db_error)?;

    let beneficiaries = plan
        .beneficiaries
        .iter()
        .map(|b| expense_beneficiaries::ActiveModel {
            id: Set(Uuid::now_v7()),
            expense_id: Set(expense_id),
            participant_id: Set(b.participant_id.into_inner()),
            ratio: Set(b.ratio),
        });
    expense_beneficiaries::Entity::insert_many(beneficiaries)
        .exec_without_returning(txn)
        .await
        .map_err(db_error)?;

    Ok(())
}

async fn delete_breakdown(txn: &DatabaseTransaction, expense_id: Uuid) -> AppResult<()> {
    expense_payers::Entity::delete_many()
        .filter(expense_payers::Column::ExpenseId.eq(expense_id))
        .exec(txn)
        .await
        .map_err(db_error)?;
    expense_beneficiaries::Entity::delete_many()
        .filter(expense_beneficiaries::Column::ExpenseId.eq(expense_id))
        .exec(txn)
        .await
        .map_err(db_error)?;
    Ok(())
}

/// Expense repository.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records an expense with its breakdown.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a malformed expense or a closed event
    /// - `PermissionDenied` for non-members
    /// - `NotFound` when a referenced participant is not active in the event
    pub async fn create(
        &self,
        event_id: EventId,
        requester: UserId,
        input: ExpenseInput,
    ) -> AppResult<ExpenseDetail> {
        let txn = self.db.begin().await.map_err(db_error)?;
        let plan = plan_for(&txn, event_id, requester, &input).await?;

        let ts = now();
        let expense = expenses::ActiveModel {
            id: Set(ExpenseId::new().into_inner()),
            event_id: Set(event_id.into_inner()),
            description: Set(plan.description.clone()),
            total: Set(plan.total),
            expense_date: Set(input.date.map_or(ts, Into::into)),
            created_at: Set(ts),
            updated_at: Set(ts),
        }
        .insert(&txn)
        .await
        .map_err(db_error)?;
        insert_breakdown(&txn, expense.id, &plan).await?;

        let detail = load_detail(&txn, event_id, &expense).await?;
        txn.commit().await.map_err(db_error)?;

        tracing::info!(
            event_id = %event_id,
            expense_id = %expense.id,
            amount = %plan.total,
            payers = plan.payers.len(),
            beneficiaries = plan.beneficiaries.len(),
            "Expense created"
        );
        Ok(detail)
    }

    /// Replaces an expense and its whole breakdown.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create`], plus `NotFound` for an unknown expense.
    pub async fn update(
        &self,
        event_id: EventId,
        expense_id: ExpenseId,
        requester: UserId,
        input: ExpenseInput,
    ) -> AppResult<ExpenseDetail> {
        let txn = self.db.begin().await.map_err(db_error)?;
        let plan = plan_for(&txn, event_id, requester, &input).await?;
        let existing = find_expense(&txn, event_id, expense_id).await?;

        let mut active: expenses::ActiveModel = existing.into();
        active.description = Set(plan.description.clone());
        active.total = Set(plan.total);
        if let Some(date) = input.date {
            active.expense_date = Set(date.into());
        }
        active.updated_at = Set(now());
        let expense = active.update(&txn).await.map_err(db_error)?;

        delete_breakdown(&txn, expense.id).await?;
        insert_breakdown(&txn, expense.id, &plan).await?;

        let detail = load_detail(&txn, event_id, &expense).await?;
        txn.commit().await.map_err(db_error)?;

        tracing::info!(event_id = %event_id, expense_id = %expense_id, amount = %plan.total, "Expense updated");
        Ok(detail)
    }

    /// Deletes an expense and its breakdown.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` for non-members, `NotFound` for an unknown expense,
    /// `InvalidInput` for a closed event.
    pub async fn delete(
        &self,
        event_id: EventId,
        expense_id: ExpenseId,
        requester: UserId,
    ) -> AppResult<()> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let (event, _) = lock_for_member(&txn, event_id, requester).await?;
        EventService::ensure_open(event_status(&event)?)?;
        let expense = find_expense(&txn, event_id, expense_id).await?;

        delete_breakdown(&txn, expense.id).await?;
        expenses::Entity::delete_by_id(expense.id)
            .exec(&txn)
            .await
            .map_err(db_error)?;

        txn.commit().await.map_err(db_error)?;

        tracing::info!(event_id = %event_id, expense_id = %expense_id, "Expense deleted");
        Ok(())
    }

    /// One expense with payers, beneficiaries and shares.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` for non-members, `NotFound` for an unknown expense.
    pub async fn get(
        &self,
        event_id: EventId,
        expense_id: ExpenseId,
        requester: UserId,
    ) -> AppResult<ExpenseDetail> {
        load_for_member(&self.db, event_id, requester).await?;
        let expense = find_expense(&self.db, event_id, expense_id).await?;
        load_detail(&self.db, event_id, &expense).await
    }

    /// Expenses of the event, newest first.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` for non-members.
    pub async fn list(&self, event_id: EventId, requester: UserId) -> AppResult<Vec<TransactionItem>> {
        load_for_member(&self.db, event_id, requester).await?;

        let rows = expenses::Entity::find()
            .filter(expenses::Column::EventId.eq(event_id.into_inner()))
            .order_by_desc(expenses::Column::ExpenseDate)
            .order_by_desc(expenses::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_error)?;
        let ids: Vec<Uuid> = rows.iter().map(|e| e.id).collect();

        let names = names(&all_participants(&self.db, event_id).await?);
        let (payers, _) = load_breakdowns(&self.db, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|e| TransactionItem {
                id: ExpenseId::from_uuid(e.id),
                payer_names: payers
                    .get(&e.id)
                    .map(|lines| {
                        lines
                            .iter()
                            .map(|l| name_in(&names, l.participant_id))
                            .collect()
                    })
                    .unwrap_or_default(),
                description: e.description,
                amount: amount(e.total),
                date: e.expense_date.with_timezone(&Utc),
            })
            .collect())
    }
}
