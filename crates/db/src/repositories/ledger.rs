//! Ledger loading and read-side computations.
//!
//! Balances and settlement plans are never stored. Every read loads the
//! event's ledger rows and runs them through the core calculators.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait,
};
use serde::Serialize;
use tally_core::balance::{
    BalanceCalculator, BeneficiaryLine, ExpenseRecord, ParticipantBalance, PayerLine,
    SettlementRecord,
};
use tally_core::event::EventStatus;
use tally_core::settlement::{EventSummary, SummaryBuilder, SummaryParticipant};
use tally_shared::AppResult;
use tally_shared::types::{AMOUNT_SCALE, EventId, ParticipantId, RATIO_SCALE, UserId};
use uuid::Uuid;

use crate::entities::{
    events, expense_beneficiaries, expense_payers, expenses, participants, settlements,
};
use crate::repositories::collector::{CollectorView, active_collector};
use crate::repositories::scope::{
    all_participants, db_error, event_status, require_member, share_event,
};

/// Storage may widen decimals (SQLite keeps them as REAL); snap back to the ledger scale.
pub(crate) fn amount(value: Decimal) -> Decimal {
    value.round_dp(AMOUNT_SCALE)
}

pub(crate) fn ratio(value: Decimal) -> Decimal {
    value.round_dp(RATIO_SCALE)
}

/// Every ledger row of one event.
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    /// All participant rows, including those who left.
    pub participants: Vec<participants::Model>,
    /// Expense rows, keyed like `records`.
    pub expenses: Vec<expenses::Model>,
    /// Breakdown of each expense, parallel to `expenses`.
    pub records: Vec<ExpenseRecord>,
    /// Direct transfers.
    pub settlements: Vec<SettlementRecord>,
}

impl LedgerSnapshot {
    /// Loads the ledger of `event_id` through `conn`.
    pub(crate) async fn load<C: ConnectionTrait>(conn: &C, event_id: EventId) -> AppResult<Self> {
        let participants = all_participants(conn, event_id).await?;

        let expenses = expenses::Entity::find()
            .filter(expenses::Column::EventId.eq(event_id.into_inner()))
            .all(conn)
            .await
            .map_err(db_error)?;
        let expense_ids: Vec<Uuid> = expenses.iter().map(|e| e.id).collect();

        let (payers, beneficiaries) = load_breakdowns(conn, &expense_ids).await?;
        let records = expenses
            .iter()
            .map(|e| ExpenseRecord {
                total: amount(e.total),
                payers: payers.get(&e.id).cloned().unwrap_or_default(),
                beneficiaries: beneficiaries.get(&e.id).cloned().unwrap_or_default(),
            })
            .collect();

        let settlements = settlements::Entity::find()
            .filter(settlements::Column::EventId.eq(event_id.into_inner()))
            .all(conn)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(|s| SettlementRecord {
                payer_id: ParticipantId::from_uuid(s.payer_id),
                receiver_id: ParticipantId::from_uuid(s.receiver_id),
                amount: amount(s.amount),
            })
            .collect();

        Ok(Self {
            participants,
            expenses,
            records,
            settlements,
        })
    }

    /// Balances of all participants, active ones first in join order.
    #[must_use]
    pub fn balances(&self) -> Vec<ParticipantBalance> {
        let ids: Vec<ParticipantId> = self
            .participants
            .iter()
            .filter(|p| p.is_active())
            .map(|p| ParticipantId::from_uuid(p.id))
            .collect();
        BalanceCalculator::compute(&ids, &self.records, &self.settlements)
    }

    /// Net balance of one participant.
    #[must_use]
    pub fn balance_of(&self, participant_id: ParticipantId) -> Decimal {
        BalanceCalculator::balance_of(participant_id, &self.records, &self.settlements)
    }

    /// Sum of expense totals.
    #[must_use]
    pub fn total_expenses(&self) -> Decimal {
        self.records.iter().map(|r| r.total).sum()
    }

    /// Summary of balances and the settlement plan.
    #[must_use]
    pub fn summary(&self) -> EventSummary {
        let people: Vec<SummaryParticipant> = self
            .participants
            .iter()
            .map(|p| SummaryParticipant {
                id: ParticipantId::from_uuid(p.id),
                name: p.name.clone(),
                active: p.is_active(),
            })
            .collect();
        SummaryBuilder::build(&people, &self.balances(), self.total_expenses())
    }
}

type PayerMap = HashMap<Uuid, Vec<PayerLine>>;
type BeneficiaryMap = HashMap<Uuid, Vec<BeneficiaryLine>>;

/// Payer and beneficiary lines grouped by expense id.
pub(crate) async fn load_breakdowns<C: ConnectionTrait>(
    conn: &C,
    expense_ids: &[Uuid],
) -> AppResult<(PayerMap, BeneficiaryMap)> {
    let mut payers: PayerMap = HashMap::new();
    let mut beneficiaries: BeneficiaryMap = HashMap::new();
    if expense_ids.is_empty() {
        return Ok((payers, beneficiaries));
    }

    let payer_rows = expense_payers::Entity::find()
        .filter(expense_payers::Column::ExpenseId.is_in(expense_ids.to_vec()))
        .all(conn)
        .await
        .map_err(db_error)?;
    for row in payer_rows {
        payers.entry(row.expense_id).or_default().push(PayerLine {
            participant_id: ParticipantId::from_uuid(row.participant_id),
            amount: amount(row.amount),
        });
    }

    let beneficiary_rows = expense_beneficiaries::Entity::find()
        .filter(expense_beneficiaries::Column::ExpenseId.is_in(expense_ids.to_vec()))
        .all(conn)
        .await
        .map_err(db_error)?;
    for row in beneficiary_rows {
        beneficiaries
            .entry(row.expense_id)
            .or_default()
            .push(BeneficiaryLine {
                participant_id: ParticipantId::from_uuid(row.participant_id),
                ratio: ratio(row.ratio),
            });
    }

    // Row order from storage is unspecified; the share allocation hands
    // leftover units by position, so fix the order.
    for lines in payers.values_mut() {
        lines.sort_by_key(|l| l.participant_id);
    }
    for lines in beneficiaries.values_mut() {
        lines.sort_by_key(|l| l.participant_id);
    }

    Ok((payers, beneficiaries))
}

/// Event summary with metadata, as served to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventOverview {
    /// Event id.
    pub event_id: EventId,
    /// Event name.
    pub name: String,
    /// Currency code.
    pub currency: String,
    /// Event status.
    pub status: EventStatus,
    /// Balances, totals and transfers.
    #[serde(flatten)]
    pub summary: EventSummary,
    /// Active collector, if any.
    pub collector: Option<CollectorView>,
    /// When the numbers were computed.
    pub generated_at: DateTime<Utc>,
}

/// Read-side ledger queries.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Current balance of every participant of the event.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown event, `PermissionDenied` for non-members.
    pub async fn balances(
        &self,
        event_id: EventId,
        requester: UserId,
    ) -> AppResult<Vec<ParticipantBalance>> {
        let txn = self.db.begin().await.map_err(db_error)?;
        share_event(&txn, event_id).await?;
        require_member(&txn, event_id, requester).await?;
        let snapshot = LedgerSnapshot::load(&txn, event_id).await?;
        txn.commit().await.map_err(db_error)?;

        Ok(snapshot.balances())
    }

    /// Balances, settlement plan and collector of the event.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown event, `PermissionDenied` for non-members.
    pub async fn summary(&self, event_id: EventId, requester: UserId) -> AppResult<EventOverview> {
        // One transaction under a shared event lock, so no write lands
        // between the expense, breakdown and settlement queries.
        let txn = self.db.begin().await.map_err(db_error)?;
        let event = share_event(&txn, event_id).await?;
        require_member(&txn, event_id, requester).await?;
        let snapshot = LedgerSnapshot::load(&txn, event_id).await?;
        let collector = active_collector(&txn, event_id, &snapshot.participants).await?;
        txn.commit().await.map_err(db_error)?;

        overview(&event, snapshot.summary(), collector)
    }
}

fn overview(
    event: &events::Model,
    summary: EventSummary,
    collector: Option<CollectorView>,
) -> AppResult<EventOverview> {
    Ok(EventOverview {
        event_id: EventId::from_uuid(event.id),
        name: event.name.clone(),
        currency: event.currency.clone(),
        status: event_status(event)?,
        summary,
        collector,
        generated_at: Utc::now(),
    })
}
