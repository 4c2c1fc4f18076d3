//! Expense recording, balances and settlement plans against a real schema.

mod common;

use common::{Trip, expense};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_core::balance::BalanceType;
use tally_core::expense::BeneficiaryWeight;
use tally_db::repositories::{CreateSettlementInput, ExpenseInput};
use tally_db::{ExpenseRepository, LedgerRepository, SettlementRepository};
use tally_shared::types::ParticipantId;

fn balance_of(balances: &[tally_core::balance::ParticipantBalance], id: ParticipantId) -> Decimal {
    balances
        .iter()
        .find(|b| b.participant_id == id)
        .map(|b| b.balance)
        .unwrap()
}

#[tokio::test]
async fn test_one_payer_three_beneficiaries() {
    let trip = Trip::new().await;
    let expenses = ExpenseRepository::new(trip.db.clone());

    let detail = expenses
        .create(
            trip.event_id,
            trip.alice,
            expense("Hotel", dec!(300), &[trip.a], &[trip.a, trip.b, trip.c]),
        )
        .await
        .unwrap();
    assert_eq!(detail.amount, dec!(300));
    assert_eq!(detail.payers.len(), 1);
    assert_eq!(detail.payers[0].name, "Alice");
    assert_eq!(
        detail.beneficiaries.iter().map(|b| b.ratio).sum::<Decimal>(),
        Decimal::ONE
    );
    assert!(detail.beneficiaries.iter().all(|b| b.share == dec!(100)));

    let overview = LedgerRepository::new(trip.db.clone())
        .summary(trip.event_id, trip.bob)
        .await
        .unwrap();
    assert_eq!(overview.summary.total_expenses, dec!(300));
    assert_eq!(overview.summary.total_participants, 3);
    assert_eq!(overview.summary.average_per_person, dec!(100));

    let alice = overview
        .summary
        .participants
        .iter()
        .find(|p| p.participant_id == trip.a)
        .unwrap();
    assert_eq!(alice.balance, dec!(200));
    assert_eq!(alice.balance_type, BalanceType::Credit);
    assert_eq!(alice.description, "Receives 200.00");

    let transfers: Vec<_> = overview
        .summary
        .transfers
        .iter()
        .map(|t| (t.from_id, t.to_id, t.amount))
        .collect();
    assert_eq!(transfers.len(), 2);
    assert!(transfers.contains(&(trip.b, trip.a, dec!(100))));
    assert!(transfers.contains(&(trip.c, trip.a, dec!(100))));
}

#[tokio::test]
async fn test_balances_sum_to_zero_with_uneven_split() {
    let trip = Trip::new().await;
    let expenses = ExpenseRepository::new(trip.db.clone());

    expenses
        .create(
            trip.event_id,
            trip.bob,
            expense("Dinner", dec!(100), &[trip.a, trip.b], &[trip.a, trip.b, trip.c]),
        )
        .await
        .unwrap();
    expenses
        .create(
            trip.event_id,
            trip.carol,
            ExpenseInput {
                description: "Taxi".to_string(),
                amount: dec!(45.55),
                payers: vec![trip.c],
                beneficiaries: vec![
                    BeneficiaryWeight {
                        participant_id: trip.a,
                        weight: dec!(2),
                    },
                    BeneficiaryWeight {
                        participant_id: trip.b,
                        weight: dec!(1),
                    },
                ],
                date: None,
            },
        )
        .await
        .unwrap();

    let balances = LedgerRepository::new(trip.db.clone())
        .balances(trip.event_id, trip.alice)
        .await
        .unwrap();
    let sum: Decimal = balances.iter().map(|b| b.balance).sum();
    assert_eq!(sum, Decimal::ZERO);
}

#[tokio::test]
async fn test_settlement_moves_balances() {
    let trip = Trip::new().await;
    ExpenseRepository::new(trip.db.clone())
        .create(
            trip.event_id,
            trip.alice,
            expense("Hotel", dec!(300), &[trip.a], &[trip.a, trip.b, trip.c]),
        )
        .await
        .unwrap();

    let settlement = SettlementRepository::new(trip.db.clone())
        .create(
            trip.event_id,
            trip.bob,
            CreateSettlementInput {
                payer_id: trip.b,
                receiver_id: trip.a,
                amount: dec!(100),
            },
        )
        .await
        .unwrap();
    assert_eq!(settlement.payer_name, "Bob");
    assert_eq!(settlement.receiver_name, "Alice");

    let ledger = LedgerRepository::new(trip.db.clone());
    let balances = ledger.balances(trip.event_id, trip.alice).await.unwrap();
    assert_eq!(balance_of(&balances, trip.a), dec!(100));
    assert_eq!(balance_of(&balances, trip.b), dec!(0));
    assert_eq!(balance_of(&balances, trip.c), dec!(-100));

    let overview = ledger.summary(trip.event_id, trip.alice).await.unwrap();
    assert_eq!(overview.summary.transfers.len(), 1);
    assert_eq!(overview.summary.transfers[0].from_id, trip.c);

    let listed = SettlementRepository::new(trip.db.clone())
        .list(trip.event_id, trip.carol)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_update_replaces_breakdown() {
    let trip = Trip::new().await;
    let expenses = ExpenseRepository::new(trip.db.clone());

    let created = expenses
        .create(
            trip.event_id,
            trip.alice,
            expense("Hotel", dec!(300), &[trip.a], &[trip.a, trip.b, trip.c]),
        )
        .await
        .unwrap();

    let updated = expenses
        .update(
            trip.event_id,
            created.id,
            trip.bob,
            expense("Hotel, two nights", dec!(600), &[trip.b], &[trip.a, trip.b]),
        )
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.description, "Hotel, two nights");
    assert_eq!(updated.payers.len(), 1);
    assert_eq!(updated.payers[0].participant_id, trip.b);
    assert_eq!(updated.beneficiaries.len(), 2);

    let balances = LedgerRepository::new(trip.db.clone())
        .balances(trip.event_id, trip.alice)
        .await
        .unwrap();
    assert_eq!(balance_of(&balances, trip.a), dec!(-300));
    assert_eq!(balance_of(&balances, trip.b), dec!(300));
    assert_eq!(balance_of(&balances, trip.c), dec!(0));
}

#[tokio::test]
async fn test_delete_expense_clears_balances() {
    let trip = Trip::new().await;
    let expenses = ExpenseRepository::new(trip.db.clone());

    let created = expenses
        .create(
            trip.event_id,
            trip.alice,
            expense("Hotel", dec!(300), &[trip.a], &[trip.a, trip.b, trip.c]),
        )
        .await
        .unwrap();
    expenses
        .delete(trip.event_id, created.id, trip.carol)
        .await
        .unwrap();

    let err = expenses
        .get(trip.event_id, created.id, trip.alice)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");

    let balances = LedgerRepository::new(trip.db.clone())
        .balances(trip.event_id, trip.alice)
        .await
        .unwrap();
    assert!(balances.iter().all(|b| b.balance == Decimal::ZERO));
}

#[tokio::test]
async fn test_invalid_expenses_write_nothing() {
    let trip = Trip::new().await;
    let expenses = ExpenseRepository::new(trip.db.clone());

    let err = expenses
        .create(
            trip.event_id,
            trip.alice,
            expense("Hotel", dec!(0), &[trip.a], &[trip.a]),
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_INPUT");

    let stranger = ParticipantId::new();
    let err = expenses
        .create(
            trip.event_id,
            trip.alice,
            expense("Hotel", dec!(10), &[trip.a], &[trip.a, stranger]),
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");

    let outsider = common::user(&trip.db, "Mallory").await;
    let err = expenses
        .create(
            trip.event_id,
            outsider,
            expense("Hotel", dec!(10), &[trip.a], &[trip.a]),
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "PERMISSION_DENIED");

    assert!(expenses.list(trip.event_id, trip.alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_transaction_list_shows_payer_names() {
    let trip = Trip::new().await;
    let expenses = ExpenseRepository::new(trip.db.clone());

    let mut input = expense("Breakfast", dec!(90), &[trip.b, trip.c], &[trip.a, trip.b, trip.c]);
    input.date = Some(chrono::Utc::now() - chrono::Duration::days(1));
    expenses.create(trip.event_id, trip.bob, input).await.unwrap();
    expenses
        .create(
            trip.event_id,
            trip.alice,
            expense("Lunch", dec!(60), &[trip.a], &[trip.a, trip.b]),
        )
        .await
        .unwrap();

    let items = expenses.list(trip.event_id, trip.carol).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].description, "Lunch");
    assert_eq!(items[0].payer_names, vec!["Alice".to_string()]);
    assert_eq!(items[1].payer_names.len(), 2);
    assert!(items[1].payer_names.contains(&"Bob".to_string()));
}
