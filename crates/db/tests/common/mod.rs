//! Shared fixtures for ledger integration tests.

#![allow(dead_code)]

use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use tally_core::BankInfo;
use tally_core::expense::BeneficiaryWeight;
use tally_db::migration::{Migrator, MigratorTrait};
use tally_db::repositories::{CreateEventInput, ExpenseInput, JoinEventInput};
use tally_db::{EventRepository, ParticipantRepository, UserRepository};
use tally_shared::types::{EventId, ParticipantId, UserId};

/// Fresh in-memory database with the schema applied.
pub async fn setup_db() -> DatabaseConnection {
    let db = tally_db::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

/// Registers a user without bank details.
pub async fn user(db: &DatabaseConnection, name: &str) -> UserId {
    let email = format!("{}@example.com", name.to_lowercase());
    let user = UserRepository::new(db.clone())
        .create(name, &email, BankInfo::default())
        .await
        .unwrap();
    UserId::from_uuid(user.id)
}

/// Registers a user with complete bank details.
pub async fn user_with_bank(db: &DatabaseConnection, name: &str, bank: &str, account: &str) -> UserId {
    let email = format!("{}@example.com", name.to_lowercase());
    let info = BankInfo::new(
        Some(bank.to_string()),
        Some(account.to_string()),
        Some(name.to_uppercase()),
    );
    let user = UserRepository::new(db.clone())
        .create(name, &email, info)
        .await
        .unwrap();
    UserId::from_uuid(user.id)
}

/// An event created by `alice` and joined by `bob` and `carol`.
pub struct Trip {
    pub db: DatabaseConnection,
    pub event_id: EventId,
    pub alice: UserId,
    pub bob: UserId,
    pub carol: UserId,
    pub a: ParticipantId,
    pub b: ParticipantId,
    pub c: ParticipantId,
}

impl Trip {
    pub async fn new() -> Self {
        let db = setup_db().await;
        let alice = user_with_bank(&db, "Alice", "VCB", "0011001").await;
        let bob = user(&db, "Bob").await;
        let carol = user(&db, "Carol").await;

        let event = EventRepository::new(db.clone())
            .create(
                alice,
                CreateEventInput {
                    name: "Da Lat trip".to_string(),
                    description: None,
                    currency: "VND".to_string(),
                },
            )
            .await
            .unwrap();

        let participants = ParticipantRepository::new(db.clone());
        let b = participants
            .join(event.id, bob, JoinEventInput::default())
            .await
            .unwrap()
            .id;
        let c = participants
            .join(event.id, carol, JoinEventInput::default())
            .await
            .unwrap()
            .id;
        let a = participants
            .list(event.id, alice)
            .await
            .unwrap()
            .into_iter()
            .find(|p| p.user_id == Some(alice))
            .unwrap()
            .id;

        Self {
            db,
            event_id: event.id,
            alice,
            bob,
            carol,
            a,
            b,
            c,
        }
    }
}

/// Equal-weight expense input.
pub fn expense(
    description: &str,
    amount: Decimal,
    payers: &[ParticipantId],
    beneficiaries: &[ParticipantId],
) -> ExpenseInput {
    ExpenseInput {
        description: description.to_string(),
        amount,
        payers: payers.to_vec(),
        beneficiaries: beneficiaries
            .iter()
            .map(|id| BeneficiaryWeight {
                participant_id: *id,
                weight: Decimal::ONE,
            })
            .collect(),
        date: None,
    }
}
