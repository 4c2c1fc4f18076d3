//! Collector selection and payment links.

mod common;

use common::Trip;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use tally_core::BankInfo;
use tally_core::payment::QuickLinkRenderer;
use tally_db::entities::collectors;
use tally_db::repositories::{PaymentLinkInput, SetCollectorInput};
use tally_db::{CollectorRepository, ParticipantRepository};

async fn active_collectors(trip: &Trip) -> u64 {
    collectors::Entity::find()
        .filter(collectors::Column::EventId.eq(trip.event_id.into_inner()))
        .filter(collectors::Column::IsActive.eq(true))
        .count(&trip.db)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_switching_collector_keeps_one_active() {
    let trip = Trip::new().await;
    let collectors = CollectorRepository::new(trip.db.clone());

    let err = collectors.get(trip.event_id, trip.bob).await.unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");

    let first = collectors
        .set(
            trip.event_id,
            trip.alice,
            SetCollectorInput {
                participant_id: trip.a,
                bank_info: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(first.participant_name, "Alice");
    assert_eq!(first.bank_info.bank_name.as_deref(), Some("VCB"));

    let second = collectors
        .set(
            trip.event_id,
            trip.alice,
            SetCollectorInput {
                participant_id: trip.b,
                bank_info: Some(BankInfo::new(
                    Some("ACB".to_string()),
                    Some("123456".to_string()),
                    None,
                )),
            },
        )
        .await
        .unwrap();
    // holder falls back to the participant name
    assert_eq!(second.bank_info.account_holder.as_deref(), Some("Bob"));

    assert_eq!(active_collectors(&trip).await, 1);
    let current = collectors.get(trip.event_id, trip.carol).await.unwrap();
    assert_eq!(current.participant_id, trip.b);
}

#[tokio::test]
async fn test_collector_rules() {
    let trip = Trip::new().await;
    let collectors = CollectorRepository::new(trip.db.clone());

    let err = collectors
        .set(
            trip.event_id,
            trip.bob,
            SetCollectorInput {
                participant_id: trip.b,
                bank_info: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "PERMISSION_DENIED");

    // Carol has no bank details and none are supplied
    let err = collectors
        .set(
            trip.event_id,
            trip.alice,
            SetCollectorInput {
                participant_id: trip.c,
                bank_info: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_INPUT");
}

#[tokio::test]
async fn test_leaving_collector_is_deactivated() {
    let trip = Trip::new().await;
    CollectorRepository::new(trip.db.clone())
        .set(
            trip.event_id,
            trip.alice,
            SetCollectorInput {
                participant_id: trip.c,
                bank_info: Some(BankInfo::new(
                    Some("MB".to_string()),
                    Some("42".to_string()),
                    Some("CAROL".to_string()),
                )),
            },
        )
        .await
        .unwrap();

    ParticipantRepository::new(trip.db.clone())
        .leave(trip.event_id, trip.carol)
        .await
        .unwrap();
    assert_eq!(active_collectors(&trip).await, 0);
}

#[tokio::test]
async fn test_payment_link_falls_back_to_collector() {
    let trip = Trip::new().await;
    let renderer = QuickLinkRenderer::new("https://img.example.test/image");
    let collectors = CollectorRepository::new(trip.db.clone());

    // Bob has no bank details and there is no collector yet
    let err = collectors
        .payment_link(
            trip.event_id,
            trip.carol,
            PaymentLinkInput {
                receiver_id: Some(trip.b),
                amount: dec!(50000),
            },
            &renderer,
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_INPUT");

    collectors
        .set(
            trip.event_id,
            trip.alice,
            SetCollectorInput {
                participant_id: trip.a,
                bank_info: None,
            },
        )
        .await
        .unwrap();

    let link = collectors
        .payment_link(
            trip.event_id,
            trip.carol,
            PaymentLinkInput {
                receiver_id: Some(trip.b),
                amount: dec!(50000),
            },
            &renderer,
        )
        .await
        .unwrap();
    assert_eq!(link.account.bank_name, "VCB");
    assert_eq!(link.account.account_number, "0011001");
    assert_eq!(link.content, "Payment for event Da Lat trip");
    assert!(link.url.starts_with("https://img.example.test/image/VCB-0011001-compact2.png?amount=50000"));

    let err = collectors
        .payment_link(
            trip.event_id,
            trip.carol,
            PaymentLinkInput {
                receiver_id: None,
                amount: dec!(0),
            },
            &renderer,
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_INPUT");
}
