//! Router tests: the HTTP surface on top of an in-memory ledger.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tally_api::{AppState, create_router};
use tally_core::BankInfo;
use tally_core::payment::QuickLinkRenderer;
use tally_db::UserRepository;
use tally_db::migration::{Migrator, MigratorTrait};
use tally_shared::types::UserId;
use tally_shared::{JwtConfig, JwtService};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    jwt: Arc<JwtService>,
    users: UserRepository,
}

impl TestApp {
    async fn new() -> Self {
        let db = tally_db::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let jwt = Arc::new(JwtService::new(JwtConfig::default()));
        let state = AppState {
            db: Arc::new(db.clone()),
            jwt_service: jwt.clone(),
            link_renderer: Arc::new(QuickLinkRenderer::new("https://img.example.test/image")),
            ledger_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
        };

        Self {
            router: create_router(state),
            jwt,
            users: UserRepository::new(db),
        }
    }

    /// Registers a user and returns a bearer token for them.
    async fn login(&self, name: &str, bank: BankInfo) -> String {
        let user = self
            .users
            .create(name, &format!("{}@example.com", name.to_lowercase()), bank)
            .await
            .unwrap();
        self.jwt
            .generate_access_token(UserId::from_uuid(user.id))
            .unwrap()
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(format!("/api/v1{uri}"));
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        other => other.to_string().parse().unwrap(),
    }
}

fn alice_bank() -> BankInfo {
    BankInfo::new(
        Some("VCB".to_string()),
        Some("0011001".to_string()),
        Some("ALICE".to_string()),
    )
}

/// Alice's event with Bob and Carol joined. Returns tokens, event id and participant ids.
async fn trip(app: &TestApp) -> ([String; 3], String, [String; 3]) {
    let alice = app.login("Alice", alice_bank()).await;
    let bob = app.login("Bob", BankInfo::default()).await;
    let carol = app.login("Carol", BankInfo::default()).await;

    let (status, event) = app
        .send(
            "POST",
            "/events",
            Some(&alice),
            Some(json!({ "name": "Da Lat trip", "currency": "VND" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let event_id = event["id"].as_str().unwrap().to_string();

    let (status, b) = app
        .send("POST", &format!("/events/{event_id}/join"), Some(&bob), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, c) = app
        .send("POST", &format!("/events/{event_id}/join"), Some(&carol), Some(json!({})))
        .await;

    let (_, listed) = app
        .send("GET", &format!("/events/{event_id}/participants"), Some(&alice), None)
        .await;
    let a = listed["participants"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["isCreator"] == json!(true))
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    (
        [alice, bob, carol],
        event_id,
        [
            a,
            b["id"].as_str().unwrap().to_string(),
            c["id"].as_str().unwrap().to_string(),
        ],
    )
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.send("GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "up");
}

#[tokio::test]
async fn test_protected_routes_need_token() {
    let app = TestApp::new().await;

    let (status, body) = app.send("GET", "/events", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let (status, _) = app.send("GET", "/events", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_input_is_invalid_input() {
    let app = TestApp::new().await;
    let token = app.login("Alice", BankInfo::default()).await;

    let (status, body) = app.send("GET", "/events/not-a-uuid", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_INPUT");

    let (status, body) = app
        .send("POST", "/events", Some(&token), Some(json!({ "currency": "VND" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_expense_summary_and_settlement_plan() {
    let app = TestApp::new().await;
    let ([alice, bob, _], event_id, [a, b, c]) = trip(&app).await;

    let (status, expense) = app
        .send(
            "POST",
            &format!("/events/{event_id}/expenses"),
            Some(&alice),
            Some(json!({
                "description": "Hotel",
                "amount": "300",
                "payers": [a],
                "beneficiaries": [
                    { "participantId": a, "weight": 1 },
                    { "participantId": b, "weight": 1 },
                    { "participantId": c, "weight": 1 },
                ],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(decimal(&expense["amount"]), dec!(300));
    assert_eq!(expense["beneficiaries"].as_array().unwrap().len(), 3);

    let (status, summary) = app
        .send("GET", &format!("/events/{event_id}/summary"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&summary["totalExpenses"]), dec!(300));
    assert_eq!(summary["totalParticipants"], 3);
    assert_eq!(summary["status"], "active");
    assert!(summary["collector"].is_null());

    let alice_row = summary["participants"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["participantId"] == json!(a))
        .unwrap();
    assert_eq!(decimal(&alice_row["balance"]), dec!(200));
    assert_eq!(alice_row["balanceType"], "credit");
    assert_eq!(alice_row["action"], "receive");

    let transfers = summary["transfers"].as_array().unwrap();
    assert_eq!(transfers.len(), 2);
    assert!(transfers.iter().all(|t| t["toId"] == json!(a)));
    assert!(transfers.iter().all(|t| decimal(&t["amount"]) == dec!(100)));

    let (_, listed) = app
        .send("GET", &format!("/events/{event_id}/expenses"), Some(&bob), None)
        .await;
    assert_eq!(listed["transactions"][0]["payerNames"], json!(["Alice"]));
}

#[tokio::test]
async fn test_leave_blocked_until_settled() {
    let app = TestApp::new().await;
    let ([alice, bob, _], event_id, [a, b, c]) = trip(&app).await;

    app.send(
        "POST",
        &format!("/events/{event_id}/expenses"),
        Some(&alice),
        Some(json!({
            "description": "Hotel",
            "amount": 300,
            "payers": [a],
            "beneficiaries": [
                { "participantId": a, "weight": 1 },
                { "participantId": b, "weight": 1 },
                { "participantId": c, "weight": 1 },
            ],
        })),
    )
    .await;

    let (status, body) = app
        .send("POST", &format!("/events/{event_id}/leave"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "BALANCE_NOT_ZERO");

    let (status, _) = app
        .send(
            "POST",
            &format!("/events/{event_id}/settlements"),
            Some(&bob),
            Some(json!({ "payerId": b, "receiverId": a, "amount": "100" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .send("POST", &format!("/events/{event_id}/leave"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_payment_request_confirm_once() {
    let app = TestApp::new().await;
    let ([alice, bob, _], event_id, [a, b, _]) = trip(&app).await;

    let (status, request) = app
        .send(
            "POST",
            &format!("/events/{event_id}/payment-requests"),
            Some(&bob),
            Some(json!({ "payerId": b, "receiverId": a, "amount": "50" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], "pending");
    let request_id = request["id"].as_str().unwrap();

    let confirm = format!("/events/{event_id}/payment-requests/{request_id}/confirm");
    let (status, _) = app.send("POST", &confirm, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, confirmed) = app.send("POST", &confirm, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "confirmed");

    let (status, body) = app.send("POST", &confirm, Some(&alice), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "STATE_CONFLICT");

    let (_, settlements) = app
        .send("GET", &format!("/events/{event_id}/settlements"), Some(&alice), None)
        .await;
    assert_eq!(settlements["settlements"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_creator_only_operations() {
    let app = TestApp::new().await;
    let ([alice, bob, _], event_id, [a, _, c]) = trip(&app).await;

    let (status, body) = app
        .send("DELETE", &format!("/events/{event_id}"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "PERMISSION_DENIED");

    let (status, _) = app
        .send("DELETE", &format!("/events/{event_id}/participants/{c}"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, collector) = app
        .send(
            "PUT",
            &format!("/events/{event_id}/collector"),
            Some(&alice),
            Some(json!({ "participantId": a })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(collector["participantName"], "Alice");

    let (status, link) = app
        .send(
            "POST",
            &format!("/events/{event_id}/payment-link"),
            Some(&bob),
            Some(json!({ "amount": "100000" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(link["content"], "Payment for event Da Lat trip");
    assert!(
        link["url"]
            .as_str()
            .unwrap()
            .starts_with("https://img.example.test/image/VCB-0011001-compact2.png?amount=100000")
    );

    let (status, _) = app
        .send("DELETE", &format!("/events/{event_id}"), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .send("GET", &format!("/events/{event_id}"), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
