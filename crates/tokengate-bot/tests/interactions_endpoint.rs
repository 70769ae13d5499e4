//! Interactions endpoint: signatures, acknowledgements, and job queueing

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use ed25519_dalek::{Signer, SigningKey};
use serde_json::{json, Value};
use tokengate_bot::{
    router, AppState, Dispatcher, SignatureVerifier, VerificationJob, VerificationResponse,
};
use tokengate_common::{GuildId, UserId};
use tokio::sync::mpsc;
use tower::ServiceExt;

const TIMESTAMP: &str = "1700000000";

fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
}

fn app(capacity: usize) -> (Router, mpsc::Receiver<VerificationJob>) {
    let (tx, rx) = mpsc::channel(capacity);
    let state = AppState::new(
        SignatureVerifier::new(signing_key().verifying_key()),
        Dispatcher::new(tx),
    );
    (router(state), rx)
}

fn signed(body: &str) -> Request<Body> {
    let mut message = TIMESTAMP.as_bytes().to_vec();
    message.extend_from_slice(body.as_bytes());
    let signature = hex::encode(signing_key().sign(&message).to_bytes());

    Request::builder()
        .method("POST")
        .uri("/interactions")
        .header("content-type", "application/json")
        .header("x-signature-ed25519", signature)
        .header("x-signature-timestamp", TIMESTAMP)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn verify_command(address: &str) -> String {
    json!({
        "id": "1500000000000000005",
        "application_id": "1100000000000000001",
        "type": 2,
        "token": "interaction-token",
        "guild_id": "1200000000000000002",
        "app_permissions": "268435456",
        "member": { "user": { "id": "1400000000000000004", "username": "holder" } },
        "data": {
            "name": "verify",
            "options": [{ "name": "address", "type": 3, "value": address }]
        }
    })
    .to_string()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

fn as_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn test_ping_is_ponged() {
    let (app, _rx) = app(4);
    let (status, body) = send(app, signed(r#"{"type":1}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body), json!({ "type": 1 }));
}

#[tokio::test]
async fn test_unsigned_request_rejected() {
    let (app, _rx) = app(4);
    let request = Request::builder()
        .method("POST")
        .uri("/interactions")
        .body(Body::from(r#"{"type":1}"#))
        .unwrap();
    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tampered_body_rejected() {
    let (app, mut rx) = app(4);
    let mut request = signed(&verify_command("0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359"));
    *request.body_mut() = Body::from(verify_command("0x0000000000000000000000000000000000000000"));

    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_verify_is_deferred_and_queued() {
    let (app, mut rx) = app(4);
    let (status, body) = send(
        app,
        signed(&verify_command("0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body), json!({ "type": 5, "data": { "flags": 64 } }));

    let job = rx.try_recv().unwrap();
    assert_eq!(job.token.as_str(), "interaction-token");
    assert_eq!(job.request.invoking_user_id, UserId(1400000000000000004));
    assert_eq!(
        job.request.raw_address,
        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359"
    );
    assert_eq!(job.request.guild.unwrap().guild_id, GuildId(1200000000000000002));
}

#[tokio::test]
async fn test_invalid_address_still_queued() {
    // validation belongs to the handler, the endpoint only acknowledges
    let (app, mut rx) = app(4);
    let (status, _) = send(app, signed(&verify_command("not-an-address"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rx.try_recv().unwrap().request.raw_address, "not-an-address");
}

#[tokio::test]
async fn test_unknown_command() {
    let (app, mut rx) = app(4);
    let body = json!({
        "type": 2,
        "token": "t",
        "member": { "user": { "id": "1" } },
        "guild_id": "2",
        "data": { "name": "balance" }
    })
    .to_string();

    let (status, body) = send(app, signed(&body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        as_json(&body),
        json!({ "type": 4, "data": { "content": "Unknown command.", "flags": 64 } })
    );
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_full_queue_answers_immediately() {
    let (app, _rx) = app(1);
    let address = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

    let (_, first) = send(app.clone(), signed(&verify_command(address))).await;
    assert_eq!(as_json(&first)["type"], 5);

    let (status, second) = send(app, signed(&verify_command(address))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        as_json(&second),
        json!({
            "type": 4,
            "data": {
                "content": VerificationResponse::VerificationError.message(),
                "flags": 64
            }
        })
    );
}

#[tokio::test]
async fn test_malformed_payload() {
    let (app, _rx) = app(4);
    let (status, _) = send(app, signed("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unsupported_interaction_type() {
    let (app, _rx) = app(4);
    let (status, _) = send(app, signed(r#"{"type":3,"token":"t"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health() {
    let (app, _rx) = app(4);
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body)["status"], "healthy");
}
