//! DiscordClient against a local stand-in for the REST API

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{extract::Request, http::StatusCode, response::IntoResponse, Router};
use serde_json::{json, Value};
use tokengate_bot::{
    discord::verify_command, DiscordClient, GuildPlatform, InteractionToken, ResponseSink,
    VerificationResponse,
};
use tokengate_common::{
    config::DiscordSettings, ApplicationId, GuildId, Permissions, PlatformError, RoleId, UserId,
};

#[derive(Debug, Clone)]
struct Captured {
    method: String,
    path: String,
    authorization: Option<String>,
    audit_reason: Option<String>,
    body: String,
}

type Log = Arc<Mutex<Vec<Captured>>>;

/// Serve `respond(method, path)` for every request, recording what arrived
async fn spawn_api<F>(delay: Duration, respond: F) -> (DiscordSettings, Log)
where
    F: Fn(&str, &str) -> (StatusCode, String) + Clone + Send + Sync + 'static,
{
    let log: Log = Arc::default();
    let recorded = log.clone();

    let app = Router::new().fallback(move |request: Request| {
        let respond = respond.clone();
        let recorded = recorded.clone();
        async move {
            let (parts, body) = request.into_parts();
            let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
            let header = |name: &str| {
                parts
                    .headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            let captured = Captured {
                method: parts.method.to_string(),
                path: parts.uri.path().to_string(),
                authorization: header("authorization"),
                audit_reason: header("x-audit-log-reason"),
                body: String::from_utf8_lossy(&body).into_owned(),
            };
            recorded.lock().unwrap().push(captured.clone());

            tokio::time::sleep(delay).await;
            let (status, body) = respond(&captured.method, &captured.path);
            (status, [("content-type", "application/json")], body).into_response()
        }
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let settings = DiscordSettings {
        token: "test-bot-token".to_string(),
        application_id: ApplicationId(11),
        guild_id: GuildId(22),
        api_base: format!("http://{}/api/v10/", addr),
        timeout: Duration::from_secs(2),
    };
    (settings, log)
}

fn only_request(log: &Log) -> Captured {
    let log = log.lock().unwrap();
    assert_eq!(log.len(), 1, "expected exactly one request, got {:?}", *log);
    log[0].clone()
}

#[tokio::test]
async fn test_guild_roles() {
    let (settings, log) = spawn_api(Duration::ZERO, |_, _| {
        (
            StatusCode::OK,
            json!([
                { "id": "22", "name": "@everyone", "permissions": "0" },
                { "id": "44", "name": "Holder", "color": 0, "permissions": "268435456" }
            ])
            .to_string(),
        )
    })
    .await;
    let client = DiscordClient::new(&settings).unwrap();

    let roles = client.guild_roles(GuildId(22)).await.unwrap();
    assert_eq!(roles.len(), 2);
    assert_eq!(roles[1].id, RoleId(44));
    assert_eq!(roles[1].name, "Holder");
    assert_eq!(roles[0].permissions, Permissions::empty());
    assert!(roles[1].permissions.can_manage_roles());

    let request = only_request(&log);
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/api/v10/guilds/22/roles");
    assert_eq!(request.authorization.as_deref(), Some("Bot test-bot-token"));
}

#[tokio::test]
async fn test_current_member_roles() {
    let (settings, log) = spawn_api(Duration::ZERO, |_, path| match path {
        "/api/v10/users/@me" => (
            StatusCode::OK,
            json!({ "id": "1700000000000000007", "username": "tokengate", "bot": true })
                .to_string(),
        ),
        _ => (
            StatusCode::OK,
            json!({
                "user": { "id": "1700000000000000007" },
                "roles": ["44", "45"],
                "joined_at": "2024-01-01T00:00:00.000000+00:00"
            })
            .to_string(),
        ),
    })
    .await;
    let client = DiscordClient::new(&settings).unwrap();

    let roles = client.current_member_roles(GuildId(22)).await.unwrap();
    assert_eq!(roles, vec![RoleId(44), RoleId(45)]);
    client.current_member_roles(GuildId(22)).await.unwrap();

    let paths: Vec<String> = log.lock().unwrap().iter().map(|c| c.path.clone()).collect();
    assert_eq!(
        paths,
        vec![
            "/api/v10/users/@me",
            "/api/v10/guilds/22/members/1700000000000000007",
            "/api/v10/guilds/22/members/1700000000000000007",
        ]
    );
}

#[tokio::test]
async fn test_add_member_role() {
    let (settings, log) =
        spawn_api(Duration::ZERO, |_, _| (StatusCode::NO_CONTENT, String::new())).await;
    let client = DiscordClient::new(&settings).unwrap();

    client
        .add_member_role(GuildId(22), UserId(33), RoleId(44))
        .await
        .unwrap();

    let request = only_request(&log);
    assert_eq!(request.method, "PUT");
    assert_eq!(request.path, "/api/v10/guilds/22/members/33/roles/44");
    assert_eq!(request.audit_reason.as_deref(), Some("Verified NFT holder"));
    assert!(request.body.is_empty());
}

#[tokio::test]
async fn test_forbidden_grant_is_api_error() {
    let (settings, _log) = spawn_api(Duration::ZERO, |_, _| {
        (
            StatusCode::FORBIDDEN,
            json!({ "message": "Missing Permissions", "code": 50013 }).to_string(),
        )
    })
    .await;
    let client = DiscordClient::new(&settings).unwrap();

    let err = client
        .add_member_role(GuildId(22), UserId(33), RoleId(44))
        .await
        .unwrap_err();
    match err {
        PlatformError::Api { status, message } => {
            assert_eq!(status, 403);
            assert!(message.contains("Missing Permissions"));
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_deliver_edits_original_response() {
    let (settings, log) = spawn_api(Duration::ZERO, |_, _| {
        (StatusCode::OK, json!({ "id": "99" }).to_string())
    })
    .await;
    let client = DiscordClient::new(&settings).unwrap();

    client
        .deliver(
            &InteractionToken::new("tok-123"),
            VerificationResponse::VerificationSuccess,
        )
        .await
        .unwrap();

    let request = only_request(&log);
    assert_eq!(request.method, "PATCH");
    assert_eq!(request.path, "/api/v10/webhooks/11/tok-123/messages/@original");
    let body: Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(
        body,
        json!({ "content": "✅ Verification successful! Role granted." })
    );
}

#[tokio::test]
async fn test_register_guild_commands() {
    let (settings, log) = spawn_api(Duration::ZERO, |_, _| {
        (
            StatusCode::OK,
            json!([{
                "id": "1300000000000000003",
                "application_id": "11",
                "guild_id": "22",
                "name": "verify",
                "description": "Verify your wallet holds an NFT from the collection",
                "type": 1,
                "version": "1"
            }])
            .to_string(),
        )
    })
    .await;
    let client = DiscordClient::new(&settings).unwrap();

    let registered = client
        .register_guild_commands(GuildId(22), &[verify_command()])
        .await
        .unwrap();
    assert_eq!(registered.len(), 1);
    assert_eq!(registered[0].name, "verify");
    assert_eq!(registered[0].id, "1300000000000000003");

    let request = only_request(&log);
    assert_eq!(request.method, "PUT");
    assert_eq!(request.path, "/api/v10/applications/11/guilds/22/commands");

    let body: Value = serde_json::from_str(&request.body).unwrap();
    let commands = body.as_array().unwrap();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0]["name"], "verify");
    assert_eq!(commands[0]["options"][0]["name"], "address");
    assert_eq!(commands[0]["options"][0]["type"], 3);
    assert_eq!(commands[0]["options"][0]["required"], true);
}

#[tokio::test]
async fn test_slow_api_times_out() {
    let (mut settings, _log) = spawn_api(Duration::from_secs(2), |_, _| {
        (StatusCode::OK, "[]".to_string())
    })
    .await;
    settings.timeout = Duration::from_millis(200);
    let client = DiscordClient::new(&settings).unwrap();

    let err = client.guild_roles(GuildId(22)).await.unwrap_err();
    assert_eq!(err, PlatformError::Timeout);
}

#[tokio::test]
async fn test_unparsable_roles_is_decode_error() {
    let (settings, _log) =
        spawn_api(Duration::ZERO, |_, _| (StatusCode::OK, "<html>".to_string())).await;
    let client = DiscordClient::new(&settings).unwrap();

    let err = client.guild_roles(GuildId(22)).await.unwrap_err();
    assert!(matches!(err, PlatformError::Decode(_)));
}
