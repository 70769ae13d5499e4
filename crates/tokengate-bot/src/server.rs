//! HTTP interactions endpoint
//!
//! Discord POSTs every interaction here and expects an answer within three
//! seconds, so `verify` is acknowledged with a deferred ephemeral reply and the
//! real work is queued on the [`Dispatcher`].

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use tokengate_common::{config::ServerSettings, VERIFY_COMMAND, VERSION};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

use crate::discord::interaction::{Interaction, InteractionResponse, InteractionType};
use crate::dispatch::{Dispatcher, VerificationJob};
use crate::handler::VerificationResponse;
use crate::platform::InteractionToken;
use crate::signature::{SignatureError, SignatureVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER};

#[derive(Clone)]
pub struct AppState {
    verifier: SignatureVerifier,
    dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(verifier: SignatureVerifier, dispatcher: Dispatcher) -> Self {
        Self {
            verifier,
            dispatcher,
        }
    }
}

/// Routes: `POST /interactions`, `GET /health`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/interactions", post(interactions))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the listener; `host` may be a hostname or an IPv4/IPv6 literal
pub async fn bind(settings: &ServerSettings) -> std::io::Result<TcpListener> {
    TcpListener::bind((settings.host.as_str(), settings.port)).await
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": VERSION,
    }))
}

async fn interactions(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Err(e) = verify_signature(&state.verifier, &headers, &body) {
        warn!(error = %e, "rejected interaction");
        return (StatusCode::UNAUTHORIZED, "invalid request signature").into_response();
    }

    let interaction: Interaction = match serde_json::from_slice(&body) {
        Ok(interaction) => interaction,
        Err(e) => {
            warn!(error = %e, "malformed interaction payload");
            return (StatusCode::BAD_REQUEST, "malformed interaction").into_response();
        }
    };

    match interaction.kind {
        InteractionType::Ping => {
            debug!("answering ping");
            Json(InteractionResponse::pong()).into_response()
        }
        InteractionType::ApplicationCommand => handle_command(&state.dispatcher, interaction),
        InteractionType::Other(kind) => {
            warn!(kind, "unsupported interaction type");
            (StatusCode::BAD_REQUEST, "unsupported interaction type").into_response()
        }
    }
}

fn verify_signature(
    verifier: &SignatureVerifier,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), SignatureError> {
    let header = |name: &'static str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .ok_or(SignatureError::MissingHeader(name))
    };
    let signature = header(SIGNATURE_HEADER)?;
    let timestamp = header(TIMESTAMP_HEADER)?;
    verifier.verify(signature, timestamp, body)
}

fn handle_command(dispatcher: &Dispatcher, interaction: Interaction) -> Response {
    if interaction.command_name() != Some(VERIFY_COMMAND) {
        debug!(command = ?interaction.command_name(), "unknown command");
        return Json(InteractionResponse::ephemeral_message("Unknown command.")).into_response();
    }

    let Some(request) = interaction.to_verification_request() else {
        warn!("verify interaction without an invoking user");
        return (StatusCode::BAD_REQUEST, "interaction has no user").into_response();
    };

    let job = VerificationJob {
        token: InteractionToken::new(interaction.token),
        request,
    };

    match dispatcher.submit(job) {
        Ok(()) => Json(InteractionResponse::deferred_ephemeral()).into_response(),
        Err(e) => {
            error!(error = %e, "could not queue verification");
            Json(InteractionResponse::ephemeral_message(
                VerificationResponse::VerificationError.message(),
            ))
            .into_response()
        }
    }
}
