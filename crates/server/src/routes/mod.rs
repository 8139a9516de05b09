use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Multipart, State,
    },
    http::StatusCode,
    response::{Json, Response},
};
use serde_json::{json, Value};

use crate::selection::Subscription;
use crate::AppState;
use shared::{AssetList, DeliveryReport, IntakeOutcome, SceneMessage};

/// Multipart field carrying the uploaded model
const FILE_FIELD: &str = "file";

/// Health check
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Upload a model → stored URL or rejection
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<IntakeOutcome>), StatusCode> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Malformed upload: {}", e);
        StatusCode::BAD_REQUEST
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_string).ok_or_else(|| {
            tracing::warn!("Upload field '{}' has no filename", FILE_FIELD);
            StatusCode::BAD_REQUEST
        })?;
        let bytes = field.bytes().await.map_err(|e| {
            tracing::warn!("Failed to read upload '{}': {}", filename, e);
            StatusCode::BAD_REQUEST
        })?;

        let outcome = state
            .intake
            .submit(&filename, &bytes)
            .await
            .map_err(|e| {
                tracing::error!("Upload error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;

        let status = if outcome.is_stored() {
            StatusCode::OK
        } else {
            StatusCode::UNPROCESSABLE_ENTITY
        };
        return Ok((status, Json(outcome)));
    }

    Err(StatusCode::BAD_REQUEST)
}

/// List stored assets
pub async fn list_assets(State(state): State<AppState>) -> Result<Json<AssetList>, StatusCode> {
    let assets = state.intake.list().await.map_err(|e| {
        tracing::error!("List error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(AssetList { assets }))
}

/// Publish a selection made inside an embedded scene
pub async fn publish_selection(
    State(state): State<AppState>,
    Json(msg): Json<SceneMessage>,
) -> Result<(StatusCode, Json<DeliveryReport>), StatusCode> {
    let delivered = state.selection.publish(msg).map_err(|e| {
        tracing::warn!("Selection rejected: {}", e);
        StatusCode::UNPROCESSABLE_ENTITY
    })?;
    Ok((StatusCode::ACCEPTED, Json(DeliveryReport { delivered })))
}

/// Subscribe a host page to selections over a WebSocket
pub async fn selection_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    // Subscribe before the upgrade so nothing published during the handshake is lost.
    let subscription = state.selection.subscribe();
    ws.on_upgrade(move |socket| forward_selections(socket, subscription, state))
}

async fn forward_selections(mut socket: WebSocket, mut subscription: Subscription, state: AppState) {
    tracing::debug!("Selection subscriber connected");
    loop {
        tokio::select! {
            msg = subscription.recv() => {
                let Some(msg) = msg else { break };
                let text = match serde_json::to_string(&msg) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!("Failed to encode selection: {}", e);
                        continue;
                    }
                };
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => match incoming {
                // Scenes may also post selections over the socket
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<SceneMessage>(text.as_str()) {
                        Ok(msg) => {
                            if let Err(e) = state.selection.publish(msg) {
                                tracing::warn!("Selection rejected: {}", e);
                            }
                        }
                        Err(e) => tracing::warn!("Ignoring malformed scene message: {}", e),
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            }
        }
    }
    subscription.unsubscribe();
    tracing::debug!("Selection subscriber disconnected");
}
