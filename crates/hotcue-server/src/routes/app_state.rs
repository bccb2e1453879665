use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use hotcue_core::TriggerSnapshot;
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Accepted {
    pub snapshot: String,
    pub triggers: usize,
}

/// POST /app-state: replace the whole trigger set.
///
/// The body must be exactly one JSON array of triggers. The handler waits for
/// room in the snapshot channel; if the client goes away first the future is
/// dropped and nothing is handed over.
pub async fn push_app_state(
    State(app): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Accepted>), AppError> {
    let snapshot = TriggerSnapshot::from_json(&body)?;
    let accepted = Accepted {
        snapshot: snapshot.id().to_string(),
        triggers: snapshot.len(),
    };

    app.snapshot_tx
        .send(snapshot)
        .await
        .map_err(|_| AppError::unavailable("orchestrator is not accepting snapshots"))?;

    tracing::info!(
        snapshot = %accepted.snapshot,
        triggers = accepted.triggers,
        "config push accepted"
    );
    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

/// GET /app-state: the triggers currently in effect.
pub async fn get_app_state(State(app): State<AppState>) -> Json<TriggerSnapshot> {
    Json(TriggerSnapshot::clone(&app.snapshots.load()))
}
