use crate::error::{ServerError, ServerResult};
use crate::middleware::ClientIp;
use crate::state::ServerState;
use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Form, Json};
use chrono::{DateTime, Utc};
use harvest::{CanonicalRecord, IntakeReceipt, RawSubmission};
use serde::Serialize;
use std::sync::Arc;

/// Response for a persisted submission
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub status: &'static str,
    pub forced: bool,
    pub record: CanonicalRecord,
    pub stored_to: Vec<StoreReceipt>,
}

#[derive(Debug, Serialize)]
pub struct StoreReceipt {
    pub store: String,
    pub sequence: u64,
    pub stored_at: DateTime<Utc>,
}

impl SubmissionResponse {
    fn from_receipt(receipt: IntakeReceipt, forced: bool) -> Self {
        let stored_to = receipt
            .stored
            .into_iter()
            .map(|row| StoreReceipt {
                store: row.store,
                sequence: row.sequence,
                stored_at: row.stored_at,
            })
            .collect();
        Self {
            status: "persisted",
            forced,
            record: receipt.record,
            stored_to,
        }
    }
}

/// `POST /submit`: the URL-encoded field form.
pub async fn submit_form(
    State(state): State<Arc<ServerState>>,
    client: Option<Extension<ClientIp>>,
    form: Result<Form<RawSubmission>, FormRejection>,
) -> ServerResult<(StatusCode, Json<SubmissionResponse>)> {
    let Form(raw) = form.map_err(|err| ServerError::BadRequest(err.body_text()))?;
    submit(&state, client, raw).await
}

/// `POST /api/v1/submissions`: the same submission as JSON.
pub async fn submit_json(
    State(state): State<Arc<ServerState>>,
    client: Option<Extension<ClientIp>>,
    body: Result<Json<RawSubmission>, JsonRejection>,
) -> ServerResult<(StatusCode, Json<SubmissionResponse>)> {
    let Json(raw) = body.map_err(|err| ServerError::BadRequest(err.body_text()))?;
    submit(&state, client, raw).await
}

async fn submit(
    state: &ServerState,
    client: Option<Extension<ClientIp>>,
    raw: RawSubmission,
) -> ServerResult<(StatusCode, Json<SubmissionResponse>)> {
    let force = raw.force_requested();
    let client_ip = client.map(|Extension(ClientIp(ip))| ip).unwrap_or_default();

    tracing::info!(
        client_ip = %client_ip,
        record_id = ?raw.id,
        variety = ?raw.variety,
        block = ?raw.block,
        record_type = ?raw.record_type,
        force,
        "submission received"
    );

    match state.intake.submit(raw.clone(), force).await {
        Ok(receipt) => Ok((
            StatusCode::CREATED,
            Json(SubmissionResponse::from_receipt(receipt, force)),
        )),
        Err(err) => Err(ServerError::from_intake(err, &raw)),
    }
}
