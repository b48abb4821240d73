use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::{Query, State};
use axum::Json;
use harvest::RecordType;
use rulebook::FormOptions;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Query for the form options of one block.
#[derive(Debug, Deserialize)]
pub struct FormOptionsQuery {
    /// Block token as printed on the QR code. Defaults to `3`.
    #[serde(default, alias = "bloque")]
    pub block: Option<String>,

    /// Record type label (`national`, `nacional`, `end_of_cut`, ...).
    #[serde(default, rename = "type", alias = "tipo")]
    pub record_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FormOptionsResponse {
    pub record_type: RecordType,
    #[serde(flatten)]
    pub options: FormOptions,
}

/// `GET /api/v1/form-options`: varieties offered for a block and the sizes
/// each may be recorded with.
pub async fn form_options(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<FormOptionsQuery>,
) -> ServerResult<Json<FormOptionsResponse>> {
    let block = query
        .block
        .as_deref()
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .unwrap_or("3");

    let record_type = match query.record_type.as_deref().map(str::trim) {
        None | Some("") => RecordType::EndOfCut,
        Some(label) => RecordType::from_label(label)
            .ok_or_else(|| ServerError::BadRequest(format!("unknown record type `{label}`")))?,
    };

    let options = state
        .catalog
        .form_options(&state.rules, block, !record_type.is_national());

    Ok(Json(FormOptionsResponse {
        record_type,
        options,
    }))
}
