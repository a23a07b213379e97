//! Handler for `POST /sanctions`: sanctions issued outside any incident.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use docket_core::{Workflow, sanction::SanctionTerms, store::IncidentStore};
use serde_json::json;

use crate::error::ApiError;

/// `POST /sanctions`: body: [`SanctionTerms`]; returns 201 + `{"sanction_id"}`.
pub async fn issue<S: IncidentStore>(
  State(wf): State<Arc<Workflow<S>>>,
  Json(body): Json<SanctionTerms>,
) -> Result<impl IntoResponse, ApiError> {
  let sanction_id = wf.issue_sanction(body).await?;
  Ok((StatusCode::CREATED, Json(json!({ "sanction_id": sanction_id }))))
}
