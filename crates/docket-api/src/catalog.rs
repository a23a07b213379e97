//! Handlers for `/catalog/*` endpoints.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use docket_core::{
  Workflow,
  catalog::{IncidentType, SanctionType, Severity},
  store::IncidentStore,
};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct IncidentTypeBody {
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SanctionTypeBody {
  pub name:     String,
  pub severity: Severity,
}

/// `GET /catalog/incident-types`
pub async fn list_incident_types<S: IncidentStore>(
  State(wf): State<Arc<Workflow<S>>>,
) -> Result<Json<Vec<IncidentType>>, ApiError> {
  Ok(Json(wf.list_incident_types().await?))
}

/// `POST /catalog/incident-types`: body: `{"name":"..."}`
pub async fn create_incident_type<S: IncidentStore>(
  State(wf): State<Arc<Workflow<S>>>,
  Json(body): Json<IncidentTypeBody>,
) -> Result<impl IntoResponse, ApiError> {
  let created = wf.add_incident_type(body.name).await?;
  Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /catalog/sanction-types`
pub async fn list_sanction_types<S: IncidentStore>(
  State(wf): State<Arc<Workflow<S>>>,
) -> Result<Json<Vec<SanctionType>>, ApiError> {
  Ok(Json(wf.list_sanction_types().await?))
}

/// `POST /catalog/sanction-types`: body: `{"name":"...","severity":"mild"}`
pub async fn create_sanction_type<S: IncidentStore>(
  State(wf): State<Arc<Workflow<S>>>,
  Json(body): Json<SanctionTypeBody>,
) -> Result<impl IntoResponse, ApiError> {
  let created = wf.add_sanction_type(body.name, body.severity).await?;
  Ok((StatusCode::CREATED, Json(created)))
}
