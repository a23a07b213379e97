//! Handlers for `/employees` endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use docket_core::{
  Workflow,
  catalog::Employee,
  sanction::SanctionRecord,
  store::IncidentStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /employees`
pub async fn list<S: IncidentStore>(
  State(wf): State<Arc<Workflow<S>>>,
) -> Result<Json<Vec<Employee>>, ApiError> {
  Ok(Json(wf.list_employees().await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub full_name: String,
}

/// `POST /employees`: body: `{"full_name":"..."}`
pub async fn create<S: IncidentStore>(
  State(wf): State<Arc<Workflow<S>>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let employee = wf.add_employee(body.full_name).await?;
  Ok((StatusCode::CREATED, Json(employee)))
}

/// `GET /employees/:id/sanctions`: full sanction history, oldest first.
pub async fn sanctions<S: IncidentStore>(
  State(wf): State<Arc<Workflow<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<SanctionRecord>>, ApiError> {
  Ok(Json(wf.list_sanctions_for_employee(id).await?))
}
