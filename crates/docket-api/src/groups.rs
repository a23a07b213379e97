//! Handlers for `/groups` endpoints: the incident resolution workflow.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/groups` | Body: [`NewIncident`]; returns 201 + `{"group_id"}` |
//! | `GET`  | `/groups` | `?employee_id` required |
//! | `GET`  | `/groups/:id` | Group view with derived status |
//! | `GET`  | `/groups/:id/chain` | Correction chain |
//! | `GET`  | `/groups/:id/remaining` | Employees still awaiting a sanction |
//! | `POST` | `/groups/:id/statements` | Body: [`StatementBody`]; returns 201 |
//! | `POST` | `/groups/:id/resolution` | Body: `{"description":"..."}`; returns 204 |
//! | `POST` | `/groups/:id/sanctions` | Body: [`SanctionTerms`]; returns 201 |
//! | `POST` | `/groups/:id/corrections` | Body: [`Amendment`]; returns 201 |

use std::{collections::BTreeSet, sync::Arc};

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use docket_core::{
  Workflow,
  group::{Amendment, NewIncident},
  linkage::Chain,
  sanction::SanctionTerms,
  statement::NewDefenseStatement,
  status::GroupView,
  store::IncidentStore,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;

// ─── Report ───────────────────────────────────────────────────────────────────

/// `POST /groups`
pub async fn report<S: IncidentStore>(
  State(wf): State<Arc<Workflow<S>>>,
  Json(body): Json<NewIncident>,
) -> Result<impl IntoResponse, ApiError> {
  let group_id = wf.report_incident(body).await?;
  Ok((StatusCode::CREATED, Json(json!({ "group_id": group_id }))))
}

// ─── Reads ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub employee_id: Uuid,
}

/// `GET /groups?employee_id=<id>`
pub async fn list<S: IncidentStore>(
  State(wf): State<Arc<Workflow<S>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<GroupView>>, ApiError> {
  Ok(Json(wf.list_groups_for_employee(params.employee_id).await?))
}

/// `GET /groups/:id`
pub async fn get_one<S: IncidentStore>(
  State(wf): State<Arc<Workflow<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<GroupView>, ApiError> {
  Ok(Json(wf.get_group(id).await?))
}

/// `GET /groups/:id/chain`
pub async fn chain<S: IncidentStore>(
  State(wf): State<Arc<Workflow<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Chain>, ApiError> {
  Ok(Json(wf.get_chain(id).await?))
}

#[derive(Debug, Serialize)]
pub struct Remaining {
  pub remaining_employees: BTreeSet<Uuid>,
  pub can_finalize:        bool,
}

/// `GET /groups/:id/remaining`
pub async fn remaining<S: IncidentStore>(
  State(wf): State<Arc<Workflow<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Remaining>, ApiError> {
  let view = wf.get_group(id).await?;
  let can_finalize = view.can_finalize();
  Ok(Json(Remaining {
    remaining_employees: view.remaining_employees,
    can_finalize,
  }))
}

// ─── Statements ───────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /groups/:id/statements`.
#[derive(Debug, Deserialize)]
pub struct StatementBody {
  pub author_employee_id: Uuid,
  pub content:            String,
  pub attachment_ref:     Option<String>,
}

/// `POST /groups/:id/statements`
pub async fn submit_statement<S: IncidentStore>(
  State(wf): State<Arc<Workflow<S>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<StatementBody>,
) -> Result<impl IntoResponse, ApiError> {
  let statement_id = wf
    .submit_defense_statement(NewDefenseStatement {
      group_id:           id,
      author_employee_id: body.author_employee_id,
      content:            body.content,
      attachment_ref:     body.attachment_ref,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(json!({ "statement_id": statement_id }))))
}

// ─── Resolution ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ResolutionBody {
  pub description: String,
}

/// `POST /groups/:id/resolution`
pub async fn resolve<S: IncidentStore>(
  State(wf): State<Arc<Workflow<S>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ResolutionBody>,
) -> Result<StatusCode, ApiError> {
  wf.record_resolution(id, body.description).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Sanctions ────────────────────────────────────────────────────────────────

/// `POST /groups/:id/sanctions`
pub async fn apply_sanction<S: IncidentStore>(
  State(wf): State<Arc<Workflow<S>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<SanctionTerms>,
) -> Result<impl IntoResponse, ApiError> {
  let sanction_id = wf.apply_sanction(id, body).await?;
  Ok((StatusCode::CREATED, Json(json!({ "sanction_id": sanction_id }))))
}

// ─── Corrections ──────────────────────────────────────────────────────────────

/// `POST /groups/:id/corrections`: returns the successor's id.
pub async fn correct<S: IncidentStore>(
  State(wf): State<Arc<Workflow<S>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<Amendment>,
) -> Result<impl IntoResponse, ApiError> {
  let group_id = wf.create_correction(id, body).await?;
  Ok((StatusCode::CREATED, Json(json!({ "group_id": group_id }))))
}
