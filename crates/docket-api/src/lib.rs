//! JSON REST API for Docket.
//!
//! Exposes an axum [`Router`] backed by a [`Workflow`] over any
//! [`docket_core::store::IncidentStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", docket_api::api_router(Arc::new(Workflow::new(store))))
//! ```

pub mod catalog;
pub mod employees;
pub mod error;
pub mod groups;
pub mod sanctions;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use docket_core::{Workflow, store::IncidentStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `workflow`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(workflow: Arc<Workflow<S>>) -> Router<()>
where
  S: IncidentStore + 'static,
{
  Router::new()
    // Groups
    .route("/groups", get(groups::list::<S>).post(groups::report::<S>))
    .route("/groups/{id}", get(groups::get_one::<S>))
    .route("/groups/{id}/chain", get(groups::chain::<S>))
    .route("/groups/{id}/remaining", get(groups::remaining::<S>))
    .route("/groups/{id}/statements", post(groups::submit_statement::<S>))
    .route("/groups/{id}/resolution", post(groups::resolve::<S>))
    .route("/groups/{id}/sanctions", post(groups::apply_sanction::<S>))
    .route("/groups/{id}/corrections", post(groups::correct::<S>))
    // Directory
    .route("/employees", get(employees::list::<S>).post(employees::create::<S>))
    .route("/employees/{id}/sanctions", get(employees::sanctions::<S>))
    // Direct sanctions
    .route("/sanctions", post(sanctions::issue::<S>))
    // Catalogs
    .route(
      "/catalog/incident-types",
      get(catalog::list_incident_types::<S>).post(catalog::create_incident_type::<S>),
    )
    .route(
      "/catalog/sanction-types",
      get(catalog::list_sanction_types::<S>).post(catalog::create_sanction_type::<S>),
    )
    .with_state(workflow)
}
