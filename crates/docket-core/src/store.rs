//! The `IncidentStore` trait and the outcome type for conditional writes.
//!
//! The trait is implemented by storage backends (e.g. `docket-store-sqlite`).
//! The workflow engine depends on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  catalog::{Employee, IncidentType, SanctionType, Severity},
  group::{IncidentGroup, NewIncident, Resolution},
  sanction::{SanctionRecord, SanctionTerms},
  statement::{DefenseStatement, NewDefenseStatement},
};

// ─── Conditional writes ──────────────────────────────────────────────────────

/// Which precondition a conditional write found violated at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum Contention {
  #[error("the group was superseded concurrently")]
  Superseded,
  #[error("a resolution was recorded concurrently")]
  Resolved,
  #[error("the group has no resolution")]
  Unresolved,
  #[error("a defense statement from this employee was submitted concurrently")]
  StatementExists,
  #[error("already sanctioned")]
  AlreadySanctioned,
  #[error("the name is already taken")]
  NameTaken,
}

/// Result of a write whose precondition is re-checked atomically with the
/// write itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome<T> {
  Applied(T),
  /// Nothing was written.
  Contended(Contention),
}

impl<T> WriteOutcome<T> {
  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WriteOutcome<U> {
    match self {
      Self::Applied(v) => WriteOutcome::Applied(f(v)),
      Self::Contended(c) => WriteOutcome::Contended(c),
    }
  }

  pub fn is_applied(&self) -> bool { matches!(self, Self::Applied(_)) }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Docket store backend.
///
/// Group core fields are written once. Later writes are limited to the
/// one-time resolution and the one-time successor link, and both are
/// compare-and-set: they only apply while the group is still unresolved and
/// unsuperseded.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait IncidentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Directory & catalogs ──────────────────────────────────────────────

  fn add_employee(
    &self,
    full_name: String,
  ) -> impl Future<Output = Result<Employee, Self::Error>> + Send + '_;

  fn get_employee(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Employee>, Self::Error>> + Send + '_;

  fn list_employees(
    &self,
  ) -> impl Future<Output = Result<Vec<Employee>, Self::Error>> + Send + '_;

  /// Catalog names are unique; a taken name comes back as
  /// [`Contention::NameTaken`].
  fn add_incident_type(
    &self,
    name: String,
  ) -> impl Future<Output = Result<WriteOutcome<IncidentType>, Self::Error>> + Send + '_;

  fn get_incident_type(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<IncidentType>, Self::Error>> + Send + '_;

  fn list_incident_types(
    &self,
  ) -> impl Future<Output = Result<Vec<IncidentType>, Self::Error>> + Send + '_;

  fn add_sanction_type(
    &self,
    name: String,
    severity: Severity,
  ) -> impl Future<Output = Result<WriteOutcome<SanctionType>, Self::Error>> + Send + '_;

  fn get_sanction_type(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<SanctionType>, Self::Error>> + Send + '_;

  fn list_sanction_types(
    &self,
  ) -> impl Future<Output = Result<Vec<SanctionType>, Self::Error>> + Send + '_;

  // ── Groups ────────────────────────────────────────────────────────────

  /// Persist a freshly reported group. `group_id` and `reported_at` are set
  /// by the store.
  fn insert_group(
    &self,
    input: NewIncident,
  ) -> impl Future<Output = Result<IncidentGroup, Self::Error>> + Send + '_;

  /// Persist `replacement` as the successor of `original_id` in one atomic
  /// unit: the new group is created and the original's successor link is set,
  /// or neither happens.
  ///
  /// Contended when the original already has a successor or a resolution.
  fn supersede_group(
    &self,
    original_id: Uuid,
    replacement: NewIncident,
  ) -> impl Future<Output = Result<WriteOutcome<IncidentGroup>, Self::Error>>
  + Send
  + '_;

  /// Retrieve a group by UUID. Returns `None` if not found.
  fn get_group(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<IncidentGroup>, Self::Error>> + Send + '_;

  /// Every group the employee is involved in, newest report first.
  fn list_groups_for_employee(
    &self,
    employee_id: Uuid,
  ) -> impl Future<Output = Result<Vec<IncidentGroup>, Self::Error>> + Send + '_;

  /// Write the group's resolution. Contended when the group already has a
  /// resolution or a successor.
  fn record_resolution(
    &self,
    group_id: Uuid,
    description: String,
  ) -> impl Future<Output = Result<WriteOutcome<Resolution>, Self::Error>>
  + Send
  + '_;

  // ── Statements ────────────────────────────────────────────────────────

  /// Contended when the author already has a statement on the group, or the
  /// group has been resolved or superseded.
  fn add_statement(
    &self,
    input: NewDefenseStatement,
  ) -> impl Future<Output = Result<WriteOutcome<DefenseStatement>, Self::Error>>
  + Send
  + '_;

  fn list_statements(
    &self,
    group_id: Uuid,
  ) -> impl Future<Output = Result<Vec<DefenseStatement>, Self::Error>> + Send + '_;

  // ── Sanctions ─────────────────────────────────────────────────────────

  /// Record a sanction sourced from `group_id`. Contended when the employee
  /// already holds a sanction from that group, or the group is unresolved or
  /// superseded.
  fn add_group_sanction(
    &self,
    group_id: Uuid,
    terms: SanctionTerms,
  ) -> impl Future<Output = Result<WriteOutcome<SanctionRecord>, Self::Error>>
  + Send
  + '_;

  /// Record a sanction with no source group.
  fn add_direct_sanction(
    &self,
    terms: SanctionTerms,
  ) -> impl Future<Output = Result<SanctionRecord, Self::Error>> + Send + '_;

  /// Sanctions whose `source_group_id` is `group_id`.
  fn list_sanctions_for_group(
    &self,
    group_id: Uuid,
  ) -> impl Future<Output = Result<Vec<SanctionRecord>, Self::Error>> + Send + '_;

  /// Every sanction held by an employee, workflow-sourced or not.
  fn list_sanctions_for_employee(
    &self,
    employee_id: Uuid,
  ) -> impl Future<Output = Result<Vec<SanctionRecord>, Self::Error>> + Send + '_;
}
