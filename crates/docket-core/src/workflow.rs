//! [`Workflow`]: the incident resolution state machine.
//!
//! The engine holds nothing but a store handle. Each operation reads the
//! group's current facts, derives its status, checks the guards, and then
//! issues a single conditional write. Losing a race at write time surfaces as
//! [`Error::Conflict`]; nothing is retried here.
//!
//! Sanction application lives in `coordinator.rs` and corrections in
//! `correction.rs`; both extend this type.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  catalog::{Employee, IncidentType, SanctionType, Severity},
  error::{InputError, Missing, Rejection},
  group::{IncidentGroup, NewIncident},
  statement::NewDefenseStatement,
  status::{GroupStatus, GroupView},
  store::{Contention, IncidentStore, WriteOutcome},
  validate,
};

/// The incident resolution workflow over a store `S`.
///
/// Cloning is as cheap as cloning the store.
#[derive(Debug, Clone)]
pub struct Workflow<S> {
  pub(crate) store: S,
}

impl<S> Workflow<S> {
  pub fn new(store: S) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }
}

impl<S: IncidentStore> Workflow<S> {
  // ── Directory & catalogs ──────────────────────────────────────────────────

  pub async fn add_employee(&self, full_name: String) -> Result<Employee> {
    validate::non_empty("full_name", &full_name)?;
    self
      .store
      .add_employee(full_name.trim().to_owned())
      .await
      .map_err(Error::store)
  }

  pub async fn list_employees(&self) -> Result<Vec<Employee>> {
    self.store.list_employees().await.map_err(Error::store)
  }

  pub async fn add_incident_type(&self, name: String) -> Result<IncidentType> {
    validate::non_empty("name", &name)?;
    let name = name.trim().to_owned();
    let outcome = self
      .store
      .add_incident_type(name.clone())
      .await
      .map_err(Error::store)?;
    unique_name(outcome, name)
  }

  pub async fn list_incident_types(&self) -> Result<Vec<IncidentType>> {
    self.store.list_incident_types().await.map_err(Error::store)
  }

  pub async fn add_sanction_type(
    &self,
    name: String,
    severity: Severity,
  ) -> Result<SanctionType> {
    validate::non_empty("name", &name)?;
    let name = name.trim().to_owned();
    let outcome = self
      .store
      .add_sanction_type(name.clone(), severity)
      .await
      .map_err(Error::store)?;
    unique_name(outcome, name)
  }

  pub async fn list_sanction_types(&self) -> Result<Vec<SanctionType>> {
    self.store.list_sanction_types().await.map_err(Error::store)
  }

  // ── Report ────────────────────────────────────────────────────────────────

  /// Create a new `OPEN` group and return its id.
  pub async fn report_incident(&self, input: NewIncident) -> Result<Uuid> {
    let input = self.check_incident(input).await?;
    let group = self.store.insert_group(input).await.map_err(Error::store)?;

    info!(
      group_id = %group.group_id,
      employees = group.involved_employees.len(),
      "incident reported"
    );
    Ok(group.group_id)
  }

  // ── Defense statements ────────────────────────────────────────────────────

  /// Record an involved employee's account. Only accepted while the group is
  /// `OPEN`, and only once per employee.
  pub async fn submit_defense_statement(
    &self,
    input: NewDefenseStatement,
  ) -> Result<Uuid> {
    validate::non_empty("content", &input.content)?;

    let group_id = input.group_id;
    let author = input.author_employee_id;
    let view = self.load_view(group_id).await?;

    self.require_involved(&view.group, author).await?;
    require_open(&view)?;
    if view.statements.iter().any(|s| s.author_employee_id == author) {
      debug!(%group_id, employee_id = %author, "duplicate defense statement rejected");
      return Err(Error::transition(group_id, Rejection::StatementExists(author)));
    }

    let input = NewDefenseStatement {
      attachment_ref: input.attachment_ref.filter(|a| !a.trim().is_empty()),
      ..input
    };
    match self.store.add_statement(input).await.map_err(Error::store)? {
      WriteOutcome::Applied(statement) => {
        info!(%group_id, employee_id = %author, "defense statement submitted");
        Ok(statement.statement_id)
      }
      WriteOutcome::Contended(c) => Err(contended(group_id, c)),
    }
  }

  // ── Resolution ────────────────────────────────────────────────────────────

  /// Record the one and only resolution of an `OPEN` group. This fixes the
  /// involved-employee set and starts the sanctioning phase.
  pub async fn record_resolution(
    &self,
    group_id: Uuid,
    description: String,
  ) -> Result<()> {
    validate::non_empty("description", &description)?;

    let view = self.load_view(group_id).await?;
    require_open(&view)?;

    match self
      .store
      .record_resolution(group_id, description)
      .await
      .map_err(Error::store)?
    {
      WriteOutcome::Applied(_) => {
        info!(
          %group_id,
          awaiting = view.group.involved_employees.len(),
          "resolution recorded"
        );
        Ok(())
      }
      WriteOutcome::Contended(c) => Err(contended(group_id, c)),
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// The full record, its statements and sanctions, derived status, and the
  /// employees still awaiting a sanction.
  pub async fn get_group(&self, group_id: Uuid) -> Result<GroupView> {
    self.load_view(group_id).await
  }

  /// Every group the employee is involved in, newest report first.
  pub async fn list_groups_for_employee(
    &self,
    employee_id: Uuid,
  ) -> Result<Vec<GroupView>> {
    self.require_employee(employee_id).await?;

    let groups = self
      .store
      .list_groups_for_employee(employee_id)
      .await
      .map_err(Error::store)?;

    let mut views = Vec::with_capacity(groups.len());
    for group in groups {
      views.push(self.assemble(group).await?);
    }
    Ok(views)
  }

  // ── Shared helpers ────────────────────────────────────────────────────────

  pub(crate) async fn load_group(&self, group_id: Uuid) -> Result<IncidentGroup> {
    self
      .store
      .get_group(group_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(Missing::Group(group_id)))
  }

  pub(crate) async fn load_view(&self, group_id: Uuid) -> Result<GroupView> {
    let group = self.load_group(group_id).await?;
    self.assemble(group).await
  }

  async fn assemble(&self, group: IncidentGroup) -> Result<GroupView> {
    let statements = self
      .store
      .list_statements(group.group_id)
      .await
      .map_err(Error::store)?;
    let sanctions = self
      .store
      .list_sanctions_for_group(group.group_id)
      .await
      .map_err(Error::store)?;
    Ok(GroupView::assemble(group, statements, sanctions))
  }

  pub(crate) async fn require_employee(&self, employee_id: Uuid) -> Result<Employee> {
    self
      .store
      .get_employee(employee_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(Missing::Employee(employee_id)))
  }

  /// `InvalidInput` for a known employee outside the group, `NotFound` for an
  /// unknown one.
  pub(crate) async fn require_involved(
    &self,
    group: &IncidentGroup,
    employee_id: Uuid,
  ) -> Result<()> {
    if group.involves(employee_id) {
      return Ok(());
    }
    self.require_employee(employee_id).await?;
    Err(InputError::NotInvolved(employee_id).into())
  }

  /// Validate a report (or a merged correction) against the catalogs and the
  /// employee directory.
  pub(crate) async fn check_incident(&self, input: NewIncident) -> Result<NewIncident> {
    let input = NewIncident {
      observations: validate::normalize_observations(input.observations),
      ..input
    };
    validate::incident_shape(&input, validate::today())?;

    self
      .store
      .get_incident_type(input.incident_type_id)
      .await
      .map_err(Error::store)?
      .ok_or(InputError::UnknownIncidentType(input.incident_type_id))?;

    for &employee_id in &input.involved_employees {
      self.require_employee(employee_id).await?;
    }
    Ok(input)
  }
}

/// Guard shared by every operation that needs the pre-resolution phase.
pub(crate) fn require_open(view: &GroupView) -> Result<()> {
  let group_id = view.group.group_id;
  match view.status {
    GroupStatus::Open => Ok(()),
    GroupStatus::Superseded => {
      debug!(%group_id, "operation on superseded group rejected");
      Err(Error::transition(group_id, Rejection::Superseded))
    }
    status => {
      debug!(%group_id, %status, "operation on resolved group rejected");
      Err(Error::transition(group_id, Rejection::AlreadyResolved(status)))
    }
  }
}

/// Catalog inserts only contend on the name.
fn unique_name<T>(outcome: WriteOutcome<T>, name: String) -> Result<T> {
  match outcome {
    WriteOutcome::Applied(entry) => Ok(entry),
    WriteOutcome::Contended(_) => {
      debug!(%name, "duplicate catalog name rejected");
      Err(InputError::DuplicateName(name).into())
    }
  }
}

pub(crate) fn contended(group_id: Uuid, contention: Contention) -> Error {
  warn!(%group_id, %contention, "lost a concurrent write");
  Error::Conflict { group_id, contention }
}
