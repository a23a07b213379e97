//! Sanction application: drives the "sanction every involved employee" phase
//! that follows a resolution, plus sanctions issued outside any incident.
//!
//! A group closes as a pure consequence of its last involved employee being
//! sanctioned. There is no explicit close operation.

use std::collections::BTreeSet;

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Error, Result, Workflow,
  error::{InputError, Rejection},
  sanction::{SanctionRecord, SanctionTerms},
  status::{GroupStatus, sanctioned_employees},
  store::{IncidentStore, WriteOutcome},
  validate,
};

impl<S: IncidentStore> Workflow<S> {
  /// Apply a sanction to one involved employee of a resolved group and
  /// return the new sanction record's id.
  ///
  /// Order-independent across employees. Re-applying to an employee who
  /// already holds a sanction from this group is rejected rather than
  /// duplicated.
  pub async fn apply_sanction(
    &self,
    group_id: Uuid,
    terms: SanctionTerms,
  ) -> Result<Uuid> {
    self.check_terms(&terms).await?;

    let employee_id = terms.employee_id;
    let view = self.load_view(group_id).await?;

    match view.status {
      GroupStatus::Superseded => {
        return Err(Error::transition(group_id, Rejection::Superseded));
      }
      GroupStatus::Open => {
        return Err(Error::transition(group_id, Rejection::NotResolved));
      }
      GroupStatus::AwaitingSanctions | GroupStatus::Closed => {}
    }
    self.require_involved(&view.group, employee_id).await?;
    if !view.remaining_employees.contains(&employee_id) {
      debug!(%group_id, %employee_id, "repeat sanction rejected");
      return Err(Error::transition(
        group_id,
        Rejection::AlreadySanctioned(employee_id),
      ));
    }

    let record = match self
      .store
      .add_group_sanction(group_id, terms)
      .await
      .map_err(Error::store)?
    {
      WriteOutcome::Applied(record) => record,
      WriteOutcome::Contended(c) => {
        return Err(crate::workflow::contended(group_id, c));
      }
    };

    let remaining = view.remaining_employees.len() - 1;
    info!(%group_id, %employee_id, remaining, "sanction applied");
    if remaining == 0 {
      // Status after the write, read back from the store.
      let after = self.load_view(group_id).await?;
      if after.status == GroupStatus::Closed {
        info!(%group_id, "incident closed");
      }
    }
    Ok(record.sanction_id)
  }

  /// Record a sanction that does not originate from an incident group.
  /// Never affects any group's status.
  pub async fn issue_sanction(&self, terms: SanctionTerms) -> Result<Uuid> {
    self.check_terms(&terms).await?;
    self.require_employee(terms.employee_id).await?;

    let employee_id = terms.employee_id;
    let record = self
      .store
      .add_direct_sanction(terms)
      .await
      .map_err(Error::store)?;
    info!(%employee_id, sanction_id = %record.sanction_id, "direct sanction issued");
    Ok(record.sanction_id)
  }

  /// Involved employees that still need a sanction from this group.
  pub async fn remaining_employees(&self, group_id: Uuid) -> Result<BTreeSet<Uuid>> {
    let group = self.load_group(group_id).await?;
    let sanctions = self
      .store
      .list_sanctions_for_group(group_id)
      .await
      .map_err(Error::store)?;
    let sanctioned = sanctioned_employees(group_id, &sanctions);
    Ok(crate::status::remaining_employees(&group, &sanctioned))
  }

  /// `true` once the group is resolved and nobody remains unsanctioned.
  pub async fn can_finalize(&self, group_id: Uuid) -> Result<bool> {
    Ok(self.load_view(group_id).await?.can_finalize())
  }

  /// Every sanction an employee holds, oldest first.
  pub async fn list_sanctions_for_employee(
    &self,
    employee_id: Uuid,
  ) -> Result<Vec<SanctionRecord>> {
    self.require_employee(employee_id).await?;
    self
      .store
      .list_sanctions_for_employee(employee_id)
      .await
      .map_err(Error::store)
  }

  async fn check_terms(&self, terms: &SanctionTerms) -> Result<()> {
    validate::sanction_shape(terms)?;
    self
      .store
      .get_sanction_type(terms.sanction_type_id)
      .await
      .map_err(Error::store)?
      .ok_or(InputError::UnknownSanctionType(terms.sanction_type_id))?;
    Ok(())
  }
}
