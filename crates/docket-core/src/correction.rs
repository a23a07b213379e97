//! Corrections: replacing an unresolved group with an amended successor.
//!
//! The original is never rewritten. A new group is created from the
//! original's fields with the amendment's overrides applied, and the
//! original gains a forward link to it. That link makes the original
//! `SUPERSEDED`. Statements and resolutions stay with the original; the
//! successor starts its own `OPEN` lifecycle.

use tracing::info;
use uuid::Uuid;

use crate::{
  Error, Result, Workflow,
  group::{Amendment, IncidentGroup, NewIncident},
  store::{IncidentStore, WriteOutcome},
  workflow::{contended, require_open},
};

impl Amendment {
  /// The successor's fields: each override if present, else the original's
  /// value.
  pub fn apply_to(self, original: &IncidentGroup) -> NewIncident {
    NewIncident {
      incident_type_id:   self.incident_type_id.unwrap_or(original.incident_type_id),
      occurred_on:        self.occurred_on.unwrap_or(original.occurred_on),
      description:        self
        .description
        .unwrap_or_else(|| original.description.clone()),
      observations:       self.observations.or_else(|| original.observations.clone()),
      involved_employees: self
        .involved_employees
        .unwrap_or_else(|| original.involved_employees.clone()),
    }
  }
}

impl<S: IncidentStore> Workflow<S> {
  /// Supersede an `OPEN` group with an amended copy and return the new
  /// group's id.
  ///
  /// Of two concurrent corrections of the same group exactly one succeeds;
  /// the other fails with [`Error::Conflict`].
  pub async fn create_correction(
    &self,
    original_id: Uuid,
    amendment: Amendment,
  ) -> Result<Uuid> {
    let view = self.load_view(original_id).await?;
    require_open(&view)?;

    let replacement = self.check_incident(amendment.apply_to(&view.group)).await?;

    match self
      .store
      .supersede_group(original_id, replacement)
      .await
      .map_err(Error::store)?
    {
      WriteOutcome::Applied(successor) => {
        info!(
          %original_id,
          successor_id = %successor.group_id,
          "incident corrected"
        );
        Ok(successor.group_id)
      }
      WriteOutcome::Contended(c) => Err(contended(original_id, c)),
    }
  }
}
