//! Derived group status and the read model built around it.
//!
//! Status is never persisted. It is computed from the facts every time a
//! group is read, so it cannot drift from them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  group::IncidentGroup, sanction::SanctionRecord, statement::DefenseStatement,
};

// ─── GroupStatus ─────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupStatus {
  /// Reported; statements may be submitted and a resolution recorded.
  Open,
  /// Resolved; some involved employees are still unsanctioned.
  AwaitingSanctions,
  /// Resolved and every involved employee sanctioned.
  Closed,
  /// A correction has replaced this group. Read-only.
  Superseded,
}

impl GroupStatus {
  /// Compute the status of `group` given the set of employees that already
  /// hold a sanction sourced from it.
  ///
  /// Supersession wins over everything else.
  pub fn derive(group: &IncidentGroup, sanctioned: &BTreeSet<Uuid>) -> Self {
    if group.is_superseded() {
      Self::Superseded
    } else if !group.is_resolved() {
      Self::Open
    } else if remaining_employees(group, sanctioned).is_empty() {
      Self::Closed
    } else {
      Self::AwaitingSanctions
    }
  }
}

/// Involved employees that do not yet hold a sanction from this group.
pub fn remaining_employees(
  group: &IncidentGroup,
  sanctioned: &BTreeSet<Uuid>,
) -> BTreeSet<Uuid> {
  group
    .involved_employees
    .difference(sanctioned)
    .copied()
    .collect()
}

/// Employees holding a sanction whose source is `group_id`.
pub fn sanctioned_employees<'a>(
  group_id: Uuid,
  sanctions: impl IntoIterator<Item = &'a SanctionRecord>,
) -> BTreeSet<Uuid> {
  sanctions
    .into_iter()
    .filter(|s| s.source_group_id == Some(group_id))
    .map(|s| s.employee_id)
    .collect()
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// A group bundled with everything attached to it and its derived status.
/// Never stored, always assembled on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupView {
  pub group:               IncidentGroup,
  pub status:              GroupStatus,
  pub remaining_employees: BTreeSet<Uuid>,
  pub statements:          Vec<DefenseStatement>,
  /// Sanctions sourced from this group.
  pub sanctions:           Vec<SanctionRecord>,
}

impl GroupView {
  pub fn assemble(
    group: IncidentGroup,
    statements: Vec<DefenseStatement>,
    sanctions: Vec<SanctionRecord>,
  ) -> Self {
    let sanctioned = sanctioned_employees(group.group_id, &sanctions);
    let status = GroupStatus::derive(&group, &sanctioned);
    let remaining_employees = remaining_employees(&group, &sanctioned);
    Self { group, status, remaining_employees, statements, sanctions }
  }

  pub fn can_finalize(&self) -> bool {
    self.group.is_resolved() && self.remaining_employees.is_empty()
  }
}
