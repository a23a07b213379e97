//! Incident groups: the unit of work of the resolution workflow.
//!
//! A group's core fields are written once, when it is reported (or created
//! as a correction), and never rewritten. The only later writes are the
//! one-time resolution and the one-time forward link to a successor.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Resolution ──────────────────────────────────────────────────────────────

/// The decision that ends fact-finding. Written at most once per group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
  pub description: String,
  /// Server-assigned.
  pub recorded_at: DateTime<Utc>,
}

// ─── IncidentGroup ───────────────────────────────────────────────────────────

/// One reported workplace incident and the employees involved in it.
///
/// There is no status field: see [`crate::status::GroupStatus::derive`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentGroup {
  pub group_id:             Uuid,
  pub incident_type_id:     Uuid,
  /// Calendar date the incident happened on.
  pub occurred_on:          NaiveDate,
  pub description:          String,
  pub observations:         Option<String>,
  /// Immutable once a resolution exists.
  pub involved_employees:   BTreeSet<Uuid>,
  /// Server-assigned timestamp of the report (or correction).
  pub reported_at:          DateTime<Utc>,
  /// The group this one amends; `None` for an original report.
  pub predecessor_group_id: Option<Uuid>,
  /// Set once, when a correction of this group is created.
  pub successor_group_id:   Option<Uuid>,
  pub resolution:           Option<Resolution>,
}

impl IncidentGroup {
  pub fn is_superseded(&self) -> bool { self.successor_group_id.is_some() }

  pub fn is_resolved(&self) -> bool { self.resolution.is_some() }

  pub fn involves(&self, employee_id: Uuid) -> bool {
    self.involved_employees.contains(&employee_id)
  }
}

// ─── NewIncident ─────────────────────────────────────────────────────────────

/// Input to [`crate::Workflow::report_incident`], and the validated payload
/// handed to the store for both reports and corrections.
///
/// `group_id` and `reported_at` are always assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIncident {
  pub incident_type_id:   Uuid,
  pub occurred_on:        NaiveDate,
  pub description:        String,
  #[serde(default)]
  pub observations:       Option<String>,
  pub involved_employees: BTreeSet<Uuid>,
}

// ─── Amendment ───────────────────────────────────────────────────────────────

/// The fields a correction overrides. Every field is optional; omitted
/// fields are inherited from the group being corrected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amendment {
  #[serde(default)]
  pub incident_type_id:   Option<Uuid>,
  #[serde(default)]
  pub occurred_on:        Option<NaiveDate>,
  #[serde(default)]
  pub description:        Option<String>,
  #[serde(default)]
  pub observations:       Option<String>,
  #[serde(default)]
  pub involved_employees: Option<BTreeSet<Uuid>>,
}
