//! Reference data the workflow reads but never changes: the employee
//! directory and the incident and sanction catalogs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An employee as known to the HR record store. Only identity lives here;
/// the rest of the employee record belongs to other systems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
  pub employee_id: Uuid,
  pub full_name:   String,
  pub created_at:  DateTime<Utc>,
}

/// A category of workplace incident (e.g. "late arrival", "safety breach").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentType {
  pub incident_type_id: Uuid,
  pub name:             String,
}

/// How heavy a sanction is.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
  Mild,
  Moderate,
  Severe,
}

/// An entry in the sanction catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanctionType {
  pub sanction_type_id: Uuid,
  pub name:             String,
  pub severity:         Severity,
}
