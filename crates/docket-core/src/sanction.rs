//! Sanction records.
//!
//! A sanction links a catalog sanction type to an employee. Sanctions that
//! come out of the incident workflow carry the originating group in
//! `source_group_id`; sanctions issued directly leave it empty.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanctionRecord {
  pub sanction_id:      Uuid,
  pub employee_id:      Uuid,
  pub sanction_type_id: Uuid,
  pub reason:           String,
  pub start_date:       NaiveDate,
  /// Open-ended when `None`; otherwise on or after `start_date`.
  pub end_date:         Option<NaiveDate>,
  pub source_group_id:  Option<Uuid>,
  pub recorded_at:      DateTime<Utc>,
}

/// What to apply to one employee: the caller-supplied part of a sanction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanctionTerms {
  pub employee_id:      Uuid,
  pub sanction_type_id: Uuid,
  pub reason:           String,
  pub start_date:       NaiveDate,
  #[serde(default)]
  pub end_date:         Option<NaiveDate>,
}
