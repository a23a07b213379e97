//! Defense statements: an involved employee's account, submitted before
//! the group is resolved. At most one per employee per group.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefenseStatement {
  pub statement_id:       Uuid,
  pub group_id:           Uuid,
  pub author_employee_id: Uuid,
  pub content:            String,
  /// Opaque reference to an uploaded file held by the document store.
  pub attachment_ref:     Option<String>,
  pub submitted_at:       DateTime<Utc>,
}

/// Input to [`crate::Workflow::submit_defense_statement`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDefenseStatement {
  pub group_id:           Uuid,
  pub author_employee_id: Uuid,
  pub content:            String,
  #[serde(default)]
  pub attachment_ref:     Option<String>,
}
