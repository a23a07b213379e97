//! Error types for `docket-core`.
//!
//! Every failure the engine reports falls into one of four caller-facing
//! categories (see [`ErrorKind`]). None of them is fatal to the engine; the
//! caller corrects its input or re-reads state and decides what to do next.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{status::GroupStatus, store::Contention};

/// A required field is missing or malformed, or a reference points at
/// something the workflow does not accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
  #[error("{0} must not be empty")]
  EmptyField(&'static str),

  #[error("an incident must involve at least one employee")]
  NoInvolvedEmployees,

  #[error("occurrence date {0} is in the future")]
  FutureOccurrence(NaiveDate),

  #[error("unknown incident type: {0}")]
  UnknownIncidentType(Uuid),

  #[error("unknown sanction type: {0}")]
  UnknownSanctionType(Uuid),

  #[error("employee {0} is not involved in this incident")]
  NotInvolved(Uuid),

  #[error("sanction ends ({end}) before it starts ({start})")]
  EndBeforeStart { start: NaiveDate, end: NaiveDate },

  #[error("date {0} is outside the years 1 through 9999")]
  DateOutOfRange(NaiveDate),

  #[error("the name {0:?} is already in use")]
  DuplicateName(String),
}

/// Why an operation is not allowed in the group's current derived status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
  #[error("the group has been superseded by a correction")]
  Superseded,

  #[error("a resolution has already been recorded (status {0})")]
  AlreadyResolved(GroupStatus),

  #[error("no resolution has been recorded yet")]
  NotResolved,

  #[error("employee {0} has already submitted a defense statement")]
  StatementExists(Uuid),

  #[error("employee {0} has already been sanctioned for this incident")]
  AlreadySanctioned(Uuid),
}

/// A reference the caller supplied that the store does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Missing {
  #[error("incident group {0}")]
  Group(Uuid),

  #[error("employee {0}")]
  Employee(Uuid),
}

/// The caller-facing category of an [`Error`].
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
  InvalidInput,
  InvalidTransition,
  Conflict,
  NotFound,
  Internal,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid input: {0}")]
  InvalidInput(#[from] InputError),

  #[error("invalid transition on incident group {group_id}: {rejection}")]
  InvalidTransition { group_id: Uuid, rejection: Rejection },

  /// A concurrent writer changed the group between our read and our write.
  /// Re-read the group before deciding whether to retry.
  #[error("conflict on incident group {group_id}: {contention}")]
  Conflict { group_id: Uuid, contention: Contention },

  #[error("not found: {0}")]
  NotFound(#[from] Missing),

  /// A chain link points at a group that does not exist, or loops back on
  /// itself.
  #[error("correction chain is broken at incident group {0}")]
  BrokenChain(Uuid),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::InvalidInput(_) => ErrorKind::InvalidInput,
      Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
      Self::Conflict { .. } => ErrorKind::Conflict,
      Self::NotFound(_) => ErrorKind::NotFound,
      Self::BrokenChain(_) | Self::Store(_) => ErrorKind::Internal,
    }
  }

  pub(crate) fn transition(group_id: Uuid, rejection: Rejection) -> Self {
    Self::InvalidTransition { group_id, rejection }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
