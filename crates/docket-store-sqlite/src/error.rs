//! Error type for `docket-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value outside its enum (e.g. an unknown severity).
  #[error("unknown {column} value: {value:?}")]
  Decode { column: &'static str, value: String },

  /// A write with no precondition reported one.
  #[error("unexpected contention: {0}")]
  UnexpectedContention(docket_core::store::Contention),

  /// A conditional write named a group that does not exist.
  #[error("incident group not found: {0}")]
  GroupNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
