//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates are `YYYY-MM-DD`, and
//! UUIDs are hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use docket_core::{
  catalog::{Employee, IncidentType, SanctionType, Severity},
  group::{IncidentGroup, Resolution},
  sanction::SanctionRecord,
  statement::DefenseStatement,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

/// Fixed-width so stored timestamps sort lexically.
pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Severity ─────────────────────────────────────────────────────────────────

pub fn encode_severity(s: Severity) -> String { s.to_string() }

pub fn decode_severity(s: &str) -> Result<Severity> {
  Severity::from_str(s).map_err(|_| Error::Decode {
    column: "severity",
    value:  s.to_owned(),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read from an `incident_groups` row plus its
/// `involved_employees` rows.
pub struct RawGroup {
  pub group_id:               String,
  pub incident_type_id:       String,
  pub occurred_on:            String,
  pub description:            String,
  pub observations:           Option<String>,
  pub reported_at:            String,
  pub predecessor_group_id:   Option<String>,
  pub successor_group_id:     Option<String>,
  pub resolution_description: Option<String>,
  pub resolution_recorded_at: Option<String>,
  pub involved_employees:     Vec<String>,
}

impl RawGroup {
  /// Column list matching [`RawGroup::from_row`].
  pub const COLUMNS: &'static str = "group_id, incident_type_id, occurred_on, \
     description, observations, reported_at, predecessor_group_id, \
     successor_group_id, resolution_description, resolution_recorded_at";

  /// Encode a group for insertion.
  pub fn from_group(g: &IncidentGroup) -> Self {
    let resolution = g.resolution.as_ref();
    Self {
      group_id:               encode_uuid(g.group_id),
      incident_type_id:       encode_uuid(g.incident_type_id),
      occurred_on:            encode_date(g.occurred_on),
      description:            g.description.clone(),
      observations:           g.observations.clone(),
      reported_at:            encode_dt(g.reported_at),
      predecessor_group_id:   g.predecessor_group_id.map(encode_uuid),
      successor_group_id:     g.successor_group_id.map(encode_uuid),
      resolution_description: resolution.map(|r| r.description.clone()),
      resolution_recorded_at: resolution.map(|r| encode_dt(r.recorded_at)),
      involved_employees:     g.involved_employees.iter().copied().map(encode_uuid).collect(),
    }
  }

  /// Read the group columns; `involved_employees` is filled in separately.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      group_id:               row.get(0)?,
      incident_type_id:       row.get(1)?,
      occurred_on:            row.get(2)?,
      description:            row.get(3)?,
      observations:           row.get(4)?,
      reported_at:            row.get(5)?,
      predecessor_group_id:   row.get(6)?,
      successor_group_id:     row.get(7)?,
      resolution_description: row.get(8)?,
      resolution_recorded_at: row.get(9)?,
      involved_employees:     Vec::new(),
    })
  }

  pub fn into_group(self) -> Result<IncidentGroup> {
    let resolution = match (self.resolution_description, self.resolution_recorded_at) {
      (Some(description), Some(at)) => Some(Resolution {
        description,
        recorded_at: decode_dt(&at)?,
      }),
      _ => None,
    };

    Ok(IncidentGroup {
      group_id: decode_uuid(&self.group_id)?,
      incident_type_id: decode_uuid(&self.incident_type_id)?,
      occurred_on: decode_date(&self.occurred_on)?,
      description: self.description,
      observations: self.observations,
      involved_employees: self
        .involved_employees
        .iter()
        .map(String::as_str)
        .map(decode_uuid)
        .collect::<Result<_>>()?,
      reported_at: decode_dt(&self.reported_at)?,
      predecessor_group_id: decode_opt_uuid(self.predecessor_group_id)?,
      successor_group_id: decode_opt_uuid(self.successor_group_id)?,
      resolution,
    })
  }
}

/// Raw strings read from a `defense_statements` row.
pub struct RawStatement {
  pub statement_id:       String,
  pub group_id:           String,
  pub author_employee_id: String,
  pub content:            String,
  pub attachment_ref:     Option<String>,
  pub submitted_at:       String,
}

impl RawStatement {
  pub const COLUMNS: &'static str = "statement_id, group_id, author_employee_id, \
     content, attachment_ref, submitted_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      statement_id:       row.get(0)?,
      group_id:           row.get(1)?,
      author_employee_id: row.get(2)?,
      content:            row.get(3)?,
      attachment_ref:     row.get(4)?,
      submitted_at:       row.get(5)?,
    })
  }

  pub fn into_statement(self) -> Result<DefenseStatement> {
    Ok(DefenseStatement {
      statement_id:       decode_uuid(&self.statement_id)?,
      group_id:           decode_uuid(&self.group_id)?,
      author_employee_id: decode_uuid(&self.author_employee_id)?,
      content:            self.content,
      attachment_ref:     self.attachment_ref,
      submitted_at:       decode_dt(&self.submitted_at)?,
    })
  }
}

/// Raw strings read from a `sanctions` row.
pub struct RawSanction {
  pub sanction_id:      String,
  pub employee_id:      String,
  pub sanction_type_id: String,
  pub reason:           String,
  pub start_date:       String,
  pub end_date:         Option<String>,
  pub source_group_id:  Option<String>,
  pub recorded_at:      String,
}

impl RawSanction {
  pub const COLUMNS: &'static str = "sanction_id, employee_id, sanction_type_id, \
     reason, start_date, end_date, source_group_id, recorded_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      sanction_id:      row.get(0)?,
      employee_id:      row.get(1)?,
      sanction_type_id: row.get(2)?,
      reason:           row.get(3)?,
      start_date:       row.get(4)?,
      end_date:         row.get(5)?,
      source_group_id:  row.get(6)?,
      recorded_at:      row.get(7)?,
    })
  }

  pub fn into_sanction(self) -> Result<SanctionRecord> {
    Ok(SanctionRecord {
      sanction_id:      decode_uuid(&self.sanction_id)?,
      employee_id:      decode_uuid(&self.employee_id)?,
      sanction_type_id: decode_uuid(&self.sanction_type_id)?,
      reason:           self.reason,
      start_date:       decode_date(&self.start_date)?,
      end_date:         self.end_date.as_deref().map(decode_date).transpose()?,
      source_group_id:  decode_opt_uuid(self.source_group_id)?,
      recorded_at:      decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw strings read from an `employees` row.
pub struct RawEmployee {
  pub employee_id: String,
  pub full_name:   String,
  pub created_at:  String,
}

impl RawEmployee {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      employee_id: row.get(0)?,
      full_name:   row.get(1)?,
      created_at:  row.get(2)?,
    })
  }

  pub fn into_employee(self) -> Result<Employee> {
    Ok(Employee {
      employee_id: decode_uuid(&self.employee_id)?,
      full_name:   self.full_name,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read from an `incident_types` row.
pub struct RawIncidentType {
  pub incident_type_id: String,
  pub name:             String,
}

impl RawIncidentType {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { incident_type_id: row.get(0)?, name: row.get(1)? })
  }

  pub fn into_incident_type(self) -> Result<IncidentType> {
    Ok(IncidentType {
      incident_type_id: decode_uuid(&self.incident_type_id)?,
      name:             self.name,
    })
  }
}

/// Raw strings read from a `sanction_types` row.
pub struct RawSanctionType {
  pub sanction_type_id: String,
  pub name:             String,
  pub severity:         String,
}

impl RawSanctionType {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      sanction_type_id: row.get(0)?,
      name:             row.get(1)?,
      severity:         row.get(2)?,
    })
  }

  pub fn into_sanction_type(self) -> Result<SanctionType> {
    Ok(SanctionType {
      sanction_type_id: decode_uuid(&self.sanction_type_id)?,
      name:             self.name,
      severity:         decode_severity(&self.severity)?,
    })
  }
}
