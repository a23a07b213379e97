//! [`SqliteStore`]: the SQLite implementation of [`IncidentStore`].

use std::path::Path;

use chrono::{DateTime, SubsecRound as _, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use tracing::debug;
use uuid::Uuid;

use docket_core::{
  catalog::{Employee, IncidentType, SanctionType, Severity},
  group::{IncidentGroup, NewIncident, Resolution},
  sanction::{SanctionRecord, SanctionTerms},
  statement::{DefenseStatement, NewDefenseStatement},
  store::{Contention, IncidentStore, WriteOutcome},
};

use crate::{
  Error, Result,
  encode::{
    RawEmployee, RawGroup, RawIncidentType, RawSanction, RawSanctionType,
    RawStatement, encode_date, encode_dt, encode_severity, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Docket incident store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert a sanction row, optionally guarded by its source group's state.
  async fn insert_sanction(
    &self,
    record: &SanctionRecord,
  ) -> Result<WriteOutcome<()>> {
    let id_str       = encode_uuid(record.sanction_id);
    let employee_str = encode_uuid(record.employee_id);
    let type_str     = encode_uuid(record.sanction_type_id);
    let reason       = record.reason.clone();
    let start_str    = encode_date(record.start_date);
    let end_str      = record.end_date.map(encode_date);
    let source_str   = record.source_group_id.map(encode_uuid);
    let at_str       = encode_dt(record.recorded_at);

    let guarded = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(source) = &source_str {
          match group_state(&tx, source)? {
            None => return Ok(Guarded::Missing),
            Some(state) => {
              if let Some(c) = state.unless_resolved() {
                return Ok(Guarded::Contended(c));
              }
            }
          }
        }

        let inserted = tx.execute(
          "INSERT INTO sanctions (
             sanction_id, employee_id, sanction_type_id, reason,
             start_date, end_date, source_group_id, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            employee_str,
            type_str,
            reason,
            start_str,
            end_str,
            source_str,
            at_str,
          ],
        );
        match inserted {
          Ok(_) => {}
          Err(e) if is_unique_violation(&e) => {
            return Ok(Guarded::Contended(Contention::AlreadySanctioned));
          }
          Err(e) => return Err(e.into()),
        }

        tx.commit()?;
        Ok(Guarded::Done(()))
      })
      .await?;

    guarded.into_outcome(record.source_group_id.unwrap_or_default())
  }
}

// ─── Transaction helpers ─────────────────────────────────────────────────────

/// Server-assigned timestamps are truncated to the stored precision so a
/// returned record equals the one read back later.
fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

/// What a transaction closure found: the write happened, a precondition no
/// longer held, or the group it guards on does not exist.
enum Guarded<T> {
  Done(T),
  Contended(Contention),
  Missing,
}

impl<T> Guarded<T> {
  fn into_outcome(self, group_id: Uuid) -> Result<WriteOutcome<T>> {
    match self {
      Guarded::Done(v) => Ok(WriteOutcome::Applied(v)),
      Guarded::Contended(c) => {
        debug!(%group_id, contention = %c, "conditional write rejected");
        Ok(WriteOutcome::Contended(c))
      }
      Guarded::Missing => Err(Error::GroupNotFound(group_id)),
    }
  }
}

/// The two facts that decide whether a group still accepts writes.
struct GroupState {
  resolved:   bool,
  superseded: bool,
}

impl GroupState {
  /// Blocks writes that need an unresolved, unsuperseded group.
  fn unless_open(&self) -> Option<Contention> {
    if self.superseded {
      Some(Contention::Superseded)
    } else if self.resolved {
      Some(Contention::Resolved)
    } else {
      None
    }
  }

  /// Blocks writes that need a resolved, unsuperseded group.
  fn unless_resolved(&self) -> Option<Contention> {
    if self.superseded {
      Some(Contention::Superseded)
    } else if !self.resolved {
      Some(Contention::Unresolved)
    } else {
      None
    }
  }
}

fn group_state(
  conn: &rusqlite::Connection,
  group_id: &str,
) -> rusqlite::Result<Option<GroupState>> {
  conn
    .query_row(
      "SELECT resolution_description IS NOT NULL, successor_group_id IS NOT NULL
       FROM incident_groups WHERE group_id = ?1",
      rusqlite::params![group_id],
      |row| {
        Ok(GroupState { resolved: row.get(0)?, superseded: row.get(1)? })
      },
    )
    .optional()
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
  )
}

/// Insert a catalog row. `false` when the UNIQUE name is already taken.
fn insert_named(
  conn: &rusqlite::Connection,
  sql: &str,
  params: &[&dyn rusqlite::ToSql],
) -> rusqlite::Result<bool> {
  match conn.execute(sql, params) {
    Ok(_) => Ok(true),
    Err(e) if is_unique_violation(&e) => Ok(false),
    Err(e) => Err(e),
  }
}

fn named_outcome<T>(inserted: bool, entry: T) -> WriteOutcome<T> {
  if inserted {
    WriteOutcome::Applied(entry)
  } else {
    debug!(contention = %Contention::NameTaken, "catalog insert rejected");
    WriteOutcome::Contended(Contention::NameTaken)
  }
}

fn insert_group_row(conn: &rusqlite::Connection, raw: &RawGroup) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO incident_groups (
       group_id, incident_type_id, occurred_on, description, observations,
       reported_at, predecessor_group_id, successor_group_id,
       resolution_description, resolution_recorded_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    rusqlite::params![
      raw.group_id,
      raw.incident_type_id,
      raw.occurred_on,
      raw.description,
      raw.observations,
      raw.reported_at,
      raw.predecessor_group_id,
      raw.successor_group_id,
      raw.resolution_description,
      raw.resolution_recorded_at,
    ],
  )?;

  let mut stmt = conn.prepare(
    "INSERT INTO involved_employees (group_id, employee_id) VALUES (?1, ?2)",
  )?;
  for employee_id in &raw.involved_employees {
    stmt.execute(rusqlite::params![raw.group_id, employee_id])?;
  }
  Ok(())
}

fn select_group(
  conn: &rusqlite::Connection,
  group_id: &str,
) -> rusqlite::Result<Option<RawGroup>> {
  let sql = format!(
    "SELECT {} FROM incident_groups WHERE group_id = ?1",
    RawGroup::COLUMNS
  );
  let Some(mut raw) = conn
    .query_row(&sql, rusqlite::params![group_id], RawGroup::from_row)
    .optional()?
  else {
    return Ok(None);
  };

  let mut stmt = conn.prepare(
    "SELECT employee_id FROM involved_employees WHERE group_id = ?1
     ORDER BY employee_id",
  )?;
  raw.involved_employees = stmt
    .query_map(rusqlite::params![group_id], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;

  Ok(Some(raw))
}

/// A group freshly built from validated input; nothing is persisted yet.
fn new_group(input: NewIncident, predecessor: Option<Uuid>) -> IncidentGroup {
  IncidentGroup {
    group_id:             Uuid::new_v4(),
    incident_type_id:     input.incident_type_id,
    occurred_on:          input.occurred_on,
    description:          input.description,
    observations:         input.observations,
    involved_employees:   input.involved_employees,
    reported_at:          now(),
    predecessor_group_id: predecessor,
    successor_group_id:   None,
    resolution:           None,
  }
}

// ─── IncidentStore impl ──────────────────────────────────────────────────────

impl IncidentStore for SqliteStore {
  type Error = Error;

  // ── Directory & catalogs ──────────────────────────────────────────────────

  async fn add_employee(&self, full_name: String) -> Result<Employee> {
    let employee = Employee {
      employee_id: Uuid::new_v4(),
      full_name,
      created_at:  now(),
    };

    let id_str = encode_uuid(employee.employee_id);
    let name   = employee.full_name.clone();
    let at_str = encode_dt(employee.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO employees (employee_id, full_name, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(employee)
  }

  async fn get_employee(&self, id: Uuid) -> Result<Option<Employee>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawEmployee> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT employee_id, full_name, created_at FROM employees
               WHERE employee_id = ?1",
              rusqlite::params![id_str],
              RawEmployee::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEmployee::into_employee).transpose()
  }

  async fn list_employees(&self) -> Result<Vec<Employee>> {
    let raws: Vec<RawEmployee> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT employee_id, full_name, created_at FROM employees
           ORDER BY full_name, employee_id",
        )?;
        let rows = stmt
          .query_map([], RawEmployee::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEmployee::into_employee).collect()
  }

  async fn add_incident_type(
    &self,
    name: String,
  ) -> Result<WriteOutcome<IncidentType>> {
    let incident_type = IncidentType { incident_type_id: Uuid::new_v4(), name };

    let id_str = encode_uuid(incident_type.incident_type_id);
    let name   = incident_type.name.clone();

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(insert_named(
          conn,
          "INSERT INTO incident_types (incident_type_id, name) VALUES (?1, ?2)",
          rusqlite::params![id_str, name],
        )?)
      })
      .await?;

    Ok(named_outcome(inserted, incident_type))
  }

  async fn get_incident_type(&self, id: Uuid) -> Result<Option<IncidentType>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawIncidentType> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT incident_type_id, name FROM incident_types
               WHERE incident_type_id = ?1",
              rusqlite::params![id_str],
              RawIncidentType::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawIncidentType::into_incident_type).transpose()
  }

  async fn list_incident_types(&self) -> Result<Vec<IncidentType>> {
    let raws: Vec<RawIncidentType> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare("SELECT incident_type_id, name FROM incident_types ORDER BY name")?;
        let rows = stmt
          .query_map([], RawIncidentType::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawIncidentType::into_incident_type).collect()
  }

  async fn add_sanction_type(
    &self,
    name:     String,
    severity: Severity,
  ) -> Result<WriteOutcome<SanctionType>> {
    let sanction_type = SanctionType {
      sanction_type_id: Uuid::new_v4(),
      name,
      severity,
    };

    let id_str       = encode_uuid(sanction_type.sanction_type_id);
    let name         = sanction_type.name.clone();
    let severity_str = encode_severity(severity);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(insert_named(
          conn,
          "INSERT INTO sanction_types (sanction_type_id, name, severity)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name, severity_str],
        )?)
      })
      .await?;

    Ok(named_outcome(inserted, sanction_type))
  }

  async fn get_sanction_type(&self, id: Uuid) -> Result<Option<SanctionType>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSanctionType> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT sanction_type_id, name, severity FROM sanction_types
               WHERE sanction_type_id = ?1",
              rusqlite::params![id_str],
              RawSanctionType::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSanctionType::into_sanction_type).transpose()
  }

  async fn list_sanction_types(&self) -> Result<Vec<SanctionType>> {
    let raws: Vec<RawSanctionType> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT sanction_type_id, name, severity FROM sanction_types ORDER BY name",
        )?;
        let rows = stmt
          .query_map([], RawSanctionType::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSanctionType::into_sanction_type).collect()
  }

  // ── Groups ────────────────────────────────────────────────────────────────

  async fn insert_group(&self, input: NewIncident) -> Result<IncidentGroup> {
    let group = new_group(input, None);
    let raw   = RawGroup::from_group(&group);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        insert_group_row(&tx, &raw)?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(group)
  }

  async fn supersede_group(
    &self,
    original_id: Uuid,
    replacement: NewIncident,
  ) -> Result<WriteOutcome<IncidentGroup>> {
    let successor    = new_group(replacement, Some(original_id));
    let raw          = RawGroup::from_group(&successor);
    let original_str = encode_uuid(original_id);

    let guarded = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        match group_state(&tx, &original_str)? {
          None => return Ok(Guarded::Missing),
          Some(state) => {
            if let Some(c) = state.unless_open() {
              return Ok(Guarded::Contended(c));
            }
          }
        }

        // The successor row goes in first so the forward link below can
        // reference it. UNIQUE(predecessor_group_id) also rejects a second
        // successor.
        match insert_group_row(&tx, &raw) {
          Ok(()) => {}
          Err(e) if is_unique_violation(&e) => {
            return Ok(Guarded::Contended(Contention::Superseded));
          }
          Err(e) => return Err(e.into()),
        }

        let linked = tx.execute(
          "UPDATE incident_groups SET successor_group_id = ?1
           WHERE group_id = ?2
             AND successor_group_id IS NULL
             AND resolution_description IS NULL",
          rusqlite::params![raw.group_id, original_str],
        )?;
        if linked != 1 {
          return Ok(Guarded::Contended(Contention::Superseded));
        }

        tx.commit()?;
        Ok(Guarded::Done(()))
      })
      .await?;

    Ok(guarded.into_outcome(original_id)?.map(|()| successor))
  }

  async fn get_group(&self, id: Uuid) -> Result<Option<IncidentGroup>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawGroup> = self
      .conn
      .call(move |conn| Ok(select_group(conn, &id_str)?))
      .await?;

    raw.map(RawGroup::into_group).transpose()
  }

  async fn list_groups_for_employee(
    &self,
    employee_id: Uuid,
  ) -> Result<Vec<IncidentGroup>> {
    let employee_str = encode_uuid(employee_id);

    let raws: Vec<RawGroup> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT g.group_id
           FROM involved_employees ie
           JOIN incident_groups g ON g.group_id = ie.group_id
           WHERE ie.employee_id = ?1
           ORDER BY g.reported_at DESC, g.rowid DESC",
        )?;
        let ids = stmt
          .query_map(rusqlite::params![employee_str], |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut groups = Vec::with_capacity(ids.len());
        for id in ids {
          if let Some(raw) = select_group(conn, &id)? {
            groups.push(raw);
          }
        }
        Ok(groups)
      })
      .await?;

    raws.into_iter().map(RawGroup::into_group).collect()
  }

  async fn record_resolution(
    &self,
    group_id:    Uuid,
    description: String,
  ) -> Result<WriteOutcome<Resolution>> {
    let resolution = Resolution { description, recorded_at: now() };

    let id_str      = encode_uuid(group_id);
    let description = resolution.description.clone();
    let at_str      = encode_dt(resolution.recorded_at);

    let guarded = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        match group_state(&tx, &id_str)? {
          None => return Ok(Guarded::Missing),
          Some(state) => {
            if let Some(c) = state.unless_open() {
              return Ok(Guarded::Contended(c));
            }
          }
        }

        let written = tx.execute(
          "UPDATE incident_groups
           SET resolution_description = ?1, resolution_recorded_at = ?2
           WHERE group_id = ?3
             AND resolution_description IS NULL
             AND successor_group_id IS NULL",
          rusqlite::params![description, at_str, id_str],
        )?;
        if written != 1 {
          return Ok(Guarded::Contended(Contention::Resolved));
        }

        tx.commit()?;
        Ok(Guarded::Done(()))
      })
      .await?;

    Ok(guarded.into_outcome(group_id)?.map(|()| resolution))
  }

  // ── Statements ────────────────────────────────────────────────────────────

  async fn add_statement(
    &self,
    input: NewDefenseStatement,
  ) -> Result<WriteOutcome<DefenseStatement>> {
    let statement = DefenseStatement {
      statement_id:       Uuid::new_v4(),
      group_id:           input.group_id,
      author_employee_id: input.author_employee_id,
      content:            input.content,
      attachment_ref:     input.attachment_ref,
      submitted_at:       now(),
    };

    let id_str     = encode_uuid(statement.statement_id);
    let group_str  = encode_uuid(statement.group_id);
    let author_str = encode_uuid(statement.author_employee_id);
    let content    = statement.content.clone();
    let attachment = statement.attachment_ref.clone();
    let at_str     = encode_dt(statement.submitted_at);

    let guarded = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        match group_state(&tx, &group_str)? {
          None => return Ok(Guarded::Missing),
          Some(state) => {
            if let Some(c) = state.unless_open() {
              return Ok(Guarded::Contended(c));
            }
          }
        }

        let inserted = tx.execute(
          "INSERT INTO defense_statements (
             statement_id, group_id, author_employee_id,
             content, attachment_ref, submitted_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, group_str, author_str, content, attachment, at_str],
        );
        match inserted {
          Ok(_) => {}
          Err(e) if is_unique_violation(&e) => {
            return Ok(Guarded::Contended(Contention::StatementExists));
          }
          Err(e) => return Err(e.into()),
        }

        tx.commit()?;
        Ok(Guarded::Done(()))
      })
      .await?;

    Ok(guarded.into_outcome(statement.group_id)?.map(|()| statement))
  }

  async fn list_statements(&self, group_id: Uuid) -> Result<Vec<DefenseStatement>> {
    let group_str = encode_uuid(group_id);

    let raws: Vec<RawStatement> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM defense_statements WHERE group_id = ?1
           ORDER BY submitted_at, rowid",
          RawStatement::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![group_str], RawStatement::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStatement::into_statement).collect()
  }

  // ── Sanctions ─────────────────────────────────────────────────────────────

  async fn add_group_sanction(
    &self,
    group_id: Uuid,
    terms:    SanctionTerms,
  ) -> Result<WriteOutcome<SanctionRecord>> {
    let record = sanction_record(terms, Some(group_id));
    Ok(self.insert_sanction(&record).await?.map(|()| record))
  }

  async fn add_direct_sanction(&self, terms: SanctionTerms) -> Result<SanctionRecord> {
    let record = sanction_record(terms, None);
    // Unsourced rows carry no group precondition and no uniqueness key.
    match self.insert_sanction(&record).await? {
      WriteOutcome::Applied(()) => Ok(record),
      WriteOutcome::Contended(c) => Err(Error::UnexpectedContention(c)),
    }
  }

  async fn list_sanctions_for_group(&self, group_id: Uuid) -> Result<Vec<SanctionRecord>> {
    let group_str = encode_uuid(group_id);
    self
      .select_sanctions("source_group_id = ?1", group_str)
      .await
  }

  async fn list_sanctions_for_employee(
    &self,
    employee_id: Uuid,
  ) -> Result<Vec<SanctionRecord>> {
    let employee_str = encode_uuid(employee_id);
    self
      .select_sanctions("employee_id = ?1", employee_str)
      .await
  }
}

impl SqliteStore {
  async fn select_sanctions(
    &self,
    filter: &'static str,
    param:  String,
  ) -> Result<Vec<SanctionRecord>> {
    let raws: Vec<RawSanction> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM sanctions WHERE {filter} ORDER BY recorded_at, rowid",
          RawSanction::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![param], RawSanction::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSanction::into_sanction).collect()
  }
}

fn sanction_record(terms: SanctionTerms, source_group_id: Option<Uuid>) -> SanctionRecord {
  SanctionRecord {
    sanction_id: Uuid::new_v4(),
    employee_id: terms.employee_id,
    sanction_type_id: terms.sanction_type_id,
    reason: terms.reason,
    start_date: terms.start_date,
    end_date: terms.end_date,
    source_group_id,
    recorded_at: now(),
  }
}
