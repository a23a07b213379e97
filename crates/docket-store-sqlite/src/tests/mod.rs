//! Tests for `SqliteStore` and for the workflow engine running on top of it,
//! all against an in-memory database.

mod workflow;

use std::collections::BTreeSet;

use chrono::NaiveDate;
use docket_core::{
  Workflow,
  catalog::Severity,
  group::NewIncident,
  sanction::SanctionTerms,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

/// A workflow over a fresh store seeded with one incident type, one sanction
/// type, and `employees` employees.
struct Fixture {
  wf:            Workflow<SqliteStore>,
  incident_type: Uuid,
  warning:       Uuid,
  employees:     Vec<Uuid>,
}

async fn fixture(employees: usize) -> Fixture {
  let wf = Workflow::new(store().await);

  let incident_type = wf
    .add_incident_type("Workplace conduct".into())
    .await
    .unwrap()
    .incident_type_id;
  let warning = wf
    .add_sanction_type("Written warning".into(), Severity::Mild)
    .await
    .unwrap()
    .sanction_type_id;

  let mut ids = Vec::with_capacity(employees);
  for i in 0..employees {
    ids.push(
      wf.add_employee(format!("Employee {i}"))
        .await
        .unwrap()
        .employee_id,
    );
  }

  Fixture { wf, incident_type, warning, employees: ids }
}

impl Fixture {
  fn report(&self, involved: &[Uuid]) -> NewIncident {
    NewIncident {
      incident_type_id:   self.incident_type,
      occurred_on:        NaiveDate::from_ymd_opt(2024, 4, 18).unwrap(),
      description:        "verbal altercation at shift change".into(),
      observations:       None,
      involved_employees: involved.iter().copied().collect::<BTreeSet<_>>(),
    }
  }

  fn terms(&self, employee_id: Uuid) -> SanctionTerms {
    SanctionTerms {
      employee_id,
      sanction_type_id: self.warning,
      reason:           "breach of conduct policy".into(),
      start_date:       NaiveDate::from_ymd_opt(2024, 4, 22).unwrap(),
      end_date:         None,
    }
  }

  /// Report a group involving every fixture employee.
  async fn reported(&self) -> Uuid {
    self
      .wf
      .report_incident(self.report(&self.employees))
      .await
      .unwrap()
  }

  /// Report and resolve a group involving every fixture employee.
  async fn resolved(&self) -> Uuid {
    let group_id = self.reported().await;
    self
      .wf
      .record_resolution(group_id, "Verbal warning issued".into())
      .await
      .unwrap();
    group_id
  }
}
