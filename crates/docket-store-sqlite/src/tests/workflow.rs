//! The resolution workflow end to end: guards, derived status, sanction
//! coordination, corrections, and races between concurrent callers.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate, Utc};
use docket_core::{
  Error, ErrorKind,
  catalog::Severity,
  error::{InputError, Missing, Rejection},
  group::Amendment,
  sanction::SanctionTerms,
  statement::NewDefenseStatement,
  status::GroupStatus,
  store::Contention,
};
use uuid::Uuid;

use super::fixture;

fn statement(group_id: Uuid, author: Uuid) -> NewDefenseStatement {
  NewDefenseStatement {
    group_id,
    author_employee_id: author,
    content: "I followed the posted procedure".into(),
    attachment_ref: None,
  }
}

/// Every ordering of `items`.
fn permutations(items: &[Uuid]) -> Vec<Vec<Uuid>> {
  if items.len() <= 1 {
    return vec![items.to_vec()];
  }
  let mut out = Vec::new();
  for i in 0..items.len() {
    let mut rest = items.to_vec();
    let head = rest.remove(i);
    for mut tail in permutations(&rest) {
      tail.insert(0, head);
      out.push(tail);
    }
  }
  out
}

// ─── Report ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reported_group_is_open_with_everyone_remaining() {
  let fx = fixture(3).await;
  let group_id = fx.reported().await;

  let view = fx.wf.get_group(group_id).await.unwrap();
  assert_eq!(view.status, GroupStatus::Open);
  assert_eq!(
    view.remaining_employees,
    fx.employees.iter().copied().collect::<BTreeSet<_>>()
  );
  assert!(view.statements.is_empty());
  assert!(!view.can_finalize());
}

#[tokio::test]
async fn report_rejects_bad_input() {
  let fx = fixture(1).await;

  let mut blank = fx.report(&fx.employees);
  blank.description = "  ".into();
  let err = fx.wf.report_incident(blank).await.unwrap_err();
  assert!(matches!(err, Error::InvalidInput(InputError::EmptyField("description"))));

  let mut future = fx.report(&fx.employees);
  future.occurred_on = Utc::now()
    .date_naive()
    .checked_add_days(Days::new(30))
    .unwrap();
  let err = fx.wf.report_incident(future).await.unwrap_err();
  assert!(matches!(err, Error::InvalidInput(InputError::FutureOccurrence(_))));

  let nobody = fx.report(&[]);
  let err = fx.wf.report_incident(nobody).await.unwrap_err();
  assert!(matches!(err, Error::InvalidInput(InputError::NoInvolvedEmployees)));

  let mut untyped = fx.report(&fx.employees);
  untyped.incident_type_id = Uuid::new_v4();
  let err = fx.wf.report_incident(untyped).await.unwrap_err();
  assert!(matches!(err, Error::InvalidInput(InputError::UnknownIncidentType(_))));
}

#[tokio::test]
async fn report_with_unknown_employee_is_not_found() {
  let fx = fixture(1).await;
  let stranger = Uuid::new_v4();

  let err = fx
    .wf
    .report_incident(fx.report(&[fx.employees[0], stranger]))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound(Missing::Employee(id)) if id == stranger));
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn unknown_group_is_not_found() {
  let fx = fixture(1).await;
  let err = fx.wf.get_group(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(Missing::Group(_))));
}

#[tokio::test]
async fn duplicate_catalog_names_are_invalid_input() {
  let fx = fixture(0).await;

  let err = fx
    .wf
    .add_incident_type("Workplace conduct".into())
    .await
    .unwrap_err();
  assert!(matches!(
    &err,
    Error::InvalidInput(InputError::DuplicateName(name)) if name == "Workplace conduct"
  ));
  assert_eq!(err.kind(), ErrorKind::InvalidInput);

  let err = fx
    .wf
    .add_sanction_type("  Written warning ".into(), Severity::Severe)
    .await
    .unwrap_err();
  assert!(matches!(
    &err,
    Error::InvalidInput(InputError::DuplicateName(name)) if name == "Written warning"
  ));
  assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn five_digit_sanction_year_is_invalid_input() {
  let fx = fixture(1).await;
  let e1 = fx.employees[0];
  let group_id = fx.resolved().await;

  let far = NaiveDate::from_ymd_opt(10000, 1, 1).unwrap();
  let err = fx
    .wf
    .apply_sanction(group_id, SanctionTerms {
      end_date: Some(far),
      ..fx.terms(e1)
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InvalidInput(InputError::DateOutOfRange(d)) if d == far));
  assert_eq!(err.kind(), ErrorKind::InvalidInput);

  let view = fx.wf.get_group(group_id).await.unwrap();
  assert!(view.sanctions.is_empty());
  assert_eq!(view.status, GroupStatus::AwaitingSanctions);
}

// ─── Defense statements ──────────────────────────────────────────────────────

#[tokio::test]
async fn second_statement_from_same_employee_is_rejected() {
  let fx = fixture(2).await;
  let group_id = fx.reported().await;
  let (e1, e2) = (fx.employees[0], fx.employees[1]);

  fx.wf
    .submit_defense_statement(statement(group_id, e2))
    .await
    .unwrap();
  fx.wf
    .submit_defense_statement(statement(group_id, e1))
    .await
    .unwrap();

  for author in [e1, e2] {
    let err = fx
      .wf
      .submit_defense_statement(statement(group_id, author))
      .await
      .unwrap_err();
    assert!(matches!(
      err,
      Error::InvalidTransition { rejection: Rejection::StatementExists(id), .. } if id == author
    ));
  }

  let view = fx.wf.get_group(group_id).await.unwrap();
  assert_eq!(view.statements.len(), 2);
  assert_eq!(view.status, GroupStatus::Open);
}

#[tokio::test]
async fn statement_author_must_be_involved() {
  let fx = fixture(2).await;
  let (e1, outsider) = (fx.employees[0], fx.employees[1]);
  let group_id = fx.wf.report_incident(fx.report(&[e1])).await.unwrap();

  let err = fx
    .wf
    .submit_defense_statement(statement(group_id, outsider))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InvalidInput(InputError::NotInvolved(id)) if id == outsider));

  let err = fx
    .wf
    .submit_defense_statement(statement(group_id, Uuid::new_v4()))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound(Missing::Employee(_))));
}

#[tokio::test]
async fn empty_statement_is_invalid_input() {
  let fx = fixture(1).await;
  let group_id = fx.reported().await;

  let mut input = statement(group_id, fx.employees[0]);
  input.content = String::new();
  let err = fx.wf.submit_defense_statement(input).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn statement_after_resolution_is_rejected() {
  let fx = fixture(1).await;
  let group_id = fx.resolved().await;

  let err = fx
    .wf
    .submit_defense_statement(statement(group_id, fx.employees[0]))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::InvalidTransition {
      rejection: Rejection::AlreadyResolved(GroupStatus::AwaitingSanctions),
      ..
    }
  ));
}

// ─── Resolution ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn second_resolution_fails_and_first_is_kept() {
  let fx = fixture(1).await;
  let group_id = fx.resolved().await;

  let err = fx
    .wf
    .record_resolution(group_id, "Termination".into())
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::InvalidTransition);

  let view = fx.wf.get_group(group_id).await.unwrap();
  assert_eq!(
    view.group.resolution.unwrap().description,
    "Verbal warning issued"
  );
  assert_eq!(view.status, GroupStatus::AwaitingSanctions);
}

#[tokio::test]
async fn empty_resolution_is_invalid_input() {
  let fx = fixture(1).await;
  let group_id = fx.reported().await;

  let err = fx
    .wf
    .record_resolution(group_id, " ".into())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InvalidInput(InputError::EmptyField("description"))));
  assert_eq!(
    fx.wf.get_group(group_id).await.unwrap().status,
    GroupStatus::Open
  );
}

// ─── Sanction coordination ───────────────────────────────────────────────────

#[tokio::test]
async fn sanction_before_resolution_is_rejected() {
  let fx = fixture(1).await;
  let group_id = fx.reported().await;

  let err = fx
    .wf
    .apply_sanction(group_id, fx.terms(fx.employees[0]))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::InvalidTransition { rejection: Rejection::NotResolved, .. }
  ));
}

#[tokio::test]
async fn repeat_sanction_is_rejected_not_duplicated() {
  let fx = fixture(2).await;
  let group_id = fx.resolved().await;
  let e1 = fx.employees[0];

  fx.wf.apply_sanction(group_id, fx.terms(e1)).await.unwrap();
  let err = fx
    .wf
    .apply_sanction(group_id, fx.terms(e1))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::InvalidTransition { rejection: Rejection::AlreadySanctioned(id), .. } if id == e1
  ));

  let view = fx.wf.get_group(group_id).await.unwrap();
  assert_eq!(view.sanctions.len(), 1);
  assert_eq!(view.remaining_employees, BTreeSet::from([fx.employees[1]]));
}

#[tokio::test]
async fn sanction_terms_are_validated() {
  let fx = fixture(1).await;
  let group_id = fx.resolved().await;
  let e1 = fx.employees[0];

  let mut backwards = fx.terms(e1);
  backwards.end_date = Some(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
  let err = fx.wf.apply_sanction(group_id, backwards).await.unwrap_err();
  assert!(matches!(err, Error::InvalidInput(InputError::EndBeforeStart { .. })));

  let mut unknown = fx.terms(e1);
  unknown.sanction_type_id = Uuid::new_v4();
  let err = fx.wf.apply_sanction(group_id, unknown).await.unwrap_err();
  assert!(matches!(err, Error::InvalidInput(InputError::UnknownSanctionType(_))));

  assert!(fx.wf.remaining_employees(group_id).await.unwrap().contains(&e1));
}

#[tokio::test]
async fn closure_is_order_independent() {
  let fx = fixture(3).await;

  for order in permutations(&fx.employees) {
    let group_id = fx.resolved().await;

    let (last, rest) = order.split_last().unwrap();
    for &employee in rest {
      fx.wf.apply_sanction(group_id, fx.terms(employee)).await.unwrap();
      assert_eq!(
        fx.wf.get_group(group_id).await.unwrap().status,
        GroupStatus::AwaitingSanctions
      );
      assert!(!fx.wf.can_finalize(group_id).await.unwrap());
    }
    assert_eq!(
      fx.wf.remaining_employees(group_id).await.unwrap(),
      BTreeSet::from([*last])
    );

    fx.wf.apply_sanction(group_id, fx.terms(*last)).await.unwrap();
    let view = fx.wf.get_group(group_id).await.unwrap();
    assert_eq!(view.status, GroupStatus::Closed, "order {order:?}");
    assert!(view.remaining_employees.is_empty());
    assert!(fx.wf.can_finalize(group_id).await.unwrap());
  }
}

#[tokio::test]
async fn direct_sanctions_do_not_close_groups() {
  let fx = fixture(1).await;
  let group_id = fx.resolved().await;
  let e1 = fx.employees[0];

  fx.wf.issue_sanction(fx.terms(e1)).await.unwrap();

  assert_eq!(
    fx.wf.get_group(group_id).await.unwrap().status,
    GroupStatus::AwaitingSanctions
  );
  let history = fx.wf.list_sanctions_for_employee(e1).await.unwrap();
  assert_eq!(history.len(), 1);
  assert!(history[0].source_group_id.is_none());
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn report_to_closure() {
  let fx = fixture(2).await;
  let (e1, e2) = (fx.employees[0], fx.employees[1]);
  let g1 = fx.wf.report_incident(fx.report(&[e1, e2])).await.unwrap();

  fx.wf
    .submit_defense_statement(statement(g1, e1))
    .await
    .unwrap();
  fx.wf
    .record_resolution(g1, "Verbal warning issued".into())
    .await
    .unwrap();

  fx.wf.apply_sanction(g1, fx.terms(e1)).await.unwrap();
  assert_eq!(
    fx.wf.get_group(g1).await.unwrap().status,
    GroupStatus::AwaitingSanctions
  );

  fx.wf.apply_sanction(g1, fx.terms(e2)).await.unwrap();
  let view = fx.wf.get_group(g1).await.unwrap();
  assert_eq!(view.status, GroupStatus::Closed);
  assert_eq!(view.statements.len(), 1);
  assert_eq!(view.sanctions.len(), 2);

  let err = fx
    .wf
    .record_resolution(g1, "Second thoughts".into())
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::InvalidTransition);
}

#[tokio::test]
async fn report_then_correct() {
  let fx = fixture(2).await;
  let g1 = fx.reported().await;

  let g2 = fx
    .wf
    .create_correction(g1, Amendment {
      description: Some("revised account".into()),
      ..Amendment::default()
    })
    .await
    .unwrap();

  let original = fx.wf.get_group(g1).await.unwrap();
  let successor = fx.wf.get_group(g2).await.unwrap();

  assert_eq!(successor.group.predecessor_group_id, Some(g1));
  assert_eq!(successor.group.description, "revised account");
  assert_eq!(
    successor.group.involved_employees,
    original.group.involved_employees
  );
  assert_eq!(successor.status, GroupStatus::Open);
  assert_eq!(original.status, GroupStatus::Superseded);
  assert_eq!(original.group.description, "verbal altercation at shift change");

  let err = fx
    .wf
    .submit_defense_statement(statement(g1, fx.employees[0]))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::InvalidTransition { rejection: Rejection::Superseded, .. }
  ));
}

// ─── Corrections & chains ────────────────────────────────────────────────────

#[tokio::test]
async fn chain_resolves_in_both_directions() {
  let fx = fixture(1).await;
  let g1 = fx.reported().await;
  let g2 = fx
    .wf
    .create_correction(g1, Amendment::default())
    .await
    .unwrap();
  let g3 = fx
    .wf
    .create_correction(g2, Amendment {
      observations: Some("second witness came forward".into()),
      ..Amendment::default()
    })
    .await
    .unwrap();

  let from_original = fx.wf.get_chain(g1).await.unwrap();
  assert_eq!(from_original.successor(), Some(g2));
  assert_eq!(from_original.latest(), g3);

  let from_middle = fx.wf.get_chain(g2).await.unwrap();
  assert_eq!(from_middle.predecessor(), Some(g1));
  assert_eq!(from_middle.successor(), Some(g3));
  assert_eq!(from_middle.position(), 1);

  let from_latest = fx.wf.get_chain(g3).await.unwrap();
  assert_eq!(from_latest.root(), g1);
  assert_eq!(from_latest.successor(), None);
  let ids: Vec<Uuid> = from_latest.versions().iter().map(|l| l.group_id).collect();
  assert_eq!(ids, vec![g1, g2, g3]);
}

#[tokio::test]
async fn uncorrected_group_is_its_own_chain() {
  let fx = fixture(1).await;
  let g1 = fx.reported().await;

  let chain = fx.wf.get_chain(g1).await.unwrap();
  assert_eq!(chain.versions().len(), 1);
  assert_eq!(chain.position(), 0);
  assert_eq!(chain.root(), g1);
  assert_eq!(chain.latest(), g1);
  assert_eq!(chain.predecessor(), None);
  assert_eq!(chain.successor(), None);
}

#[tokio::test]
async fn correction_does_not_carry_statements() {
  let fx = fixture(1).await;
  let g1 = fx.reported().await;
  fx.wf
    .submit_defense_statement(statement(g1, fx.employees[0]))
    .await
    .unwrap();

  let g2 = fx
    .wf
    .create_correction(g1, Amendment::default())
    .await
    .unwrap();

  assert!(fx.wf.get_group(g2).await.unwrap().statements.is_empty());
  assert_eq!(fx.wf.get_group(g1).await.unwrap().statements.len(), 1);
  fx.wf
    .submit_defense_statement(statement(g2, fx.employees[0]))
    .await
    .unwrap();
}

#[tokio::test]
async fn correction_overrides_are_validated() {
  let fx = fixture(1).await;
  let g1 = fx.reported().await;

  let err = fx
    .wf
    .create_correction(g1, Amendment {
      involved_employees: Some(BTreeSet::new()),
      ..Amendment::default()
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InvalidInput(InputError::NoInvolvedEmployees)));
  assert_eq!(fx.wf.get_group(g1).await.unwrap().status, GroupStatus::Open);
}

#[tokio::test]
async fn correcting_resolved_closed_or_superseded_groups_fails() {
  let fx = fixture(1).await;
  let e1 = fx.employees[0];

  let awaiting = fx.resolved().await;
  let closed = fx.resolved().await;
  fx.wf.apply_sanction(closed, fx.terms(e1)).await.unwrap();
  let superseded = fx.reported().await;
  fx.wf
    .create_correction(superseded, Amendment::default())
    .await
    .unwrap();

  for (group_id, expected) in [
    (awaiting, Rejection::AlreadyResolved(GroupStatus::AwaitingSanctions)),
    (closed, Rejection::AlreadyResolved(GroupStatus::Closed)),
    (superseded, Rejection::Superseded),
  ] {
    let err = fx
      .wf
      .create_correction(group_id, Amendment::default())
      .await
      .unwrap_err();
    match err {
      Error::InvalidTransition { rejection, .. } => assert_eq!(rejection, expected),
      other => panic!("expected InvalidTransition, got {other:?}"),
    }
  }
}

#[tokio::test]
async fn groups_for_employee_include_corrections() {
  let fx = fixture(2).await;
  let (e1, e2) = (fx.employees[0], fx.employees[1]);
  let g1 = fx.wf.report_incident(fx.report(&[e1])).await.unwrap();
  let g2 = fx
    .wf
    .create_correction(g1, Amendment {
      involved_employees: Some(BTreeSet::from([e1, e2])),
      ..Amendment::default()
    })
    .await
    .unwrap();

  let for_e1 = fx.wf.list_groups_for_employee(e1).await.unwrap();
  let statuses: Vec<(Uuid, GroupStatus)> =
    for_e1.iter().map(|v| (v.group.group_id, v.status)).collect();
  assert_eq!(
    statuses,
    vec![(g2, GroupStatus::Open), (g1, GroupStatus::Superseded)]
  );

  let for_e2 = fx.wf.list_groups_for_employee(e2).await.unwrap();
  assert_eq!(for_e2.len(), 1);

  let err = fx
    .wf
    .list_groups_for_employee(Uuid::new_v4())
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ─── Races ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_corrections_exactly_one_wins() {
  let fx = fixture(2).await;
  let g1 = fx.reported().await;

  let (a, b) = tokio::join!(
    fx.wf.create_correction(g1, Amendment {
      description: Some("account A".into()),
      ..Amendment::default()
    }),
    fx.wf.create_correction(g1, Amendment {
      description: Some("account B".into()),
      ..Amendment::default()
    }),
  );

  let (winner, loser) = match (a, b) {
    (Ok(id), Err(e)) | (Err(e), Ok(id)) => (id, e),
    other => panic!("expected exactly one success, got {other:?}"),
  };
  assert!(matches!(
    loser,
    Error::Conflict { group_id, contention: Contention::Superseded } if group_id == g1
  ));

  let chain = fx.wf.get_chain(g1).await.unwrap();
  assert_eq!(chain.versions().len(), 2);
  assert_eq!(chain.latest(), winner);
}

#[tokio::test]
async fn concurrent_sanctions_write_one_record() {
  let fx = fixture(2).await;
  let group_id = fx.resolved().await;
  let e1 = fx.employees[0];

  let (a, b) = tokio::join!(
    fx.wf.apply_sanction(group_id, fx.terms(e1)),
    fx.wf.apply_sanction(group_id, fx.terms(e1)),
  );

  let loser = match (a, b) {
    (Ok(_), Err(e)) | (Err(e), Ok(_)) => e,
    other => panic!("expected exactly one success, got {other:?}"),
  };
  // The loser either lost the insert race or saw the winner's record first.
  assert!(matches!(
    loser,
    Error::Conflict { contention: Contention::AlreadySanctioned, .. }
      | Error::InvalidTransition { rejection: Rejection::AlreadySanctioned(_), .. }
  ));

  let view = fx.wf.get_group(group_id).await.unwrap();
  assert_eq!(view.sanctions.len(), 1);
  assert_eq!(view.status, GroupStatus::AwaitingSanctions);
}
