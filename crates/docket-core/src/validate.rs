//! Input checks that need no store access.

use chrono::{Datelike as _, NaiveDate, Utc};

use crate::{
  error::InputError,
  group::NewIncident,
  sanction::SanctionTerms,
};

pub(crate) fn non_empty(field: &'static str, value: &str) -> Result<(), InputError> {
  if value.trim().is_empty() {
    return Err(InputError::EmptyField(field));
  }
  Ok(())
}

/// Blank observations are stored as absent.
pub(crate) fn normalize_observations(observations: Option<String>) -> Option<String> {
  observations.filter(|o| !o.trim().is_empty())
}

/// Dates are stored as `YYYY-MM-DD` text and compared as text, which only
/// orders correctly for four-digit years.
pub(crate) fn storable_date(date: NaiveDate) -> Result<(), InputError> {
  if !(1..=9999).contains(&date.year()) {
    return Err(InputError::DateOutOfRange(date));
  }
  Ok(())
}

pub(crate) fn incident_shape(input: &NewIncident, today: NaiveDate) -> Result<(), InputError> {
  non_empty("description", &input.description)?;
  storable_date(input.occurred_on)?;
  if input.occurred_on > today {
    return Err(InputError::FutureOccurrence(input.occurred_on));
  }
  if input.involved_employees.is_empty() {
    return Err(InputError::NoInvolvedEmployees);
  }
  Ok(())
}

pub(crate) fn sanction_shape(terms: &SanctionTerms) -> Result<(), InputError> {
  non_empty("reason", &terms.reason)?;
  storable_date(terms.start_date)?;
  if let Some(end) = terms.end_date {
    storable_date(end)?;
    if end < terms.start_date {
      return Err(InputError::EndBeforeStart { start: terms.start_date, end });
    }
  }
  Ok(())
}

pub(crate) fn today() -> NaiveDate { Utc::now().date_naive() }

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use chrono::Days;
  use uuid::Uuid;

  use super::*;

  fn incident() -> NewIncident {
    NewIncident {
      incident_type_id:   Uuid::new_v4(),
      occurred_on:        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
      description:        "left the cold room unlocked".into(),
      observations:       None,
      involved_employees: BTreeSet::from([Uuid::new_v4()]),
    }
  }

  #[test]
  fn whitespace_description_is_empty() {
    let mut input = incident();
    input.description = "   \n".into();
    assert_eq!(
      incident_shape(&input, today()),
      Err(InputError::EmptyField("description"))
    );
  }

  #[test]
  fn occurrence_today_is_accepted_tomorrow_is_not() {
    let now = today();
    let mut input = incident();
    input.occurred_on = now;
    assert!(incident_shape(&input, now).is_ok());

    let tomorrow = now.checked_add_days(Days::new(1)).unwrap();
    input.occurred_on = tomorrow;
    assert_eq!(
      incident_shape(&input, now),
      Err(InputError::FutureOccurrence(tomorrow))
    );
  }

  #[test]
  fn at_least_one_employee_is_required() {
    let mut input = incident();
    input.involved_employees.clear();
    assert_eq!(
      incident_shape(&input, today()),
      Err(InputError::NoInvolvedEmployees)
    );
  }

  #[test]
  fn sanction_end_may_equal_start_but_not_precede_it() {
    let start = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
    let mut terms = SanctionTerms {
      employee_id:      Uuid::new_v4(),
      sanction_type_id: Uuid::new_v4(),
      reason:           "unsafe forklift operation".into(),
      start_date:       start,
      end_date:         Some(start),
    };
    assert!(sanction_shape(&terms).is_ok());

    let end = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
    terms.end_date = Some(end);
    assert_eq!(
      sanction_shape(&terms),
      Err(InputError::EndBeforeStart { start, end })
    );
  }

  #[test]
  fn five_digit_years_are_out_of_range() {
    let start = NaiveDate::from_ymd_opt(2024, 4, 22).unwrap();
    let far = NaiveDate::from_ymd_opt(10000, 1, 1).unwrap();
    let terms = SanctionTerms {
      employee_id:      Uuid::new_v4(),
      sanction_type_id: Uuid::new_v4(),
      reason:           "repeated no-shows".into(),
      start_date:       start,
      end_date:         Some(far),
    };
    assert_eq!(sanction_shape(&terms), Err(InputError::DateOutOfRange(far)));

    let last = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap();
    assert!(sanction_shape(&SanctionTerms { end_date: Some(last), ..terms }).is_ok());

    let mut input = incident();
    let ancient = NaiveDate::from_ymd_opt(0, 6, 1).unwrap();
    input.occurred_on = ancient;
    assert_eq!(
      incident_shape(&input, today()),
      Err(InputError::DateOutOfRange(ancient))
    );
  }

  #[test]
  fn blank_observations_normalize_to_none() {
    assert_eq!(normalize_observations(Some("  ".into())), None);
    assert_eq!(
      normalize_observations(Some("seen by the shift lead".into())),
      Some("seen by the shift lead".into())
    );
  }
}
