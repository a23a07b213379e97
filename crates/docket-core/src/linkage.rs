//! Correction chains.
//!
//! Each correction links two groups: the successor points back through
//! `predecessor_group_id`, the original forward through `successor_group_id`.
//! A group has at most one of each, so every group sits on exactly one linear
//! chain running from the original report to the latest correction.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, Workflow, group::IncidentGroup, store::IncidentStore};

/// One version in a correction chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLink {
  pub group_id:    Uuid,
  pub reported_at: DateTime<Utc>,
  pub resolved:    bool,
}

impl From<&IncidentGroup> for ChainLink {
  fn from(g: &IncidentGroup) -> Self {
    Self {
      group_id:    g.group_id,
      reported_at: g.reported_at,
      resolved:    g.is_resolved(),
    }
  }
}

/// The full chain a group belongs to, oldest version first.
///
/// Only built by [`Workflow::get_chain`], so `versions` is never empty and
/// `position` is always in bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chain {
  versions: Vec<ChainLink>,
  /// Index into `versions` of the group the chain was requested for.
  position: usize,
}

impl Chain {
  pub fn versions(&self) -> &[ChainLink] { &self.versions }

  pub fn position(&self) -> usize { self.position }

  /// The original report.
  pub fn root(&self) -> Uuid { self.versions[0].group_id }

  /// The newest version; the only one that can still change.
  pub fn latest(&self) -> Uuid {
    self.versions[self.versions.len() - 1].group_id
  }

  pub fn predecessor(&self) -> Option<Uuid> {
    self
      .position
      .checked_sub(1)
      .map(|i| self.versions[i].group_id)
  }

  pub fn successor(&self) -> Option<Uuid> {
    self.versions.get(self.position + 1).map(|l| l.group_id)
  }

  pub fn contains(&self, group_id: Uuid) -> bool {
    self.versions.iter().any(|l| l.group_id == group_id)
  }
}

impl<S: IncidentStore> Workflow<S> {
  /// Walk backward to the original report and forward to the latest
  /// correction.
  pub async fn get_chain(&self, group_id: Uuid) -> Result<Chain> {
    let start = self.load_group(group_id).await?;
    let mut seen = HashSet::from([start.group_id]);

    let mut backward = Vec::new();
    let mut cursor = start.predecessor_group_id;
    while let Some(id) = cursor {
      let group = self.linked_group(id, &mut seen).await?;
      cursor = group.predecessor_group_id;
      backward.push(ChainLink::from(&group));
    }

    let mut versions: Vec<ChainLink> = backward.into_iter().rev().collect();
    let position = versions.len();
    versions.push(ChainLink::from(&start));

    let mut cursor = start.successor_group_id;
    while let Some(id) = cursor {
      let group = self.linked_group(id, &mut seen).await?;
      cursor = group.successor_group_id;
      versions.push(ChainLink::from(&group));
    }

    Ok(Chain { versions, position })
  }

  async fn linked_group(
    &self,
    id: Uuid,
    seen: &mut HashSet<Uuid>,
  ) -> Result<IncidentGroup> {
    if !seen.insert(id) {
      return Err(Error::BrokenChain(id));
    }
    self
      .store
      .get_group(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::BrokenChain(id))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn link() -> ChainLink {
    ChainLink { group_id: Uuid::new_v4(), reported_at: Utc::now(), resolved: false }
  }

  #[test]
  fn neighbours_follow_position() {
    let versions = vec![link(), link(), link()];
    let ids: Vec<Uuid> = versions.iter().map(|l| l.group_id).collect();
    let chain = Chain { versions, position: 1 };

    assert_eq!(chain.root(), ids[0]);
    assert_eq!(chain.latest(), ids[2]);
    assert_eq!(chain.predecessor(), Some(ids[0]));
    assert_eq!(chain.successor(), Some(ids[2]));
  }

  #[test]
  fn single_version_chain_has_no_neighbours() {
    let only = link();
    let id = only.group_id;
    let chain = Chain { versions: vec![only], position: 0 };

    assert_eq!(chain.root(), id);
    assert_eq!(chain.latest(), id);
    assert_eq!(chain.predecessor(), None);
    assert_eq!(chain.successor(), None);
    assert!(chain.contains(id));
  }
}
