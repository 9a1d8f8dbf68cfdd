//! Inheritance resolution over scanned marker records.
//!
//! Records are stored in an arena and linked by identity; walking from a goal
//! unit towards its furthest known ancestor collects the member markers every
//! level contributes. Nearer declarations replace further ones by member name.

use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{ExecuteMarker, GoalMarker, MarkerRecord, MemberMarker};

/// A goal unit with its effective member set
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledUnit {
    /// The goal-bearing record; `members` holds the effective set ordered by member name
    pub record: MarkerRecord,
    /// Execution trigger declared on the unit or its nearest ancestor
    pub execute: Option<ExecuteMarker>,
    /// Identities walked, the unit itself first
    pub lineage: Vec<String>,
}

impl ReconciledUnit {
    pub fn identity(&self) -> &str {
        &self.record.identity
    }

    pub fn goal(&self) -> Option<&GoalMarker> {
        self.record.goal()
    }

    pub fn members(&self) -> &[MemberMarker] {
        &self.record.members
    }

    pub fn member(&self, name: &str) -> Option<&MemberMarker> {
        self.record.members.iter().find(|member| member.member == name)
    }
}

/// Arena of scanned records indexed by identity
#[derive(Debug, Default)]
pub struct Reconciler {
    units: Vec<MarkerRecord>,
    index: HashMap<String, usize>,
}

impl Reconciler {
    pub fn new(records: impl IntoIterator<Item = MarkerRecord>) -> Self {
        let mut units: Vec<MarkerRecord> = records.into_iter().collect();
        units.sort_by(|a, b| a.identity.cmp(&b.identity));
        let index = units
            .iter()
            .enumerate()
            .map(|(position, record)| (record.identity.clone(), position))
            .collect();
        Self { units, index }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// One reconciled unit per goal-bearing record, ordered by identity
    pub fn reconcile_all(&self) -> Result<Vec<ReconciledUnit>> {
        let mut reconciled = Vec::new();
        for position in 0..self.units.len() {
            if self.units[position].goal().is_some() {
                reconciled.push(self.reconcile_at(position)?);
            }
        }
        Ok(reconciled)
    }

    /// Reconcile a single unit. Returns `None` for unknown identities and for
    /// units without a goal marker.
    pub fn reconcile(&self, identity: &str) -> Result<Option<ReconciledUnit>> {
        match self.index.get(identity) {
            Some(&position) if self.units[position].goal().is_some() => {
                self.reconcile_at(position).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn reconcile_at(&self, position: usize) -> Result<ReconciledUnit> {
        let chain = self.lineage(position)?;

        let mut effective: BTreeMap<String, MemberMarker> = BTreeMap::new();
        for &link in chain.iter().rev() {
            for member in &self.units[link].members {
                effective.insert(member.member.clone(), member.clone());
            }
        }

        let execute = chain
            .iter()
            .find_map(|&link| self.units[link].execute().cloned());

        let mut record = self.units[position].clone();
        record.members = effective.into_values().collect();
        let lineage: Vec<String> = chain
            .iter()
            .map(|&link| self.units[link].identity.clone())
            .collect();
        debug!(
            "Reconciled {} with {} members over {:?}",
            record.identity,
            record.members.len(),
            lineage
        );

        Ok(ReconciledUnit {
            record,
            execute,
            lineage,
        })
    }

    /// Positions from `start` up to the furthest ancestor present in the arena
    fn lineage(&self, start: usize) -> Result<Vec<usize>> {
        let mut chain = vec![start];
        let mut visited = HashSet::from([start]);
        let mut current = start;

        while let Some(ancestor) = &self.units[current].ancestor {
            let Some(&next) = self.index.get(ancestor) else {
                break;
            };
            if !visited.insert(next) {
                let mut names: Vec<String> = chain
                    .iter()
                    .map(|&link| self.units[link].identity.clone())
                    .collect();
                names.push(ancestor.clone());
                return Err(Error::CyclicInheritance { chain: names });
            }
            chain.push(next);
            current = next;
        }
        Ok(chain)
    }
}
