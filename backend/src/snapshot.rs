//! Normalizes raw platform data into a snapshot.

use crate::platform::ProcessAccessor;
use crate::types::{ProcError, ProcessRecord, RawProcess};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// A point-in-time listing of processes, in platform enumeration order.
///
/// Ids are unique within a snapshot. Serializes as a plain array of records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    records: Vec<ProcessRecord>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProcessRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[ProcessRecord] {
        &self.records
    }

    pub fn get(&self, id: u32) -> Option<&ProcessRecord> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.get(id).is_some()
    }

    pub fn into_records(self) -> Vec<ProcessRecord> {
        self.records
    }
}

impl From<Vec<ProcessRecord>> for Snapshot {
    /// Repeated ids keep their first occurrence.
    fn from(records: Vec<ProcessRecord>) -> Self {
        let (records, _) = dedup_first(records);
        Snapshot { records }
    }
}

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<ProcessRecord>::deserialize(deserializer).map(Snapshot::from)
    }
}

impl IntoIterator for Snapshot {
    type Item = ProcessRecord;
    type IntoIter = std::vec::IntoIter<ProcessRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a ProcessRecord;
    type IntoIter = std::slice::Iter<'a, ProcessRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Builds snapshots from a platform accessor.
pub struct SnapshotBuilder<'a, A: ProcessAccessor + ?Sized> {
    accessor: &'a A,
}

impl<'a, A: ProcessAccessor + ?Sized> SnapshotBuilder<'a, A> {
    pub fn new(accessor: &'a A) -> Self {
        Self { accessor }
    }

    pub fn build(&self) -> Result<Snapshot, ProcError> {
        let raw = self.accessor.enumerate()?;
        Ok(normalize(raw))
    }
}

/// Drop vanished entries and repeated ids, keeping first occurrences in order.
pub fn normalize(raw: Vec<RawProcess>) -> Snapshot {
    let total = raw.len();
    let named: Vec<ProcessRecord> = raw
        .into_iter()
        .filter_map(|entry| match entry.name {
            Some(name) if !name.is_empty() => Some(ProcessRecord::new(entry.pid, name)),
            _ => None,
        })
        .collect();
    let vanished = total - named.len();
    let (records, duplicates) = dedup_first(named);

    debug!(
        total,
        kept = records.len(),
        vanished,
        duplicates,
        "built process snapshot"
    );
    Snapshot { records }
}

fn dedup_first(records: Vec<ProcessRecord>) -> (Vec<ProcessRecord>, usize) {
    let total = records.len();
    let mut seen = HashSet::with_capacity(total);
    let kept: Vec<ProcessRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.id()))
        .collect();
    let duplicates = total - kept.len();
    (kept, duplicates)
}
