//! Measurement history aggregation.
//!
//! Loads all measurements for a patient in a single store query and groups
//! them by `(type, target, side)`, each group ordered chronologically.
//! Consumers enumerate each group's history independently, as often as
//! they like, without re-querying the store.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Result;
use crate::record::{EntityKind, Measurement, MeasurementType, Side, StoredRecord};
use crate::store::RecordStore;

/// The trend group a measurement belongs to.
///
/// Computed at aggregation time, never stored: every measurement belongs
/// to exactly one `(type, target, side)` group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GroupKey {
    /// The assessment instrument.
    pub measurement_type: MeasurementType,
    /// Joint or muscle group identifier.
    pub target: String,
    /// Body side.
    pub side: Side,
}

impl GroupKey {
    /// The group key a measurement belongs to.
    #[must_use]
    pub fn of(measurement: &Measurement) -> Self {
        Self {
            measurement_type: measurement.measurement_type,
            target: measurement.target.clone(),
            side: measurement.side,
        }
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.measurement_type, self.target, self.side)
    }
}

/// One group's measurement history, ordered ascending by `recorded_at`
/// with id as the stable tie-break.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupHistory {
    measurements: Vec<Measurement>,
}

impl GroupHistory {
    /// Iterate the group chronologically. Restartable: each call starts
    /// a fresh pass over the same aggregated data.
    pub fn iter(&self) -> std::slice::Iter<'_, Measurement> {
        self.measurements.iter()
    }

    /// The group's measurements as an ordered slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Measurement] {
        &self.measurements
    }

    /// The most recent measurement in the group.
    #[must_use]
    pub fn latest(&self) -> Option<&Measurement> {
        self.measurements.last()
    }

    /// Number of measurements in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    /// Check whether the group is empty.
    ///
    /// Aggregation never produces empty groups; this exists for
    /// completeness of the container API.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }
}

impl<'a> IntoIterator for &'a GroupHistory {
    type Item = &'a Measurement;
    type IntoIter = std::slice::Iter<'a, Measurement>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A patient's aggregated measurement history, keyed by trend group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeasurementHistory {
    groups: BTreeMap<GroupKey, GroupHistory>,
}

impl MeasurementHistory {
    /// Iterate groups in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &GroupHistory)> {
        self.groups.iter()
    }

    /// Look up one group's history.
    #[must_use]
    pub fn group(&self, key: &GroupKey) -> Option<&GroupHistory> {
        self.groups.get(key)
    }

    /// Number of non-empty groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Check whether the patient has any measurements at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of measurements across all groups.
    #[must_use]
    pub fn measurement_count(&self) -> usize {
        self.groups.values().map(GroupHistory::len).sum()
    }
}

/// Aggregate a patient's measurements into ordered trend groups.
///
/// Issues exactly one store query. Groups with zero measurements are
/// simply absent from the result; within each group, measurements are
/// ordered ascending by `recorded_at`, ties broken by id so the output
/// is deterministic.
///
/// # Errors
///
/// Returns a store error if the patient query fails.
pub async fn aggregate(store: &dyn RecordStore, patient_id: &str) -> Result<MeasurementHistory> {
    let records = store
        .query_by_patient(patient_id, EntityKind::Measurement)
        .await?;

    let mut groups: BTreeMap<GroupKey, Vec<Measurement>> = BTreeMap::new();
    for record in records {
        if let StoredRecord::Measurement(measurement) = record {
            groups
                .entry(GroupKey::of(&measurement))
                .or_default()
                .push(measurement);
        }
    }

    let groups = groups
        .into_iter()
        .map(|(key, mut measurements)| {
            measurements.sort_by(|a, b| {
                a.recorded_at
                    .cmp(&b.recorded_at)
                    .then_with(|| a.id.cmp(&b.id))
            });
            (key, GroupHistory { measurements })
        })
        .collect();

    Ok(MeasurementHistory { groups })
}
