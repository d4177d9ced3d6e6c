//! Trend classification over measurement history.
//!
//! Consumes one chronologically ordered trend group and classifies its
//! direction by comparing the most recent value against a baseline taken
//! `comparison_span` records earlier. Higher numeric values are uniformly
//! interpreted as clinically better for both instruments: larger ROM
//! degree, higher MMT grade.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::history::{aggregate, GroupKey};
use crate::record::{Measurement, MeasurementType};
use crate::store::RecordStore;

/// Directional classification of one trend group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    /// The latest value improved by at least the threshold.
    Improving,
    /// The latest value declined by at least the threshold.
    Worsening,
    /// The change stayed within the threshold.
    Stable,
    /// Too few records to compare against the configured baseline.
    InsufficientData,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Improving => write!(f, "improving"),
            Self::Worsening => write!(f, "worsening"),
            Self::Stable => write!(f, "stable"),
            Self::InsufficientData => write!(f, "insufficient data"),
        }
    }
}

/// Configuration for trend classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendConfig {
    /// Minimum ROM delta, in degrees, to count as a directional change.
    pub rom_threshold: f64,

    /// Minimum MMT delta, in grade steps, to count as a directional change.
    pub mmt_threshold: f64,

    /// How many records back the baseline is taken from. The default of 1
    /// compares the two most recent records.
    pub comparison_span: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            rom_threshold: 5.0,
            mmt_threshold: 1.0,
            comparison_span: 1,
        }
    }
}

impl TrendConfig {
    /// The change threshold for the given instrument.
    #[must_use]
    pub fn threshold(&self, measurement_type: MeasurementType) -> f64 {
        match measurement_type {
            MeasurementType::Rom => self.rom_threshold,
            MeasurementType::Mmt => self.mmt_threshold,
        }
    }
}

/// Classify one ordered trend group.
///
/// `history` must be a single group's measurements in chronological order,
/// as produced by [`aggregate`](crate::history::aggregate). Records with
/// non-finite values are skipped when selecting latest and baseline. The
/// function is pure and total: sparse or malformed history collapses to
/// [`Trend::InsufficientData`], never an error.
#[must_use]
pub fn classify(history: &[Measurement], config: &TrendConfig) -> Trend {
    let usable: Vec<&Measurement> = history
        .iter()
        .filter(|measurement| measurement.value.is_finite())
        .collect();

    let Some(latest) = usable.last() else {
        return Trend::InsufficientData;
    };
    if usable.len() < config.comparison_span + 1 {
        return Trend::InsufficientData;
    }
    let baseline = usable[usable.len() - 1 - config.comparison_span];

    let delta = latest.value - baseline.value;
    let threshold = config.threshold(latest.measurement_type);

    if delta >= threshold {
        Trend::Improving
    } else if delta <= -threshold {
        Trend::Worsening
    } else {
        Trend::Stable
    }
}

/// One group's classified trend, for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    /// The trend group.
    pub key: GroupKey,

    /// The classified direction.
    pub trend: Trend,

    /// The most recent usable value in the group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<f64>,

    /// Latest minus baseline, when enough records exist to compare.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,

    /// Number of measurements in the group.
    pub samples: usize,
}

/// Aggregate a patient's history and classify every trend group.
///
/// Groups come back in key order; each summary carries the classified
/// direction plus the latest value and delta for display.
///
/// # Errors
///
/// Returns a store error if the patient query fails.
pub async fn summarize(
    store: &dyn RecordStore,
    patient_id: &str,
    config: &TrendConfig,
) -> Result<Vec<TrendSummary>> {
    let history = aggregate(store, patient_id).await?;

    Ok(history
        .iter()
        .map(|(key, group)| {
            let usable: Vec<f64> = group
                .iter()
                .map(|measurement| measurement.value)
                .filter(|value| value.is_finite())
                .collect();
            let trend = classify(group.as_slice(), config);
            let delta = (usable.len() > config.comparison_span)
                .then(|| usable[usable.len() - 1] - usable[usable.len() - 1 - config.comparison_span]);

            TrendSummary {
                key: key.clone(),
                trend,
                latest: usable.last().copied(),
                delta,
                samples: group.len(),
            }
        })
        .collect())
}
