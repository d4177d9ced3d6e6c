//! Instrument-domain validation for clinical records.
//!
//! Validates measurement values against their instrument-specific valid
//! domain before anything is persisted: ROM against a joint-specific degree
//! range, MMT against whole grades 0-5. Cards are checked for required
//! fields. Violations surface as [`Error::Validation`](crate::Error) so the
//! form can reject invalid input before saving.

use crate::error::{Error, Result};
use crate::record::{InsuranceCard, Measurement, MeasurementType};

/// Fallback ROM range for joints without a specific entry, in degrees.
const DEFAULT_ROM_RANGE: (f64, f64) = (0.0, 180.0);

/// The lowest and highest valid MMT grade.
const MMT_RANGE: (f64, f64) = (0.0, 5.0);

/// Built-in ROM flexion ranges per joint, in degrees.
///
/// Targets not listed here fall back to [`DEFAULT_ROM_RANGE`].
const ROM_RANGES: &[(&str, f64, f64)] = &[
    ("shoulder", 0.0, 180.0),
    ("elbow", 0.0, 160.0),
    ("wrist", 0.0, 90.0),
    ("hip", 0.0, 140.0),
    ("knee", 0.0, 150.0),
    ("ankle", 0.0, 70.0),
];

/// The valid ROM degree range for the given joint target.
#[must_use]
pub fn rom_range(target: &str) -> (f64, f64) {
    let target = target.to_ascii_lowercase();
    ROM_RANGES
        .iter()
        .find(|(joint, _, _)| *joint == target)
        .map_or(DEFAULT_ROM_RANGE, |(_, lo, hi)| (*lo, *hi))
}

/// Validate a measurement against its instrument-specific domain.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the patient id is empty, the target is
/// empty, or the value lies outside the instrument's valid domain.
pub fn validate_measurement(measurement: &Measurement) -> Result<()> {
    if measurement.patient_id.is_empty() {
        return Err(Error::validation("measurement requires a patient id"));
    }
    if measurement.target.is_empty() {
        return Err(Error::validation(
            "measurement requires a joint or muscle group target",
        ));
    }
    if !measurement.value.is_finite() {
        return Err(Error::validation(format!(
            "measurement value must be finite, got {}",
            measurement.value
        )));
    }

    match measurement.measurement_type {
        MeasurementType::Rom => {
            let (lo, hi) = rom_range(&measurement.target);
            if measurement.value < lo || measurement.value > hi {
                return Err(Error::validation(format!(
                    "ROM value {} for {} outside valid range {lo}-{hi} degrees",
                    measurement.value, measurement.target
                )));
            }
        }
        MeasurementType::Mmt => {
            let (lo, hi) = MMT_RANGE;
            if measurement.value < lo || measurement.value > hi {
                return Err(Error::validation(format!(
                    "MMT grade {} outside valid range {lo}-{hi}",
                    measurement.value
                )));
            }
            if measurement.value.fract() != 0.0 {
                return Err(Error::validation(format!(
                    "MMT grade must be a whole number, got {}",
                    measurement.value
                )));
            }
        }
    }

    Ok(())
}

/// Validate an insurance card's required fields.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the patient id, provider, or policy
/// number is empty.
pub fn validate_card(card: &InsuranceCard) -> Result<()> {
    if card.patient_id.is_empty() {
        return Err(Error::validation("insurance card requires a patient id"));
    }
    if card.provider.is_empty() {
        return Err(Error::validation("insurance card requires a provider"));
    }
    if card.policy_number.is_empty() {
        return Err(Error::validation("insurance card requires a policy number"));
    }
    Ok(())
}
