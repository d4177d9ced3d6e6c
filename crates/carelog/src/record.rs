//! Core record types for carelog.
//!
//! This module defines the clinical entities tracked on-device: insurance
//! cards and ROM/MMT measurements. Both reference their owning patient by
//! an opaque string id only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The assessment instrument that produced a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementType {
    /// Range of Motion, recorded in degrees.
    Rom,
    /// Manual Muscle Testing, recorded as an ordinal grade (0-5).
    Mmt,
}

impl std::fmt::Display for MeasurementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rom => write!(f, "rom"),
            Self::Mmt => write!(f, "mmt"),
        }
    }
}

impl std::str::FromStr for MeasurementType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s {
            "rom" => Ok(Self::Rom),
            "mmt" => Ok(Self::Mmt),
            other => Err(crate::error::Error::validation(format!(
                "unknown measurement type: {other}"
            ))),
        }
    }
}

/// The body side a measurement was taken on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Left side.
    Left,
    /// Right side.
    Right,
    /// Both sides assessed together.
    Bilateral,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
            Self::Bilateral => write!(f, "bilateral"),
        }
    }
}

impl std::str::FromStr for Side {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "bilateral" => Ok(Self::Bilateral),
            other => Err(crate::error::Error::validation(format!(
                "unknown side: {other}"
            ))),
        }
    }
}

/// The kind of entity a store query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Insurance card records.
    InsuranceCard,
    /// ROM/MMT measurement records.
    Measurement,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsuranceCard => write!(f, "insurance_card"),
            Self::Measurement => write!(f, "measurement"),
        }
    }
}

/// A single ROM or MMT measurement.
///
/// Measurements are immutable historical facts. Corrections are appended
/// as new measurements, never edited in place; `recorded_at` is set at
/// creation and never revised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Unique identifier for this measurement.
    pub id: String,

    /// The owning patient. Required and immutable.
    pub patient_id: String,

    /// The instrument that produced this measurement.
    pub measurement_type: MeasurementType,

    /// Joint or muscle group identifier (e.g. "knee", "quadriceps").
    pub target: String,

    /// The body side the measurement was taken on.
    pub side: Side,

    /// ROM in degrees, or MMT as an ordinal grade.
    pub value: f64,

    /// When this measurement was taken.
    pub recorded_at: DateTime<Utc>,

    /// The clinician who recorded this measurement.
    pub recorded_by: String,
}

impl Measurement {
    /// Create a new measurement with a fresh id, recorded now.
    #[must_use]
    pub fn new(
        patient_id: impl Into<String>,
        measurement_type: MeasurementType,
        target: impl Into<String>,
        side: Side,
        value: f64,
        recorded_by: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: patient_id.into(),
            measurement_type,
            target: target.into(),
            side,
            value,
            recorded_at: Utc::now(),
            recorded_by: recorded_by.into(),
        }
    }
}

/// An insurance card on file for a patient.
///
/// Cards are mutable: a form save updates an existing card by id or inserts
/// a new one. Cards are deleted explicitly by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceCard {
    /// Unique identifier for this card.
    pub id: String,

    /// The owning patient. Required.
    pub patient_id: String,

    /// The insurance provider name.
    pub provider: String,

    /// The policy number printed on the card.
    pub policy_number: String,

    /// Plan or coverage tier, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,

    /// When the card expires, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// When this card was last saved.
    pub updated_at: DateTime<Utc>,
}

impl InsuranceCard {
    /// Create a new card with a fresh id.
    #[must_use]
    pub fn new(
        patient_id: impl Into<String>,
        provider: impl Into<String>,
        policy_number: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: patient_id.into(),
            provider: provider.into(),
            policy_number: policy_number.into(),
            plan: None,
            expires_at: None,
            updated_at: Utc::now(),
        }
    }
}

/// A record as held by the store, tagged with its entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoredRecord {
    /// An insurance card record.
    InsuranceCard(InsuranceCard),
    /// A measurement record.
    Measurement(Measurement),
}

impl StoredRecord {
    /// The record's unique identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::InsuranceCard(card) => &card.id,
            Self::Measurement(measurement) => &measurement.id,
        }
    }

    /// The owning patient's identifier.
    #[must_use]
    pub fn patient_id(&self) -> &str {
        match self {
            Self::InsuranceCard(card) => &card.patient_id,
            Self::Measurement(measurement) => &measurement.patient_id,
        }
    }

    /// The entity kind of this record.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::InsuranceCard(_) => EntityKind::InsuranceCard,
            Self::Measurement(_) => EntityKind::Measurement,
        }
    }
}

impl From<InsuranceCard> for StoredRecord {
    fn from(card: InsuranceCard) -> Self {
        Self::InsuranceCard(card)
    }
}

impl From<Measurement> for StoredRecord {
    fn from(measurement: Measurement) -> Self {
        Self::Measurement(measurement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_type_display() {
        assert_eq!(MeasurementType::Rom.to_string(), "rom");
        assert_eq!(MeasurementType::Mmt.to_string(), "mmt");
    }

    #[test]
    fn test_measurement_type_parse() {
        assert_eq!("rom".parse::<MeasurementType>().unwrap(), MeasurementType::Rom);
        assert_eq!("mmt".parse::<MeasurementType>().unwrap(), MeasurementType::Mmt);
        assert!("emg".parse::<MeasurementType>().is_err());
    }

    #[test]
    fn test_side_display() {
        assert_eq!(Side::Left.to_string(), "left");
        assert_eq!(Side::Right.to_string(), "right");
        assert_eq!(Side::Bilateral.to_string(), "bilateral");
    }

    #[test]
    fn test_side_parse() {
        assert_eq!("left".parse::<Side>().unwrap(), Side::Left);
        assert_eq!("right".parse::<Side>().unwrap(), Side::Right);
        assert_eq!("bilateral".parse::<Side>().unwrap(), Side::Bilateral);
        assert!("dorsal".parse::<Side>().is_err());
    }

    #[test]
    fn test_entity_kind_display() {
        assert_eq!(EntityKind::InsuranceCard.to_string(), "insurance_card");
        assert_eq!(EntityKind::Measurement.to_string(), "measurement");
    }

    #[test]
    fn test_measurement_new() {
        let measurement = Measurement::new(
            "P1",
            MeasurementType::Rom,
            "knee",
            Side::Right,
            95.0,
            "dr-suzuki",
        );

        assert!(!measurement.id.is_empty());
        assert_eq!(measurement.patient_id, "P1");
        assert_eq!(measurement.measurement_type, MeasurementType::Rom);
        assert_eq!(measurement.target, "knee");
        assert_eq!(measurement.side, Side::Right);
        assert!((measurement.value - 95.0).abs() < f64::EPSILON);
        assert_eq!(measurement.recorded_by, "dr-suzuki");
    }

    #[test]
    fn test_measurement_ids_are_unique() {
        let a = Measurement::new("P1", MeasurementType::Mmt, "quadriceps", Side::Left, 4.0, "c");
        let b = Measurement::new("P1", MeasurementType::Mmt, "quadriceps", Side::Left, 4.0, "c");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_insurance_card_new() {
        let card = InsuranceCard::new("P1", "Acme Health", "POL-12345");

        assert!(!card.id.is_empty());
        assert_eq!(card.patient_id, "P1");
        assert_eq!(card.provider, "Acme Health");
        assert_eq!(card.policy_number, "POL-12345");
        assert!(card.plan.is_none());
        assert!(card.expires_at.is_none());
    }

    #[test]
    fn test_stored_record_accessors() {
        let card = InsuranceCard::new("P1", "Acme Health", "POL-12345");
        let card_id = card.id.clone();
        let record = StoredRecord::from(card);

        assert_eq!(record.id(), card_id);
        assert_eq!(record.patient_id(), "P1");
        assert_eq!(record.kind(), EntityKind::InsuranceCard);

        let measurement =
            Measurement::new("P2", MeasurementType::Rom, "elbow", Side::Left, 120.0, "c");
        let record = StoredRecord::from(measurement);
        assert_eq!(record.patient_id(), "P2");
        assert_eq!(record.kind(), EntityKind::Measurement);
    }

    #[test]
    fn test_measurement_serialization() {
        let measurement = Measurement::new(
            "P1",
            MeasurementType::Mmt,
            "deltoid",
            Side::Bilateral,
            3.0,
            "dr-sato",
        );

        let json = serde_json::to_string(&measurement).unwrap();
        let deserialized: Measurement = serde_json::from_str(&json).unwrap();

        assert_eq!(measurement, deserialized);
        assert!(json.contains("\"mmt\""));
        assert!(json.contains("\"bilateral\""));
    }

    #[test]
    fn test_stored_record_serialization_tags_kind() {
        let record = StoredRecord::from(InsuranceCard::new("P1", "Acme", "POL-1"));
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"kind\":\"insurance_card\""));
    }
}
