//! `SQLite` schema definitions for carelog.
//!
//! This module contains the SQL statements for creating and managing
//! the local record database.

/// SQL statement to create the measurements table.
pub const CREATE_MEASUREMENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS measurements (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL,
    measurement_type TEXT NOT NULL,
    target TEXT NOT NULL,
    side TEXT NOT NULL,
    value REAL NOT NULL,
    recorded_at TEXT NOT NULL,
    recorded_by TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create the insurance cards table.
pub const CREATE_INSURANCE_CARDS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS insurance_cards (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL,
    provider TEXT NOT NULL,
    policy_number TEXT NOT NULL,
    plan TEXT,
    expires_at TEXT,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create an index on measurement patient ids.
pub const CREATE_MEASUREMENT_PATIENT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_measurements_patient ON measurements(patient_id)
";

/// SQL statement to create an index on `recorded_at` for chronological queries.
pub const CREATE_MEASUREMENT_RECORDED_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_measurements_recorded ON measurements(recorded_at)
";

/// SQL statement to create an index on card patient ids.
pub const CREATE_CARD_PATIENT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_insurance_cards_patient ON insurance_cards(patient_id)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_MEASUREMENTS_TABLE,
    CREATE_INSURANCE_CARDS_TABLE,
    CREATE_MEASUREMENT_PATIENT_INDEX,
    CREATE_MEASUREMENT_RECORDED_INDEX,
    CREATE_CARD_PATIENT_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.is_empty());
        }
    }

    #[test]
    fn test_create_measurements_table_contains_required_columns() {
        assert!(CREATE_MEASUREMENTS_TABLE.contains("id TEXT PRIMARY KEY"));
        assert!(CREATE_MEASUREMENTS_TABLE.contains("patient_id TEXT NOT NULL"));
        assert!(CREATE_MEASUREMENTS_TABLE.contains("measurement_type TEXT NOT NULL"));
        assert!(CREATE_MEASUREMENTS_TABLE.contains("value REAL NOT NULL"));
        assert!(CREATE_MEASUREMENTS_TABLE.contains("recorded_at TEXT NOT NULL"));
    }

    #[test]
    fn test_create_insurance_cards_table_contains_required_columns() {
        assert!(CREATE_INSURANCE_CARDS_TABLE.contains("id TEXT PRIMARY KEY"));
        assert!(CREATE_INSURANCE_CARDS_TABLE.contains("patient_id TEXT NOT NULL"));
        assert!(CREATE_INSURANCE_CARDS_TABLE.contains("policy_number TEXT NOT NULL"));
    }

    #[test]
    fn test_create_metadata_table_structure() {
        assert!(CREATE_METADATA_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_METADATA_TABLE.contains("value TEXT NOT NULL"));
    }
}
