//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Record a measurement.
#[derive(Debug, Args)]
pub struct MeasureCommand {
    /// The patient the measurement belongs to
    #[arg(short, long)]
    pub patient: String,

    /// The assessment instrument
    #[arg(short = 't', long = "type", value_enum)]
    pub measurement_type: MeasurementTypeArg,

    /// Joint or muscle group (e.g. knee, quadriceps)
    #[arg(long)]
    pub target: String,

    /// Body side
    #[arg(short, long, value_enum)]
    pub side: SideArg,

    /// ROM in degrees, or MMT grade (0-5)
    pub value: f64,

    /// The recording clinician
    #[arg(long = "by", value_name = "CLINICIAN")]
    pub recorded_by: String,
}

/// Insurance card commands.
#[derive(Debug, Subcommand)]
pub enum CardCommand {
    /// Save a card: updates the given id, or creates a new card
    Save {
        /// Existing card id to edit; omitted for a new card
        #[arg(long)]
        id: Option<String>,

        /// The patient the card belongs to
        #[arg(short, long)]
        patient: String,

        /// Insurance provider name
        #[arg(long)]
        provider: String,

        /// Policy number printed on the card
        #[arg(long)]
        policy_number: String,

        /// Plan or coverage tier
        #[arg(long)]
        plan: Option<String>,

        /// Card expiry as an RFC 3339 timestamp
        #[arg(long)]
        expires: Option<String>,
    },

    /// List a patient's cards
    List {
        /// The patient whose cards to list
        #[arg(short, long)]
        patient: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Delete a card by id
    Delete {
        /// The card id to delete
        id: String,
    },
}

/// Show a patient's grouped measurement history.
#[derive(Debug, Args)]
pub struct HistoryCommand {
    /// The patient whose history to show
    #[arg(short, long)]
    pub patient: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Show per-group trends for a patient.
#[derive(Debug, Args)]
pub struct TrendCommand {
    /// The patient whose trends to show
    #[arg(short, long)]
    pub patient: String,

    /// Override how many records back the baseline is taken from
    #[arg(long)]
    pub span: Option<usize>,

    /// Override the ROM threshold in degrees
    #[arg(long)]
    pub rom_threshold: Option<f64>,

    /// Override the MMT threshold in grade steps
    #[arg(long)]
    pub mmt_threshold: Option<f64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Measurement type argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MeasurementTypeArg {
    /// Range of Motion (degrees)
    Rom,
    /// Manual Muscle Testing (grade 0-5)
    Mmt,
}

impl From<MeasurementTypeArg> for crate::record::MeasurementType {
    fn from(arg: MeasurementTypeArg) -> Self {
        match arg {
            MeasurementTypeArg::Rom => Self::Rom,
            MeasurementTypeArg::Mmt => Self::Mmt,
        }
    }
}

/// Body side argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SideArg {
    /// Left side
    Left,
    /// Right side
    Right,
    /// Both sides assessed together
    Bilateral,
}

impl From<SideArg> for crate::record::Side {
    fn from(arg: SideArg) -> Self {
        match arg {
            SideArg::Left => Self::Left,
            SideArg::Right => Self::Right,
            SideArg::Bilateral => Self::Bilateral,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_type_arg_conversion() {
        assert_eq!(
            crate::record::MeasurementType::from(MeasurementTypeArg::Rom),
            crate::record::MeasurementType::Rom
        );
        assert_eq!(
            crate::record::MeasurementType::from(MeasurementTypeArg::Mmt),
            crate::record::MeasurementType::Mmt
        );
    }

    #[test]
    fn test_side_arg_conversion() {
        assert_eq!(
            crate::record::Side::from(SideArg::Left),
            crate::record::Side::Left
        );
        assert_eq!(
            crate::record::Side::from(SideArg::Right),
            crate::record::Side::Right
        );
        assert_eq!(
            crate::record::Side::from(SideArg::Bilateral),
            crate::record::Side::Bilateral
        );
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_measure_command_debug() {
        let cmd = MeasureCommand {
            patient: "P1".to_string(),
            measurement_type: MeasurementTypeArg::Rom,
            target: "knee".to_string(),
            side: SideArg::Right,
            value: 95.0,
            recorded_by: "dr-suzuki".to_string(),
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("patient"));
        assert!(debug_str.contains("knee"));
    }

    #[test]
    fn test_card_command_debug() {
        let cmd = CardCommand::Delete {
            id: "card-1".to_string(),
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Delete"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
