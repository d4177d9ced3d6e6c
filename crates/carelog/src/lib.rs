//! `carelog` - offline-first clinical records core
//!
//! This library tracks patients' insurance cards and ROM/MMT assessments in
//! a local, on-device store, resolves edit-or-create form state from
//! optional record ids, and derives directional trend indicators from a
//! patient's measurement history.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod record;
pub mod resolver;
pub mod store;
pub mod trend;
pub mod validate;

pub use config::Config;
pub use error::{Error, Result};
pub use history::{aggregate, GroupHistory, GroupKey, MeasurementHistory};
pub use logging::init_logging;
pub use record::{EntityKind, InsuranceCard, Measurement, MeasurementType, Side, StoredRecord};
pub use resolver::{resolve_card, resolve_measurement, ResolvedState, ScreenSession};
pub use store::{RecordStore, SqliteStore};
pub use trend::{classify, summarize, Trend, TrendConfig, TrendSummary};
