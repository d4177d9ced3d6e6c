//! Record resolution for edit/create forms.
//!
//! Given an optional existing-record id, the resolver produces the initial
//! editing state for a form: the existing record, or create mode. An
//! unresolvable id must never block the editing flow, so missing records
//! and store failures degrade to create mode instead of propagating.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::record::{EntityKind, InsuranceCard, Measurement, StoredRecord};
use crate::store::RecordStore;

/// The initial editing state produced for a form.
///
/// `Found` and `CreateMode` are the only observable outcomes: a store
/// failure during resolution is internal and collapses to `CreateMode`.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedState<T> {
    /// The form edits this existing record.
    Found(T),
    /// The form creates a new record.
    CreateMode,
}

impl<T> ResolvedState<T> {
    /// Check whether the form should start in create mode.
    #[must_use]
    pub fn is_create_mode(&self) -> bool {
        matches!(self, Self::CreateMode)
    }

    /// The resolved record, if one was found.
    #[must_use]
    pub fn found(&self) -> Option<&T> {
        match self {
            Self::Found(record) => Some(record),
            Self::CreateMode => None,
        }
    }
}

/// Resolve an optional insurance card id to a form state.
///
/// With no id the store is never consulted and the result is `CreateMode`.
/// With an id, a single store read is issued; any failure (missing record,
/// store error, or a record of the wrong kind under the id) is logged and
/// degrades to `CreateMode`.
pub async fn resolve_card(
    store: &dyn RecordStore,
    record_id: Option<&str>,
) -> ResolvedState<InsuranceCard> {
    match resolve_record(store, record_id, EntityKind::InsuranceCard).await {
        ResolvedState::Found(StoredRecord::InsuranceCard(card)) => ResolvedState::Found(card),
        _ => ResolvedState::CreateMode,
    }
}

/// Resolve an optional measurement id to a form state.
///
/// Same contract as [`resolve_card`].
pub async fn resolve_measurement(
    store: &dyn RecordStore,
    record_id: Option<&str>,
) -> ResolvedState<Measurement> {
    match resolve_record(store, record_id, EntityKind::Measurement).await {
        ResolvedState::Found(StoredRecord::Measurement(measurement)) => {
            ResolvedState::Found(measurement)
        }
        _ => ResolvedState::CreateMode,
    }
}

async fn resolve_record(
    store: &dyn RecordStore,
    record_id: Option<&str>,
    kind: EntityKind,
) -> ResolvedState<StoredRecord> {
    let Some(id) = record_id else {
        return ResolvedState::CreateMode;
    };

    match store.find(id).await {
        Ok(record) if record.kind() == kind => {
            debug!(id, %kind, "resolved existing record");
            ResolvedState::Found(record)
        }
        Ok(record) => {
            warn!(
                id,
                expected = %kind,
                actual = %record.kind(),
                "record under id has wrong kind; falling back to create mode"
            );
            ResolvedState::CreateMode
        }
        Err(err) => {
            warn!(id, %err, "record resolution failed; falling back to create mode");
            ResolvedState::CreateMode
        }
    }
}

/// Liveness tracking for a screen instance.
///
/// A session hands out generation-stamped [`LivenessToken`]s. When the
/// screen is dismissed (or navigates to a different record), calling
/// [`invalidate`](Self::invalidate) bumps the generation so tokens issued
/// earlier go stale, and in-flight resolutions guarded by them are
/// discarded instead of delivered.
#[derive(Debug, Clone, Default)]
pub struct ScreenSession {
    generation: Arc<AtomicU64>,
}

impl ScreenSession {
    /// Create a new session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token tied to the session's current generation.
    #[must_use]
    pub fn token(&self) -> LivenessToken {
        LivenessToken {
            generation: Arc::clone(&self.generation),
            seen: self.generation.load(Ordering::SeqCst),
        }
    }

    /// Invalidate all previously issued tokens.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

/// A generation-stamped handle guarding one in-flight async result.
#[derive(Debug, Clone)]
pub struct LivenessToken {
    generation: Arc<AtomicU64>,
    seen: u64,
}

impl LivenessToken {
    /// Check whether the owning session still wants this token's result.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.seen
    }
}

/// Resolve a card id, discarding the result if the session moved on.
///
/// The store read runs to completion either way; the token is re-checked
/// after it completes, and `None` is returned when the token went stale
/// mid-flight so a stale result never mutates a live screen's state.
pub async fn resolve_card_guarded(
    store: &dyn RecordStore,
    record_id: Option<&str>,
    token: &LivenessToken,
) -> Option<ResolvedState<InsuranceCard>> {
    let resolved = resolve_card(store, record_id).await;
    if token.is_live() {
        Some(resolved)
    } else {
        debug!("discarding stale card resolution");
        None
    }
}

/// Resolve a measurement id, discarding the result if the session moved on.
///
/// Same contract as [`resolve_card_guarded`].
pub async fn resolve_measurement_guarded(
    store: &dyn RecordStore,
    record_id: Option<&str>,
    token: &LivenessToken,
) -> Option<ResolvedState<Measurement>> {
    let resolved = resolve_measurement(store, record_id).await;
    if token.is_live() {
        Some(resolved)
    } else {
        debug!("discarding stale measurement resolution");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;

    use crate::error::{Error, Result};
    use crate::record::{MeasurementType, Side};

    /// In-memory store fake that counts reads and can be forced to fail.
    #[derive(Debug, Default)]
    struct FakeStore {
        records: Vec<StoredRecord>,
        find_calls: AtomicUsize,
        fail_finds: bool,
    }

    impl FakeStore {
        fn with_records(records: Vec<StoredRecord>) -> Self {
            Self {
                records,
                ..Self::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail_finds: true,
                ..Self::default()
            }
        }

        fn find_count(&self) -> usize {
            self.find_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RecordStore for FakeStore {
        async fn find(&self, id: &str) -> Result<StoredRecord> {
            self.find_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_finds {
                return Err(Error::internal("store unavailable"));
            }
            self.records
                .iter()
                .find(|record| record.id() == id)
                .cloned()
                .ok_or_else(|| Error::not_found(id))
        }

        async fn query_by_patient(
            &self,
            patient_id: &str,
            kind: EntityKind,
        ) -> Result<Vec<StoredRecord>> {
            Ok(self
                .records
                .iter()
                .filter(|record| record.patient_id() == patient_id && record.kind() == kind)
                .cloned()
                .collect())
        }

        async fn save(&self, record: StoredRecord) -> Result<StoredRecord> {
            Ok(record)
        }

        async fn delete(&self, _id: &str) -> Result<bool> {
            Ok(false)
        }
    }

    fn card() -> InsuranceCard {
        InsuranceCard::new("P1", "Acme Health", "POL-12345")
    }

    #[tokio::test]
    async fn test_absent_id_yields_create_mode_without_store_call() {
        let store = FakeStore::default();

        let resolved = resolve_card(&store, None).await;

        assert!(resolved.is_create_mode());
        assert_eq!(store.find_count(), 0);
    }

    #[tokio::test]
    async fn test_present_id_yields_found_record() {
        let card = card();
        let id = card.id.clone();
        let store = FakeStore::with_records(vec![StoredRecord::InsuranceCard(card.clone())]);

        let resolved = resolve_card(&store, Some(&id)).await;

        assert_eq!(resolved.found(), Some(&card));
        assert_eq!(store.find_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_id_degrades_to_create_mode() {
        let store = FakeStore::default();

        let resolved = resolve_card(&store, Some("dangling-id")).await;

        assert!(resolved.is_create_mode());
        assert_eq!(store.find_count(), 1);
    }

    #[tokio::test]
    async fn test_store_error_degrades_to_create_mode() {
        let store = FakeStore::failing();

        let resolved = resolve_card(&store, Some("any-id")).await;

        assert!(resolved.is_create_mode());
    }

    #[tokio::test]
    async fn test_wrong_kind_degrades_to_create_mode() {
        let measurement =
            Measurement::new("P1", MeasurementType::Rom, "knee", Side::Right, 90.0, "c");
        let id = measurement.id.clone();
        let store = FakeStore::with_records(vec![StoredRecord::Measurement(measurement)]);

        let resolved = resolve_card(&store, Some(&id)).await;

        assert!(resolved.is_create_mode());
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let card = card();
        let id = card.id.clone();
        let store = FakeStore::with_records(vec![StoredRecord::InsuranceCard(card.clone())]);

        let first = resolve_card(&store, Some(&id)).await;
        let second = resolve_card(&store, Some(&id)).await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_resolve_measurement_found() {
        let measurement =
            Measurement::new("P1", MeasurementType::Mmt, "deltoid", Side::Left, 4.0, "c");
        let id = measurement.id.clone();
        let store = FakeStore::with_records(vec![StoredRecord::Measurement(measurement.clone())]);

        let resolved = resolve_measurement(&store, Some(&id)).await;

        assert_eq!(resolved.found(), Some(&measurement));
    }

    #[tokio::test]
    async fn test_guarded_resolution_delivers_while_live() {
        let card = card();
        let id = card.id.clone();
        let store = FakeStore::with_records(vec![StoredRecord::InsuranceCard(card.clone())]);
        let session = ScreenSession::new();
        let token = session.token();

        let resolved = resolve_card_guarded(&store, Some(&id), &token).await;

        assert_eq!(resolved, Some(ResolvedState::Found(card)));
    }

    #[tokio::test]
    async fn test_guarded_resolution_discards_stale_result() {
        let card = card();
        let id = card.id.clone();
        let store = FakeStore::with_records(vec![StoredRecord::InsuranceCard(card)]);
        let session = ScreenSession::new();
        let token = session.token();

        // Screen dismissed while the resolve is in flight.
        session.invalidate();

        let resolved = resolve_card_guarded(&store, Some(&id), &token).await;
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_tokens_issued_after_invalidate_are_live() {
        let session = ScreenSession::new();
        let stale = session.token();
        session.invalidate();
        let fresh = session.token();

        assert!(!stale.is_live());
        assert!(fresh.is_live());
    }

    #[test]
    fn test_resolved_state_accessors() {
        let state: ResolvedState<i32> = ResolvedState::Found(7);
        assert!(!state.is_create_mode());
        assert_eq!(state.found(), Some(&7));

        let state: ResolvedState<i32> = ResolvedState::CreateMode;
        assert!(state.is_create_mode());
        assert_eq!(state.found(), None);
    }
}
