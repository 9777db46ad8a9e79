use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tourdesk_core::{
    normalize_reason, ApiError, BearerToken, BookingApi, CancelRequest, EphemeralId, ServerId,
};
use tracing::{debug, info, warn};

use crate::error::DeskError;
use crate::selection::SelectionSet;
use crate::store::BookingStore;

/// A validated, fully translated cancellation request that has not been sent yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCancellation {
    pub booking_id: String,
    pub traveler_ids: Vec<ServerId>,
    pub reason: Option<String>,
    /// Selection members the request was built from.
    pub selected: Vec<EphemeralId>,
    /// Store generation at prepare time.
    pub generation: u64,
}

impl PendingCancellation {
    pub fn request(&self) -> CancelRequest {
        CancelRequest {
            traveler_ids: self.traveler_ids.clone(),
            cancellation_reason: self.reason.clone().unwrap_or_default(),
        }
    }
}

/// Handles traveler selection and multi-traveler cancellation requests.
///
/// A request goes through `prepare`, `send` and then `commit`; only `commit` mutates,
/// and only after the backend accepted.
pub struct CancellationWorkflow;

impl CancellationWorkflow {
    /// Add a traveler to the selection, rebinding the selection if it belonged to
    /// another booking. Only travelers with no cancellation on file are selectable.
    pub fn select_traveler(
        store: &BookingStore,
        selection: &mut SelectionSet,
        booking_id: &str,
        id: EphemeralId,
    ) -> Result<(), DeskError> {
        let snapshot = store.bridge().resolve(id)?;
        if snapshot.booking_id != booking_id {
            return Err(DeskError::InvalidSelection {
                id,
                reason: format!("traveler belongs to booking {}", snapshot.booking_id),
            });
        }

        let current = store
            .traveler(booking_id, &snapshot.traveler.server_id)
            .ok_or_else(|| DeskError::BookingNotFound(booking_id.to_string()))?;
        if !current.is_selectable() {
            return Err(DeskError::InvalidSelection {
                id,
                reason: format!("cancellation already {}", current.cancellation_state),
            });
        }

        selection.bind(booking_id);
        selection.insert(id);
        Ok(())
    }

    pub fn deselect_traveler(selection: &mut SelectionSet, id: EphemeralId) -> bool {
        selection.remove(id)
    }

    /// Validate the selection and translate it into backend ids. Nothing is sent and
    /// nothing is mutated; any failure aborts the whole request.
    pub fn prepare(
        store: &BookingStore,
        selection: &SelectionSet,
        booking_id: &str,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<PendingCancellation, DeskError> {
        if selection.is_empty() || !selection.is_bound_to(booking_id) {
            return Err(DeskError::EmptySelection);
        }

        let booking = store
            .booking(booking_id)
            .ok_or_else(|| DeskError::BookingNotFound(booking_id.to_string()))?;
        if !booking.can_request_cancellation(now) {
            return Err(DeskError::NotEligible {
                booking_id: booking_id.to_string(),
                reason: "tour has started or no traveler can be cancelled".to_string(),
            });
        }

        let mut traveler_ids = Vec::with_capacity(selection.len());
        let mut selected = Vec::with_capacity(selection.len());
        for id in selection.iter() {
            let snapshot = store.bridge().resolve(id)?;
            if snapshot.booking_id != booking_id {
                return Err(DeskError::InvalidSelection {
                    id,
                    reason: format!("traveler belongs to booking {}", snapshot.booking_id),
                });
            }
            let selectable = booking
                .traveler(&snapshot.traveler.server_id)
                .is_some_and(|t| t.is_selectable());
            if !selectable {
                return Err(DeskError::InvalidSelection {
                    id,
                    reason: "traveler is no longer eligible for cancellation".to_string(),
                });
            }
            traveler_ids.push(snapshot.traveler.server_id.clone());
            selected.push(id);
        }

        Ok(PendingCancellation {
            booking_id: booking_id.to_string(),
            traveler_ids,
            reason: normalize_reason(reason),
            selected,
            generation: store.generation(),
        })
    }

    /// Send a prepared request. Nothing local changes here.
    pub async fn send(
        api: &dyn BookingApi,
        token: &BearerToken,
        pending: &PendingCancellation,
        fallback: &str,
    ) -> Result<String, DeskError> {
        api.request_cancellation(token, &pending.booking_id, &pending.request())
            .await
            .map(|response| response.message)
            .map_err(|e| Self::failure(e, fallback))
    }

    /// Echo an accepted request into the store and drop the submitted travelers from
    /// the selection.
    ///
    /// The selection may have moved on while the request was in flight; members picked
    /// since then, or for another booking, stay selected.
    pub fn commit(store: &mut BookingStore, selection: &mut SelectionSet, pending: &PendingCancellation) {
        if store.generation() != pending.generation {
            debug!(
                "Bookings reloaded while cancellation for {} was in flight (generation {} -> {})",
                pending.booking_id,
                pending.generation,
                store.generation()
            );
        }
        let affected: HashSet<ServerId> = pending.traveler_ids.iter().cloned().collect();
        let applied = store.apply_cancellation_result(&pending.booking_id, &affected, pending.reason.clone());

        if selection.is_bound_to(&pending.booking_id) {
            for id in &pending.selected {
                selection.remove(*id);
            }
            if selection.is_empty() {
                selection.clear();
            }
        }
        info!(
            "Cancellation requested for {} traveler(s) on booking {}",
            applied, pending.booking_id
        );
    }

    /// Map a backend failure to the user-facing message.
    pub fn failure(error: ApiError, fallback: &str) -> DeskError {
        warn!("Cancellation request failed: {}", error);
        DeskError::submit_failed(error, fallback)
    }
}
