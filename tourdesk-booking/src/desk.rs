use chrono::Utc;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tourdesk_core::{BearerToken, Booking, BookingApi, EphemeralId, ServerId};
use tourdesk_shared::DeskEvent;
use tracing::{info, warn};

use crate::cancellation::CancellationWorkflow;
use crate::error::DeskError;
use crate::selection::SelectionSet;
use crate::store::BookingStore;
use crate::view::{DashboardSummary, ViewFilter};
use crate::withdrawal::WithdrawalWorkflow;

#[derive(Debug, Clone)]
pub struct DeskSettings {
    pub default_cancel_message: String,
    pub default_withdraw_message: String,
    pub event_buffer: usize,
}

impl Default for DeskSettings {
    fn default() -> Self {
        Self {
            default_cancel_message: "Failed to submit cancellation request.".to_string(),
            default_withdraw_message: "Failed to withdraw cancellation request.".to_string(),
            event_buffer: 100,
        }
    }
}

/// Point-in-time copy of everything the dashboard renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeskSnapshot {
    pub generation: u64,
    pub loaded: bool,
    pub bookings: Vec<Booking>,
    pub selected_booking: Option<String>,
    pub selected_travelers: Vec<EphemeralId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum InFlightKey {
    Cancel(String),
    Withdraw(String, ServerId),
}

#[derive(Default)]
struct DeskState {
    store: BookingStore,
    selection: SelectionSet,
    in_flight: HashSet<InFlightKey>,
}

/// One dashboard session: the booking store, the current selection, and the
/// workflows that act on them.
///
/// Every mutation happens under one state lock, so the store has a single writer. The
/// state lock is never held across a backend call. A per-action in-flight key stops the
/// same cancel or withdraw being sent twice, and `load_gate` lets only one fetch run at
/// a time without blocking readers.
pub struct BookingDesk {
    api: Arc<dyn BookingApi>,
    token: BearerToken,
    settings: DeskSettings,
    state: Mutex<DeskState>,
    load_gate: Mutex<()>,
    events: broadcast::Sender<DeskEvent>,
}

impl BookingDesk {
    pub fn new(api: Arc<dyn BookingApi>, token: BearerToken, settings: DeskSettings) -> Self {
        let (events, _) = broadcast::channel(settings.event_buffer.max(1));
        Self {
            api,
            token,
            settings,
            state: Mutex::new(DeskState::default()),
            load_gate: Mutex::new(()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeskEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: DeskEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Replace all bookings with a fresh fetch. Previously issued traveler keys and the
    /// current selection are invalidated whether or not the fetch succeeds.
    pub async fn load(&self) -> Result<Vec<Booking>, DeskError> {
        let _gate = self.load_gate.lock().await;
        self.reload().await
    }

    /// Load only if this session has no bookings yet. Concurrent first callers share
    /// one fetch.
    pub async fn ensure_loaded(&self) -> Result<(), DeskError> {
        let _gate = self.load_gate.lock().await;
        if self.state.lock().await.store.is_loaded() {
            return Ok(());
        }
        self.reload().await.map(|_| ())
    }

    /// Callers hold `load_gate`.
    async fn reload(&self) -> Result<Vec<Booking>, DeskError> {
        let fetched = BookingStore::fetch(self.api.as_ref(), &self.token).await;

        let mut state = self.state.lock().await;
        state.selection.clear();
        let result = state.store.apply_fetch(fetched).map(|bookings| bookings.to_vec());
        let generation = state.store.generation();
        drop(state);

        match &result {
            Ok(bookings) => self.publish(DeskEvent::Loaded {
                generation,
                bookings: bookings.len(),
                timestamp: DeskEvent::now(),
            }),
            Err(e) => self.publish(DeskEvent::LoadFailed {
                message: e.to_string(),
                timestamp: DeskEvent::now(),
            }),
        }
        result
    }

    pub async fn snapshot(&self) -> DeskSnapshot {
        let state = self.state.lock().await;
        DeskSnapshot {
            generation: state.store.generation(),
            loaded: state.store.is_loaded(),
            bookings: state.store.bookings().to_vec(),
            selected_booking: state.selection.booking_id().map(str::to_string),
            selected_travelers: state.selection.iter().collect(),
        }
    }

    pub async fn bookings(&self) -> Vec<Booking> {
        self.state.lock().await.store.bookings().to_vec()
    }

    pub async fn selection(&self) -> SelectionSet {
        self.state.lock().await.selection.clone()
    }

    pub async fn summary(&self) -> DashboardSummary {
        ViewFilter::summary(self.state.lock().await.store.bookings())
    }

    pub async fn select_traveler(&self, booking_id: &str, id: EphemeralId) -> Result<(), DeskError> {
        let mut state = self.state.lock().await;
        let DeskState { store, selection, .. } = &mut *state;
        if let Err(e) = CancellationWorkflow::select_traveler(store, selection, booking_id, id) {
            warn!("Rejected selection of {} on booking {}: {}", id, booking_id, e);
            return Err(e);
        }
        let size = selection.len();
        drop(state);

        self.publish(DeskEvent::SelectionChanged {
            booking_id: Some(booking_id.to_string()),
            size,
            timestamp: DeskEvent::now(),
        });
        Ok(())
    }

    pub async fn deselect_traveler(&self, id: EphemeralId) -> bool {
        let mut state = self.state.lock().await;
        let removed = CancellationWorkflow::deselect_traveler(&mut state.selection, id);
        let booking_id = state.selection.booking_id().map(str::to_string);
        let size = state.selection.len();
        drop(state);

        if removed {
            self.publish(DeskEvent::SelectionChanged {
                booking_id,
                size,
                timestamp: DeskEvent::now(),
            });
        }
        removed
    }

    /// Send a cancellation request for the selected travelers of `booking_id`.
    pub async fn submit(&self, booking_id: &str, reason: Option<String>) -> Result<String, DeskError> {
        let key = InFlightKey::Cancel(booking_id.to_string());
        let pending = {
            let mut state = self.state.lock().await;
            if state.in_flight.contains(&key) {
                return Err(DeskError::InFlight(booking_id.to_string()));
            }
            let pending = CancellationWorkflow::prepare(
                &state.store,
                &state.selection,
                booking_id,
                reason,
                Utc::now(),
            )
            .inspect_err(|e| warn!("Cancellation for booking {} not sent: {}", booking_id, e))?;
            state.in_flight.insert(key.clone());
            pending
        };

        let result = CancellationWorkflow::send(
            self.api.as_ref(),
            &self.token,
            &pending,
            &self.settings.default_cancel_message,
        )
        .await;

        let mut state = self.state.lock().await;
        state.in_flight.remove(&key);
        let message = result?;

        let DeskState { store, selection, .. } = &mut *state;
        CancellationWorkflow::commit(store, selection, &pending);
        drop(state);

        self.publish(DeskEvent::CancellationRequested {
            booking_id: pending.booking_id.clone(),
            traveler_ids: pending.traveler_ids.iter().map(|id| id.to_string()).collect(),
            reason: pending.reason.clone(),
            timestamp: DeskEvent::now(),
        });
        Ok(message)
    }

    /// Revoke the pending cancellation request of one traveler.
    pub async fn withdraw(&self, booking_id: &str, id: EphemeralId) -> Result<String, DeskError> {
        let (pending, key) = {
            let mut state = self.state.lock().await;
            let pending = WithdrawalWorkflow::prepare(&state.store, booking_id, id)
                .inspect_err(|e| warn!("Withdrawal for booking {} not sent: {}", booking_id, e))?;
            let key = InFlightKey::Withdraw(booking_id.to_string(), pending.server_id.clone());
            if !state.in_flight.insert(key.clone()) {
                return Err(DeskError::InFlight(booking_id.to_string()));
            }
            (pending, key)
        };

        let result = WithdrawalWorkflow::send(
            self.api.as_ref(),
            &self.token,
            &pending,
            &self.settings.default_withdraw_message,
        )
        .await;

        let mut state = self.state.lock().await;
        state.in_flight.remove(&key);
        let message = result?;

        WithdrawalWorkflow::commit(&mut state.store, &pending);
        drop(state);

        self.publish(DeskEvent::CancellationWithdrawn {
            booking_id: pending.booking_id.clone(),
            traveler_id: pending.server_id.to_string(),
            timestamp: DeskEvent::now(),
        });
        info!("Withdrawal confirmed for booking {}", pending.booking_id);
        Ok(message)
    }
}
