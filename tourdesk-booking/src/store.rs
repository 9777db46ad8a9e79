use std::collections::HashSet;
use tourdesk_core::{BearerToken, Booking, BookingApi, EphemeralId, ServerId, Traveler, WireBooking};
use tracing::{info, warn};

use crate::bridge::IdentifierBridge;
use crate::error::DeskError;

/// Single source of truth for the bookings shown on the dashboard.
///
/// Only two mutators exist besides `load`, and both echo a backend response that has
/// already been accepted; there is nothing to roll back when a request fails.
#[derive(Debug, Default)]
pub struct BookingStore {
    bookings: Vec<Booking>,
    bridge: IdentifierBridge,
    generation: u64,
    loaded: bool,
}

impl BookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the booking list without touching any store, so no lock needs to be
    /// held while the request is on the wire.
    pub async fn fetch(api: &dyn BookingApi, token: &BearerToken) -> Result<Vec<WireBooking>, DeskError> {
        api.list_bookings(token).await.map_err(DeskError::fetch_failed)
    }

    /// Install the outcome of a fetch.
    ///
    /// On failure the store is emptied rather than left holding the previous fetch.
    pub fn apply_fetch(
        &mut self,
        fetched: Result<Vec<WireBooking>, DeskError>,
    ) -> Result<&[Booking], DeskError> {
        match fetched {
            Ok(wire) => Ok(self.replace(wire)),
            Err(e) => {
                self.clear();
                Err(e)
            }
        }
    }

    /// Fetch the booking list and replace all state with it.
    pub async fn load(
        &mut self,
        api: &dyn BookingApi,
        token: &BearerToken,
    ) -> Result<&[Booking], DeskError> {
        let fetched = Self::fetch(api, token).await;
        self.apply_fetch(fetched)
    }

    /// Materializes a fetched list under a new generation of ephemeral ids.
    pub fn replace(&mut self, wire: Vec<WireBooking>) -> &[Booking] {
        self.generation += 1;
        let generation = self.generation;

        let mut next_index: u32 = 0;
        let mut seen = HashSet::new();
        let mut bookings = Vec::with_capacity(wire.len());
        for booking in wire {
            if !seen.insert(booking.booking_id.clone()) {
                warn!("Dropping duplicate booking {} from booking list", booking.booking_id);
                continue;
            }
            bookings.push(booking.into_booking(|| {
                let id = EphemeralId::new(generation, next_index);
                next_index += 1;
                id
            }));
        }

        self.bridge = IdentifierBridge::build(generation, &bookings);
        self.bookings = bookings;
        self.loaded = true;

        info!(
            "Loaded {} bookings with {} travelers (generation {})",
            self.bookings.len(),
            self.bridge.len(),
            generation
        );
        &self.bookings
    }

    /// Drops every booking and invalidates all previously issued ephemeral ids.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.bookings.clear();
        self.bridge = IdentifierBridge::empty(self.generation);
        self.loaded = false;
    }

    /// Marks the affected travelers of `booking_id` as requested. Matching is by server
    /// id, so the echo still lands after a reload issued new ephemeral ids. Re-applying
    /// is harmless and travelers the backend already decided are skipped.
    /// Returns how many travelers were marked.
    pub fn apply_cancellation_result(
        &mut self,
        booking_id: &str,
        affected: &HashSet<ServerId>,
        reason: Option<String>,
    ) -> usize {
        let Some(booking) = self.booking_mut(booking_id) else {
            warn!("Cancellation result for unknown booking {}", booking_id);
            return 0;
        };

        let mut applied = 0;
        for traveler in booking
            .travelers
            .iter_mut()
            .filter(|t| affected.contains(&t.server_id))
        {
            if traveler.record_cancellation_request(reason.clone()) {
                applied += 1;
            }
        }
        applied
    }

    /// Resets one traveler's pending request. Approved or rejected travelers are left alone.
    pub fn apply_withdrawal_result(&mut self, booking_id: &str, server_id: &ServerId) -> bool {
        self.booking_mut(booking_id)
            .and_then(|b| b.traveler_mut(server_id))
            .map(|t| t.record_withdrawal())
            .unwrap_or(false)
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    pub fn booking(&self, booking_id: &str) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.booking_id == booking_id)
    }

    fn booking_mut(&mut self, booking_id: &str) -> Option<&mut Booking> {
        self.bookings.iter_mut().find(|b| b.booking_id == booking_id)
    }

    /// Current (not fetch-time) state of a traveler.
    pub fn traveler(&self, booking_id: &str, server_id: &ServerId) -> Option<&Traveler> {
        self.booking(booking_id).and_then(|b| b.traveler(server_id))
    }

    pub fn bridge(&self) -> &IdentifierBridge {
        &self.bridge
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}
