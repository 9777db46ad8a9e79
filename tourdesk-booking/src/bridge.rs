use std::collections::HashMap;
use tourdesk_core::{Booking, EphemeralId, Traveler};

/// Traveler as it looked when the booking list was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct TravelerSnapshot {
    pub booking_id: String,
    pub traveler: Traveler,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("traveler key {id} was issued by fetch {}, current fetch is {current}", .id.generation())]
    Stale { id: EphemeralId, current: u64 },

    #[error("unknown traveler key {0}")]
    Unknown(EphemeralId),
}

/// Ephemeral id -> fetch-time traveler snapshot. Built once per fetch and never
/// mutated; current traveler state lives in the booking store.
#[derive(Debug, Clone, Default)]
pub struct IdentifierBridge {
    generation: u64,
    entries: HashMap<EphemeralId, TravelerSnapshot>,
}

impl IdentifierBridge {
    pub fn empty(generation: u64) -> Self {
        Self {
            generation,
            entries: HashMap::new(),
        }
    }

    pub fn build(generation: u64, bookings: &[Booking]) -> Self {
        let entries = bookings
            .iter()
            .flat_map(|booking| {
                booking.travelers.iter().map(move |traveler| {
                    (
                        traveler.ephemeral_id,
                        TravelerSnapshot {
                            booking_id: booking.booking_id.clone(),
                            traveler: traveler.clone(),
                        },
                    )
                })
            })
            .collect();

        Self {
            generation,
            entries,
        }
    }

    pub fn resolve(&self, id: EphemeralId) -> Result<&TravelerSnapshot, LookupError> {
        if id.generation() != self.generation {
            return Err(LookupError::Stale {
                id,
                current: self.generation,
            });
        }
        self.entries.get(&id).ok_or(LookupError::Unknown(id))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
