use std::collections::BTreeSet;
use tourdesk_core::EphemeralId;

/// Travelers picked for the next cancellation request, scoped to one booking at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSet {
    booking_id: Option<String>,
    members: BTreeSet<EphemeralId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points the selection at `booking_id`, dropping members picked for another booking.
    pub fn bind(&mut self, booking_id: &str) {
        if self.booking_id.as_deref() != Some(booking_id) {
            self.members.clear();
            self.booking_id = Some(booking_id.to_string());
        }
    }

    pub fn insert(&mut self, id: EphemeralId) -> bool {
        self.members.insert(id)
    }

    pub fn remove(&mut self, id: EphemeralId) -> bool {
        self.members.remove(&id)
    }

    pub fn clear(&mut self) {
        self.booking_id = None;
        self.members.clear();
    }

    pub fn contains(&self, id: EphemeralId) -> bool {
        self.members.contains(&id)
    }

    pub fn booking_id(&self) -> Option<&str> {
        self.booking_id.as_deref()
    }

    pub fn is_bound_to(&self, booking_id: &str) -> bool {
        self.booking_id.as_deref() == Some(booking_id)
    }

    /// Members in fetch order.
    pub fn iter(&self) -> impl Iterator<Item = EphemeralId> + '_ {
        self.members.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
