use serde::{Deserialize, Serialize};
use tourdesk_core::{Booking, CancellationState, Traveler};

/// Dashboard tabs. Membership is an independent test per bucket, so one booking can
/// sit in several buckets at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Active,
    Requested,
    Approved,
    Rejected,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [Bucket::Active, Bucket::Requested, Bucket::Approved, Bucket::Rejected];

    pub fn state(self) -> CancellationState {
        match self {
            Bucket::Active => CancellationState::None,
            Bucket::Requested => CancellationState::Requested,
            Bucket::Approved => CancellationState::Approved,
            Bucket::Rejected => CancellationState::Rejected,
        }
    }

    pub fn contains(self, booking: &Booking) -> bool {
        booking.has_traveler_in(self.state())
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct ViewBuckets<'a> {
    pub active: Vec<&'a Booking>,
    pub requested: Vec<&'a Booking>,
    pub approved: Vec<&'a Booking>,
    pub rejected: Vec<&'a Booking>,
}

impl<'a> ViewBuckets<'a> {
    pub fn get(&self, bucket: Bucket) -> &[&'a Booking] {
        match bucket {
            Bucket::Active => &self.active,
            Bucket::Requested => &self.requested,
            Bucket::Approved => &self.approved,
            Bucket::Rejected => &self.rejected,
        }
    }

    fn get_mut(&mut self, bucket: Bucket) -> &mut Vec<&'a Booking> {
        match bucket {
            Bucket::Active => &mut self.active,
            Bucket::Requested => &mut self.requested,
            Bucket::Approved => &mut self.approved,
            Bucket::Rejected => &mut self.rejected,
        }
    }
}

/// A booking listed under a bucket, with the travelers that put it there.
#[derive(Debug, PartialEq)]
pub struct BucketEntry<'a> {
    pub booking: &'a Booking,
    pub travelers: Vec<&'a Traveler>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BucketCount {
    pub bookings: usize,
    pub travelers: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_bookings: usize,
    pub total_paid: f64,
    pub active: BucketCount,
    pub requested: BucketCount,
    pub approved: BucketCount,
    pub rejected: BucketCount,
}

pub struct ViewFilter;

impl ViewFilter {
    /// Recomputed on demand from the current store contents; keeps store order.
    pub fn partition(bookings: &[Booking]) -> ViewBuckets<'_> {
        let mut buckets = ViewBuckets::default();
        for booking in bookings {
            for bucket in Bucket::ALL {
                if bucket.contains(booking) {
                    buckets.get_mut(bucket).push(booking);
                }
            }
        }
        buckets
    }

    pub fn entries(bookings: &[Booking], bucket: Bucket) -> Vec<BucketEntry<'_>> {
        bookings
            .iter()
            .filter(|b| bucket.contains(b))
            .map(|booking| BucketEntry {
                booking,
                travelers: booking.travelers_in(bucket.state()).collect(),
            })
            .collect()
    }

    pub fn summary(bookings: &[Booking]) -> DashboardSummary {
        let count = |bucket: Bucket| BucketCount {
            bookings: bookings.iter().filter(|b| bucket.contains(b)).count(),
            travelers: bookings
                .iter()
                .map(|b| b.travelers_in(bucket.state()).count())
                .sum(),
        };

        DashboardSummary {
            total_bookings: bookings.len(),
            total_paid: bookings.iter().map(|b| b.payment.paid_amount).sum(),
            active: count(Bucket::Active),
            requested: count(Bucket::Requested),
            approved: count(Bucket::Approved),
            rejected: count(Bucket::Rejected),
        }
    }
}
