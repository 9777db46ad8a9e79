pub mod bridge;
pub mod cancellation;
pub mod desk;
pub mod error;
pub mod selection;
pub mod store;
pub mod view;
pub mod withdrawal;

pub use bridge::{IdentifierBridge, LookupError, TravelerSnapshot};
pub use cancellation::{CancellationWorkflow, PendingCancellation};
pub use desk::{BookingDesk, DeskSettings, DeskSnapshot};
pub use error::DeskError;
pub use selection::SelectionSet;
pub use store::BookingStore;
pub use view::{Bucket, BucketCount, BucketEntry, DashboardSummary, ViewBuckets, ViewFilter};
pub use withdrawal::{PendingWithdrawal, WithdrawalWorkflow};
