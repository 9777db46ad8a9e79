use tourdesk_core::{ApiError, BearerToken, BookingApi, EphemeralId, ServerId, WithdrawRequest};
use tracing::{info, warn};

use crate::error::DeskError;
use crate::store::BookingStore;

#[derive(Debug, Clone, PartialEq)]
pub struct PendingWithdrawal {
    pub booking_id: String,
    pub server_id: ServerId,
}

impl PendingWithdrawal {
    pub fn request(&self) -> WithdrawRequest {
        WithdrawRequest {
            traveler_ids: vec![self.server_id.clone()],
        }
    }
}

/// Revokes a pending cancellation request for a single traveler.
pub struct WithdrawalWorkflow;

impl WithdrawalWorkflow {
    /// Resolve the traveler and check it has a pending (not yet decided) request.
    pub fn prepare(
        store: &BookingStore,
        booking_id: &str,
        id: EphemeralId,
    ) -> Result<PendingWithdrawal, DeskError> {
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
        if !current.can_withdraw() {
            return Err(DeskError::NotEligible {
                booking_id: booking_id.to_string(),
                reason: format!(
                    "traveler {} has cancellation state {}",
                    current.server_id, current.cancellation_state
                ),
            });
        }

        Ok(PendingWithdrawal {
            booking_id: booking_id.to_string(),
            server_id: current.server_id.clone(),
        })
    }

    pub fn commit(store: &mut BookingStore, pending: &PendingWithdrawal) {
        if store.apply_withdrawal_result(&pending.booking_id, &pending.server_id) {
            info!(
                "Cancellation request withdrawn for traveler {} on booking {}",
                pending.server_id, pending.booking_id
            );
        }
    }

    pub fn failure(error: ApiError, fallback: &str) -> DeskError {
        warn!("Withdrawal request failed: {}", error);
        DeskError::submit_failed(error, fallback)
    }

    /// Send a prepared withdrawal. Nothing local changes here.
    pub async fn send(
        api: &dyn BookingApi,
        token: &BearerToken,
        pending: &PendingWithdrawal,
        fallback: &str,
    ) -> Result<String, DeskError> {
        api.withdraw_cancellation(token, &pending.booking_id, &pending.request())
            .await
            .map(|response| response.message)
            .map_err(|e| Self::failure(e, fallback))
    }
}
