// libs/appointment-cell/src/services/availability.rs
use std::sync::Arc;

use tracing::{debug, error};
use uuid::Uuid;

use crate::models::{AppointmentError, Slot};
use crate::services::store::AppointmentStore;

pub struct AvailabilityChecker {
    store: Arc<dyn AppointmentStore>,
}

impl AvailabilityChecker {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    /// True when no non-cancelled appointment of the attorney holds the exact
    /// slot. `exclude` leaves the appointment being moved out of the check.
    pub async fn is_slot_available(
        &self,
        attorney_id: &str,
        slot: &Slot,
        exclude: Option<Uuid>,
    ) -> Result<bool, AppointmentError> {
        debug!(
            "Checking availability for attorney {} at {} {}",
            attorney_id,
            slot.date_string(),
            slot.time_string()
        );

        match self.store.find_active_in_slot(attorney_id, slot, exclude).await {
            Ok(existing) => {
                if let Some(existing) = &existing {
                    debug!("Slot held by appointment {}", existing.id);
                }
                Ok(existing.is_none())
            }
            Err(e) => {
                error!("Availability check failed: {}", e);
                Err(AppointmentError::AvailabilityCheck(e.to_string()))
            }
        }
    }
}
