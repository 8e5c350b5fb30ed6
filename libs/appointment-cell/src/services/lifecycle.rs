// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

/// Outcome of a requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Target equals the current status; nothing to write.
    Unchanged,
    Apply,
}

pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Statuses reachable from `current` through the status endpoint.
    /// Rescheduled is reached only through a reschedule, never set directly.
    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Scheduled | AppointmentStatus::Rescheduled => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            // Terminal states
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow => vec![],
        }
    }

    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<Transition, AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if current_status == new_status {
            return Ok(Transition::Unchanged);
        }

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(Transition::Apply)
    }

    /// Cancel and reschedule are only possible while the meeting is still ahead.
    pub fn ensure_upcoming(&self, current_status: AppointmentStatus, target: AppointmentStatus) -> Result<(), AppointmentError> {
        if current_status.is_upcoming() {
            Ok(())
        } else {
            Err(AppointmentError::InvalidStatusTransition {
                from: current_status,
                to: target,
            })
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn same_status_is_a_no_op() {
        let lifecycle = AppointmentLifecycleService::new();
        for status in AppointmentStatus::ALL {
            assert_eq!(lifecycle.validate_status_transition(status, status).unwrap(), Transition::Unchanged);
        }
    }

    #[test]
    fn upcoming_statuses_can_close() {
        let lifecycle = AppointmentLifecycleService::new();
        for from in [AppointmentStatus::Scheduled, AppointmentStatus::Rescheduled] {
            for to in [AppointmentStatus::Completed, AppointmentStatus::Cancelled, AppointmentStatus::NoShow] {
                assert_eq!(lifecycle.validate_status_transition(from, to).unwrap(), Transition::Apply);
            }
        }
    }

    #[test]
    fn rescheduled_is_not_settable_directly() {
        let lifecycle = AppointmentLifecycleService::new();
        assert_matches!(
            lifecycle.validate_status_transition(AppointmentStatus::Scheduled, AppointmentStatus::Rescheduled),
            Err(AppointmentError::InvalidStatusTransition { .. })
        );
    }

    #[test]
    fn terminal_statuses_are_final() {
        let lifecycle = AppointmentLifecycleService::new();
        assert_matches!(
            lifecycle.validate_status_transition(AppointmentStatus::Completed, AppointmentStatus::Scheduled),
            Err(AppointmentError::InvalidStatusTransition { .. })
        );
        assert_matches!(
            lifecycle.validate_status_transition(AppointmentStatus::Cancelled, AppointmentStatus::Completed),
            Err(AppointmentError::InvalidStatusTransition { .. })
        );
        assert!(lifecycle.ensure_upcoming(AppointmentStatus::NoShow, AppointmentStatus::Cancelled).is_err());
        assert!(lifecycle.ensure_upcoming(AppointmentStatus::Rescheduled, AppointmentStatus::Rescheduled).is_ok());
    }
}
