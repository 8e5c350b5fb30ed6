// libs/appointment-cell/src/state.rs
use std::sync::Arc;

use shared_config::AppConfig;

use crate::services::booking::AppointmentBookingService;

pub struct AppointmentState {
    pub config: Arc<AppConfig>,
    pub booking: Arc<AppointmentBookingService>,
}

impl AppointmentState {
    pub fn new(config: Arc<AppConfig>) -> Self {
        let booking = Arc::new(AppointmentBookingService::from_config(&config));
        Self { config, booking }
    }

    pub fn with_booking(config: Arc<AppConfig>, booking: Arc<AppointmentBookingService>) -> Self {
        Self { config, booking }
    }
}
