use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::{appointment_routes, AppointmentState};

pub fn create_router(appointments: Arc<AppointmentState>) -> Router {
    Router::new()
        .route("/", get(|| async { "CaseMate API is running!" }))
        .nest("/api/appointments", appointment_routes(appointments))
}
