// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::state::AppointmentState;

pub fn appointment_routes(state: Arc<AppointmentState>) -> Router {
    // Every appointment operation is scoped to the authenticated attorney
    let protected_routes = Router::new()
        .route("/create", post(handlers::create_appointment))
        .route("/getAll", get(handlers::list_appointments))
        .route("/today", get(handlers::todays_appointments))
        .route("/upcoming", get(handlers::upcoming_appointments))
        .route("/stats", get(handlers::appointment_stats))
        .route("/availability", get(handlers::check_availability))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}", delete(handlers::cancel_appointment))
        .route("/{appointment_id}/update", put(handlers::update_appointment))
        .route("/{appointment_id}/status", patch(handlers::update_appointment_status))
        .route("/{appointment_id}/reschedule", post(handlers::reschedule_appointment))
        .layer(middleware::from_fn_with_state(Arc::clone(&state.config), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
