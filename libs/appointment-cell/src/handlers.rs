// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, AppointmentListQuery, AvailabilityQuery, AvailabilityResponse, CreateAppointmentRequest,
    RescheduleRequest, StatusUpdateRequest, UpcomingQuery, UpdateAppointmentRequest,
};
use crate::state::AppointmentState;

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound => AppError::NotFound(err.to_string()),
            AppointmentError::Validation(msg) => AppError::ValidationError(msg),
            AppointmentError::InvalidStatus(_) | AppointmentError::InvalidStatusTransition { .. } => {
                AppError::BadRequest(err.to_string())
            }
            AppointmentError::SlotUnavailable => AppError::Conflict(err.to_string()),
            AppointmentError::AvailabilityCheck(_) => {
                tracing::error!("{}", err);
                AppError::Internal("Unable to check availability".to_string())
            }
            AppointmentError::Store(e) => AppError::Database(e.to_string()),
        }
    }
}

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::BadRequest(format!("Invalid appointment id: {}", raw)))
}

pub async fn create_appointment(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let created = state
        .booking
        .create(&user.id, user.email.as_deref(), request, Utc::now())
        .await?;

    let message = if created.meeting_link.is_available() {
        "Appointment created successfully"
    } else {
        "Appointment created, but the meeting link could not be generated"
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "appointment": created.appointment,
            "meetingLink": created.meeting_link,
            "notifications": created.notifications,
            "message": message
        })),
    ))
}

pub async fn list_appointments(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.booking.list(&user.id, &query).await?;

    Ok(Json(json!({
        "success": true,
        "count": appointments.len(),
        "appointments": appointments
    })))
}

pub async fn todays_appointments(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.booking.today(&user.id, Utc::now()).await?;

    Ok(Json(json!({
        "success": true,
        "count": appointments.len(),
        "appointments": appointments
    })))
}

pub async fn upcoming_appointments(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
    Query(query): Query<UpcomingQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = state
        .booking
        .upcoming(&user.id, query.days.as_deref(), Utc::now())
        .await?;

    Ok(Json(json!({
        "success": true,
        "count": appointments.len(),
        "appointments": appointments
    })))
}

pub async fn appointment_stats(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let stats = state.booking.stats(&user.id, Utc::now()).await?;

    Ok(Json(json!({
        "success": true,
        "stats": stats
    })))
}

pub async fn check_availability(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let (slot, available) = state
        .booking
        .check_availability(&user.id, query.appointment_date.as_deref(), query.appointment_time.as_deref())
        .await?;

    let availability = AvailabilityResponse {
        appointment_date: slot.date_string(),
        appointment_time: slot.time_string(),
        available,
    };

    Ok(Json(json!({
        "success": true,
        "availability": availability
    })))
}

pub async fn get_appointment(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&appointment_id)?;
    let appointment = state.booking.get(&user.id, id).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

pub async fn update_appointment(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&appointment_id)?;
    let appointment = state.booking.update(&user.id, id, request, Utc::now()).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment updated successfully"
    })))
}

pub async fn update_appointment_status(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&appointment_id)?;
    let appointment = state
        .booking
        .update_status(&user.id, id, request.status.as_deref(), Utc::now())
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": format!("Appointment status is {}", appointment.status)
    })))
}

pub async fn reschedule_appointment(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&appointment_id)?;
    let appointment = state.booking.reschedule(&user.id, id, request, Utc::now()).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment rescheduled successfully"
    })))
}

pub async fn cancel_appointment(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&appointment_id)?;
    let appointment = state.booking.cancel(&user.id, id, Utc::now()).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled successfully"
    })))
}
