use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::task::JoinSet;
use uuid::Uuid;

use appointment_cell::models::*;
use appointment_cell::services::store::{AppointmentStore, ReminderStore};
use appointment_cell::{AppointmentBookingService, InMemoryStore};
use meeting_cell::MeetingType;
use notification_cell::test_utils::RecordingMailer;
use shared_utils::test_utils::TestConfig;

const ATTORNEY: &str = "attorney-1";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 10, 12, 0, 0).unwrap()
}

struct Harness {
    service: AppointmentBookingService,
    store: Arc<InMemoryStore>,
    mailer: Arc<RecordingMailer>,
}

fn harness_with(mailer: RecordingMailer) -> Harness {
    let config = TestConfig::default().to_app_config();
    let store = Arc::new(InMemoryStore::new());
    let mailer = Arc::new(mailer);
    let service = AppointmentBookingService::with_store(&config, Arc::clone(&store), mailer.clone());
    Harness { service, store, mailer }
}

fn harness() -> Harness {
    harness_with(RecordingMailer::new())
}

fn request(date: &str, time: &str) -> CreateAppointmentRequest {
    CreateAppointmentRequest {
        client_name: Some(" Jordan Client ".to_string()),
        client_email: Some("Jordan@Example.com".to_string()),
        case_title: Some("Estate of Client".to_string()),
        appointment_date: Some(date.to_string()),
        appointment_time: Some(time.to_string()),
        appointment_type: Some("Consultation".to_string()),
        meeting_type: Some("Jitsi".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn create_books_free_slot_and_notifies() {
    let h = harness();

    let created = h
        .service
        .create(ATTORNEY, Some("attorney@example.com"), request("2030-01-12", "10:00"), now())
        .await
        .unwrap();

    assert_eq!(created.appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(created.appointment.client_name, "Jordan Client");
    assert_eq!(created.appointment.client_email, "jordan@example.com");
    assert!(created.meeting_link.meeting_join_url.as_deref().unwrap().starts_with("https://meet.jit.si/"));
    assert_eq!(created.appointment.meeting_join_url, created.meeting_link.meeting_join_url);
    assert!(created.notifications.confirmation_sent);
    assert!(created.notifications.reminders_scheduled);
    assert!(created.appointment.scheduled_jobs.day_before.is_some());
    assert!(created.appointment.scheduled_jobs.fifteen_minute.is_some());

    let sent = h.mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "jordan@example.com");

    let stored = h.service.get(ATTORNEY, created.appointment.id).await.unwrap();
    assert!(stored.notifications.confirmation.sent);
    assert_eq!(stored.scheduled_jobs, created.appointment.scheduled_jobs);
}

#[tokio::test]
async fn google_meet_without_credentials_still_books() {
    let h = harness();
    let mut req = request("2030-01-12", "10:00");
    req.meeting_type = None;

    let created = h.service.create(ATTORNEY, None, req, now()).await.unwrap();

    assert_eq!(created.meeting_link.meeting_type, MeetingType::GoogleMeet);
    assert!(created.meeting_link.meeting_join_url.is_none());
    assert!(created.meeting_link.error.is_some());
    assert_eq!(created.appointment.status, AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn occupied_slot_is_rejected_and_nothing_is_stored() {
    let h = harness();
    h.service.create(ATTORNEY, None, request("2030-01-12", "10:00"), now()).await.unwrap();

    let result = h.service.create(ATTORNEY, None, request("2030-01-12", "10:00"), now()).await;
    assert_matches!(result, Err(AppointmentError::SlotUnavailable));

    let all = h.service.list(ATTORNEY, &AppointmentListQuery::default()).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn same_slot_for_another_attorney_is_free() {
    let h = harness();
    h.service.create(ATTORNEY, None, request("2030-01-12", "10:00"), now()).await.unwrap();

    assert!(h.service.create("attorney-2", None, request("2030-01-12", "10:00"), now()).await.is_ok());
}

#[tokio::test]
async fn cancelled_slot_can_be_booked_again() {
    let h = harness();
    let first = h.service.create(ATTORNEY, None, request("2030-01-12", "10:00"), now()).await.unwrap();
    h.service.cancel(ATTORNEY, first.appointment.id, now()).await.unwrap();

    assert!(h.service.create(ATTORNEY, None, request("2030-01-12", "10:00"), now()).await.is_ok());
}

#[tokio::test]
async fn past_slot_is_rejected() {
    let h = harness();
    let result = h.service.create(ATTORNEY, None, request("2030-01-10", "11:59"), now()).await;
    assert_matches!(result, Err(AppointmentError::Validation(_)));
    assert!(h.mailer.sent().await.is_empty());
}

#[tokio::test]
async fn invalid_email_and_time_are_rejected() {
    let h = harness();

    let mut bad_email = request("2030-01-12", "10:00");
    bad_email.client_email = Some("not-an-email".to_string());
    assert_matches!(
        h.service.create(ATTORNEY, None, bad_email, now()).await,
        Err(AppointmentError::Validation(_))
    );

    let bad_time = request("2030-01-12", "25:61");
    assert_matches!(
        h.service.create(ATTORNEY, None, bad_time, now()).await,
        Err(AppointmentError::Validation(_))
    );

    let good = request("2030-01-12", "14:30");
    assert!(h.service.create(ATTORNEY, None, good, now()).await.is_ok());
}

#[tokio::test]
async fn failing_mailer_does_not_fail_booking() {
    let h = harness_with(RecordingMailer::failing("connection refused"));

    let created = h.service.create(ATTORNEY, None, request("2030-01-12", "10:00"), now()).await.unwrap();

    assert!(!created.notifications.confirmation_sent);
    let stored = h.service.get(ATTORNEY, created.appointment.id).await.unwrap();
    assert!(!stored.notifications.confirmation.sent);
    assert!(stored.notifications.confirmation.failure_reason.unwrap().contains("connection refused"));
}

#[tokio::test]
async fn reminders_in_the_past_are_not_scheduled() {
    let h = harness();
    // Starts in ten minutes: both reminder instants have passed.
    let created = h.service.create(ATTORNEY, None, request("2030-01-10", "12:10"), now()).await.unwrap();

    assert!(!created.notifications.reminders_scheduled);
    assert!(h.store.reminders_for(created.appointment.id).await.unwrap().is_empty());

    // Starts in five hours: only the fifteen-minute reminder is ahead.
    let created = h.service.create(ATTORNEY, None, request("2030-01-10", "17:00"), now()).await.unwrap();
    let jobs = h.store.reminders_for(created.appointment.id).await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].kind, ReminderKind::FifteenMinute);
    assert_eq!(jobs[0].due_at, Utc.with_ymd_and_hms(2030, 1, 10, 16, 45, 0).unwrap());
}

#[tokio::test]
async fn other_attorneys_cannot_see_appointment() {
    let h = harness();
    let created = h.service.create(ATTORNEY, None, request("2030-01-12", "10:00"), now()).await.unwrap();

    assert_matches!(
        h.service.get("attorney-2", created.appointment.id).await,
        Err(AppointmentError::NotFound)
    );
    assert_matches!(
        h.service.cancel("attorney-2", created.appointment.id, now()).await,
        Err(AppointmentError::NotFound)
    );
}

#[tokio::test]
async fn completing_twice_keeps_first_completion_time() {
    let h = harness();
    let created = h.service.create(ATTORNEY, None, request("2030-01-12", "10:00"), now()).await.unwrap();
    let id = created.appointment.id;

    let first = h.service.update_status(ATTORNEY, id, Some("Completed"), now()).await.unwrap();
    let later = now() + Duration::hours(1);
    let second = h.service.update_status(ATTORNEY, id, Some("completed"), later).await.unwrap();

    assert_eq!(first.status, AppointmentStatus::Completed);
    assert_eq!(second.status, AppointmentStatus::Completed);
    assert_eq!(first.completed_at, Some(now()));
    assert_eq!(second.completed_at, Some(now()));
    assert!(first.notifications.completion.sent);

    // Confirmation plus a single completion e-mail.
    let sent = h.mailer.sent().await;
    assert_eq!(sent.len(), 2);
    assert!(sent[1].subject.starts_with("Thank you"));

    let jobs = h.store.reminders_for(id).await.unwrap();
    assert!(jobs.iter().all(|job| job.state == ReminderState::Skipped));
}

#[tokio::test]
async fn status_update_rejects_unknown_and_illegal_targets() {
    let h = harness();
    let created = h.service.create(ATTORNEY, None, request("2030-01-12", "10:00"), now()).await.unwrap();
    let id = created.appointment.id;

    assert_matches!(
        h.service.update_status(ATTORNEY, id, Some("Archived"), now()).await,
        Err(AppointmentError::InvalidStatus(_))
    );
    assert_matches!(
        h.service.update_status(ATTORNEY, id, None, now()).await,
        Err(AppointmentError::Validation(_))
    );
    assert_matches!(
        h.service.update_status(ATTORNEY, id, Some("Rescheduled"), now()).await,
        Err(AppointmentError::InvalidStatusTransition { .. })
    );

    h.service.update_status(ATTORNEY, id, Some("No-show"), now()).await.unwrap();
    assert_matches!(
        h.service.update_status(ATTORNEY, id, Some("Scheduled"), now()).await,
        Err(AppointmentError::InvalidStatusTransition { .. })
    );
}

#[tokio::test]
async fn update_never_touches_status_or_slot() {
    let h = harness();
    let created = h.service.create(ATTORNEY, None, request("2030-01-12", "10:00"), now()).await.unwrap();

    let patch: UpdateAppointmentRequest = serde_json::from_value(serde_json::json!({
        "notes": "Bring the lease",
        "duration": 90,
        "status": "Completed",
        "appointmentDate": "2030-02-01"
    }))
    .unwrap();
    let updated = h.service.update(ATTORNEY, created.appointment.id, patch, now()).await.unwrap();

    assert_eq!(updated.notes.as_deref(), Some("Bring the lease"));
    assert_eq!(updated.duration, 90);
    assert_eq!(updated.status, AppointmentStatus::Scheduled);
    assert_eq!(updated.appointment_date, "2030-01-12");
}

#[tokio::test]
async fn update_regenerates_link_when_meeting_type_changes() {
    let h = harness();
    let created = h.service.create(ATTORNEY, None, request("2030-01-12", "10:00"), now()).await.unwrap();

    let patch = UpdateAppointmentRequest {
        meeting_type: Some("Zoom".to_string()),
        ..Default::default()
    };
    let updated = h.service.update(ATTORNEY, created.appointment.id, patch, now()).await.unwrap();

    assert_eq!(updated.meeting_type, MeetingType::Zoom);
    assert!(updated.meeting_join_url.unwrap().contains("zoom"));
    assert!(updated.meeting_password.is_some());
}

#[tokio::test]
async fn reschedule_onto_taken_slot_leaves_original_unchanged() {
    let h = harness();
    let first = h.service.create(ATTORNEY, None, request("2030-01-12", "10:00"), now()).await.unwrap();
    h.service.create(ATTORNEY, None, request("2030-01-12", "11:00"), now()).await.unwrap();

    let result = h
        .service
        .reschedule(
            ATTORNEY,
            first.appointment.id,
            RescheduleRequest {
                appointment_date: Some("2030-01-12".to_string()),
                appointment_time: Some("11:00".to_string()),
            },
            now(),
        )
        .await;
    assert_matches!(result, Err(AppointmentError::SlotUnavailable));

    let unchanged = h.service.get(ATTORNEY, first.appointment.id).await.unwrap();
    assert_eq!(unchanged.appointment_time, "10:00");
    assert_eq!(unchanged.status, AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn reschedule_moves_slot_and_replaces_reminders() {
    let h = harness();
    let created = h.service.create(ATTORNEY, None, request("2030-01-12", "10:00"), now()).await.unwrap();
    let id = created.appointment.id;

    let moved = h
        .service
        .reschedule(
            ATTORNEY,
            id,
            RescheduleRequest {
                appointment_date: Some("2030-01-15".to_string()),
                appointment_time: Some("09:30".to_string()),
            },
            now(),
        )
        .await
        .unwrap();

    assert_eq!(moved.status, AppointmentStatus::Rescheduled);
    assert_eq!(moved.appointment_date, "2030-01-15");
    assert_eq!(moved.appointment_time, "09:30");
    assert_ne!(moved.scheduled_jobs.day_before, created.appointment.scheduled_jobs.day_before);

    let jobs = h.store.reminders_for(id).await.unwrap();
    assert_eq!(jobs.len(), 4);
    assert_eq!(jobs.iter().filter(|j| j.state == ReminderState::Skipped).count(), 2);
    assert!(jobs
        .iter()
        .filter(|j| j.state == ReminderState::Pending)
        .all(|j| j.slot_date == "2030-01-15" && j.slot_time == "09:30"));

    // Moving into its own slot again is allowed.
    let same = h
        .service
        .reschedule(
            ATTORNEY,
            id,
            RescheduleRequest {
                appointment_date: Some("2030-01-15".to_string()),
                appointment_time: Some("09:30".to_string()),
            },
            now(),
        )
        .await;
    assert!(same.is_ok());
}

#[tokio::test]
async fn cancelled_appointment_cannot_be_rescheduled() {
    let h = harness();
    let created = h.service.create(ATTORNEY, None, request("2030-01-12", "10:00"), now()).await.unwrap();
    let cancelled = h.service.cancel(ATTORNEY, created.appointment.id, now()).await.unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    let result = h
        .service
        .reschedule(
            ATTORNEY,
            created.appointment.id,
            RescheduleRequest {
                appointment_date: Some("2030-01-13".to_string()),
                appointment_time: Some("10:00".to_string()),
            },
            now(),
        )
        .await;
    assert_matches!(result, Err(AppointmentError::InvalidStatusTransition { .. }));
}

#[tokio::test]
async fn list_filters_and_sorts() {
    let h = harness();
    h.service.create(ATTORNEY, None, request("2030-01-13", "09:00"), now()).await.unwrap();
    h.service.create(ATTORNEY, None, request("2030-01-12", "15:00"), now()).await.unwrap();
    let early = h.service.create(ATTORNEY, None, request("2030-01-12", "08:00"), now()).await.unwrap();
    h.service.cancel(ATTORNEY, early.appointment.id, now()).await.unwrap();

    let all = h.service.list(ATTORNEY, &AppointmentListQuery::default()).await.unwrap();
    let order: Vec<_> = all.iter().map(|a| (a.appointment_date.as_str(), a.appointment_time.as_str())).collect();
    assert_eq!(order, vec![("2030-01-12", "08:00"), ("2030-01-12", "15:00"), ("2030-01-13", "09:00")]);

    let by_priority = AppointmentListQuery {
        priority: Some("Cancelled".to_string()),
        ..Default::default()
    };
    assert_eq!(h.service.list(ATTORNEY, &by_priority).await.unwrap().len(), 1);

    let by_date = AppointmentListQuery {
        date: Some("2030-01-12".to_string()),
        status: Some("Scheduled".to_string()),
        ..Default::default()
    };
    assert_eq!(h.service.list(ATTORNEY, &by_date).await.unwrap().len(), 1);

    let bad = AppointmentListQuery {
        date: Some("12/01/2030".to_string()),
        ..Default::default()
    };
    assert_matches!(h.service.list(ATTORNEY, &bad).await, Err(AppointmentError::Validation(_)));
}

#[tokio::test]
async fn today_upcoming_and_stats() {
    let h = harness();
    h.service.create(ATTORNEY, None, request("2030-01-10", "15:00"), now()).await.unwrap();
    h.service.create(ATTORNEY, None, request("2030-01-14", "10:00"), now()).await.unwrap();
    let far = h.service.create(ATTORNEY, None, request("2030-03-01", "10:00"), now()).await.unwrap();
    let done = h.service.create(ATTORNEY, None, request("2030-01-11", "10:00"), now()).await.unwrap();
    h.service.update_status(ATTORNEY, done.appointment.id, Some("Completed"), now()).await.unwrap();

    let today = h.service.today(ATTORNEY, now()).await.unwrap();
    assert_eq!(today.len(), 1);
    assert_eq!(today[0].appointment_time, "15:00");

    assert_eq!(h.service.upcoming(ATTORNEY, None, now()).await.unwrap().len(), 2);
    let ninety = h.service.upcoming(ATTORNEY, Some("90"), now()).await.unwrap();
    assert!(ninety.iter().any(|a| a.id == far.appointment.id));
    assert_matches!(
        h.service.upcoming(ATTORNEY, Some("0"), now()).await,
        Err(AppointmentError::Validation(_))
    );

    let stats = h.service.stats(ATTORNEY, now()).await.unwrap();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.today, 1);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.upcoming, 3);
    assert_eq!(stats.by_status["Scheduled"], 3);
    assert_eq!(stats.by_status["No-show"], 0);
    assert_eq!(stats.by_type["Consultation"], 4);
}

#[tokio::test]
async fn availability_reports_occupancy() {
    let h = harness();
    h.service.create(ATTORNEY, None, request("2030-01-12", "10:00"), now()).await.unwrap();

    let (_, taken) = h
        .service
        .check_availability(ATTORNEY, Some("2030-01-12"), Some("10:00"))
        .await
        .unwrap();
    let (_, free) = h
        .service
        .check_availability(ATTORNEY, Some("2030-01-12"), Some("10:15"))
        .await
        .unwrap();

    assert!(!taken);
    assert!(free);
    assert_matches!(
        h.service.check_availability(ATTORNEY, Some("2030-01-12"), None).await,
        Err(AppointmentError::Validation(_))
    );
}

#[tokio::test]
async fn concurrent_bookings_of_one_slot_admit_exactly_one() {
    let h = harness();
    let service = Arc::new(h.service);

    let mut bookings = JoinSet::new();
    for _ in 0..8 {
        let service = Arc::clone(&service);
        bookings.spawn(async move { service.create(ATTORNEY, None, request("2030-01-12", "10:00"), now()).await });
    }

    let mut booked = 0;
    let mut refused = 0;
    while let Some(result) = bookings.join_next().await {
        match result.unwrap() {
            Ok(_) => booked += 1,
            Err(AppointmentError::SlotUnavailable) => refused += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(booked, 1);
    assert_eq!(refused, 7);
    let listed = service.list(ATTORNEY, &AppointmentListQuery::default()).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn store_refuses_a_second_appointment_in_a_taken_slot() {
    let h = harness();
    let created = h.service.create(ATTORNEY, None, request("2030-01-12", "10:00"), now()).await.unwrap();

    // Bypasses the availability check entirely.
    let duplicate = Appointment { id: Uuid::new_v4(), ..created.appointment.clone() };
    assert_matches!(h.store.insert(&duplicate).await, Err(StoreError::SlotConflict));

    let other = h.service.create(ATTORNEY, None, request("2030-01-12", "11:00"), now()).await.unwrap();
    let mut move_onto_taken = AppointmentChanges::at(now());
    move_onto_taken.appointment_time = Some("10:00".to_string());
    assert_matches!(
        h.store.apply(other.appointment.id, &move_onto_taken).await,
        Err(StoreError::SlotConflict)
    );

    let unchanged = h.store.get_by_id(other.appointment.id).await.unwrap().unwrap();
    assert_eq!(unchanged.appointment_time, "11:00");

    // A cancelled appointment frees its slot.
    h.service.cancel(ATTORNEY, created.appointment.id, now()).await.unwrap();
    assert!(h.store.insert(&duplicate).await.is_ok());
}
