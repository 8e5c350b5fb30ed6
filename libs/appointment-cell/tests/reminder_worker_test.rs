use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use appointment_cell::models::*;
use appointment_cell::services::reminders::CLAIM_LEASE_MINUTES;
use appointment_cell::services::store::{AppointmentStore, ReminderStore};
use appointment_cell::{AppointmentBookingService, InMemoryStore, ReminderRunSummary};
use notification_cell::test_utils::RecordingMailer;
use notification_cell::NotificationKind;
use shared_utils::test_utils::TestConfig;

const ATTORNEY: &str = "attorney-1";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 10, 12, 0, 0).unwrap()
}

fn service(store: &Arc<InMemoryStore>, mailer: &Arc<RecordingMailer>) -> AppointmentBookingService {
    let config = TestConfig::default().to_app_config();
    AppointmentBookingService::with_store(&config, Arc::clone(store), mailer.clone())
}

fn request(date: &str, time: &str) -> CreateAppointmentRequest {
    CreateAppointmentRequest {
        client_name: Some("Jordan Client".to_string()),
        client_email: Some("jordan@example.com".to_string()),
        appointment_date: Some(date.to_string()),
        appointment_time: Some(time.to_string()),
        meeting_type: Some("Jitsi".to_string()),
        ..Default::default()
    }
}

async fn book(service: &AppointmentBookingService) -> Appointment {
    service
        .create(ATTORNEY, None, request("2030-01-12", "10:00"), now())
        .await
        .unwrap()
        .appointment
}

#[tokio::test]
async fn nothing_is_sent_before_due_time() {
    let store = Arc::new(InMemoryStore::new());
    let mailer = Arc::new(RecordingMailer::new());
    let service = service(&store, &mailer);
    book(&service).await;

    let summary = service.reminder_worker().process_due(now() + Duration::hours(1)).await.unwrap();

    assert_eq!(summary, ReminderRunSummary::default());
    assert_eq!(mailer.sent().await.len(), 1);
}

#[tokio::test]
async fn due_reminders_are_sent_once() {
    let store = Arc::new(InMemoryStore::new());
    let mailer = Arc::new(RecordingMailer::new());
    let service = service(&store, &mailer);
    let appointment = book(&service).await;
    let worker = service.reminder_worker();

    // 2030-01-11 10:00 is 24 hours ahead of the slot.
    let day_before = Utc.with_ymd_and_hms(2030, 1, 11, 10, 0, 0).unwrap();
    let summary = worker.process_due(day_before).await.unwrap();
    assert_eq!(summary.claimed, 1);
    assert_eq!(summary.sent, 1);

    let again = worker.process_due(day_before + Duration::minutes(1)).await.unwrap();
    assert_eq!(again.claimed, 0);

    let sent = mailer.sent().await;
    assert_eq!(sent.len(), 2);
    assert!(sent[1].subject.contains("tomorrow"));

    let stored = service.get(ATTORNEY, appointment.id).await.unwrap();
    assert!(stored.notifications.day_before.sent);
    assert!(!stored.notifications.fifteen_minute.sent);

    let fifteen = Utc.with_ymd_and_hms(2030, 1, 12, 9, 45, 0).unwrap();
    let summary = worker.process_due(fifteen).await.unwrap();
    assert_eq!(summary.sent, 1);
    assert!(mailer.sent().await[2].subject.starts_with("Starting soon"));

    let jobs = store.reminders_for(appointment.id).await.unwrap();
    assert!(jobs.iter().all(|job| job.state == ReminderState::Sent && job.processed_at.is_some()));
}

#[tokio::test]
async fn cancelled_appointment_gets_no_reminders() {
    let store = Arc::new(InMemoryStore::new());
    let mailer = Arc::new(RecordingMailer::new());
    let service = service(&store, &mailer);
    let appointment = book(&service).await;

    service.cancel(ATTORNEY, appointment.id, now()).await.unwrap();
    let summary = service
        .reminder_worker()
        .process_due(Utc.with_ymd_and_hms(2030, 1, 12, 10, 0, 0).unwrap())
        .await
        .unwrap();

    assert_eq!(summary.sent, 0);
    assert_eq!(mailer.sent().await.len(), 1);
}

#[tokio::test]
async fn reminder_for_a_status_changed_appointment_is_skipped() {
    let store = Arc::new(InMemoryStore::new());
    let mailer = Arc::new(RecordingMailer::new());
    let service = service(&store, &mailer);
    let appointment = book(&service).await;

    // A reminder that escaped supersession still observes the current status.
    let stray = ReminderJob::new(&appointment, ReminderKind::FifteenMinute, now(), now());
    store.insert_reminders(&[stray.clone()]).await.unwrap();
    service.update_status(ATTORNEY, appointment.id, Some("No-show"), now()).await.unwrap();
    store.insert_reminders(&[ReminderJob { id: uuid::Uuid::new_v4(), ..stray }]).await.unwrap();

    let summary = service.reminder_worker().process_due(now()).await.unwrap();

    assert_eq!(summary.claimed, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(mailer.sent().await.len(), 1);
}

#[tokio::test]
async fn reminder_for_an_old_slot_is_skipped() {
    let store = Arc::new(InMemoryStore::new());
    let mailer = Arc::new(RecordingMailer::new());
    let service = service(&store, &mailer);
    let appointment = book(&service).await;

    let mut stale = ReminderJob::new(&appointment, ReminderKind::DayBefore, now(), now());
    stale.slot_time = "08:00".to_string();
    store.insert_reminders(&[stale]).await.unwrap();

    let summary = service.reminder_worker().process_due(now()).await.unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.sent, 0);
}

#[tokio::test]
async fn pending_reminders_survive_a_restart() {
    let store = Arc::new(InMemoryStore::new());
    let mailer = Arc::new(RecordingMailer::new());
    let appointment = {
        let first_boot = service(&store, &mailer);
        book(&first_boot).await
    };

    // Same persisted rows, fresh service and worker.
    let second_boot = service(&store, &mailer);
    let summary = second_boot
        .reminder_worker()
        .process_due(Utc.with_ymd_and_hms(2030, 1, 11, 10, 5, 0).unwrap())
        .await
        .unwrap();
    assert_eq!(summary.sent, 1);

    let third_boot = service(&store, &mailer);
    let summary = third_boot
        .reminder_worker()
        .process_due(Utc.with_ymd_and_hms(2030, 1, 12, 9, 50, 0).unwrap())
        .await
        .unwrap();
    assert_eq!(summary.sent, 1);

    let stored = third_boot.get(ATTORNEY, appointment.id).await.unwrap();
    assert!(stored.notifications.day_before.sent);
    assert!(stored.notifications.fifteen_minute.sent);
}

#[tokio::test]
async fn reminders_recovered_after_the_appointment_are_not_sent() {
    let store = Arc::new(InMemoryStore::new());
    let mailer = Arc::new(RecordingMailer::new());
    let service = service(&store, &mailer);
    let appointment = book(&service).await;

    // Down for the whole of 2030-01-11 and 2030-01-12.
    let summary = service
        .reminder_worker()
        .process_due(Utc.with_ymd_and_hms(2030, 1, 14, 10, 0, 0).unwrap())
        .await
        .unwrap();

    assert_eq!(summary, ReminderRunSummary { claimed: 2, sent: 0, skipped: 2, failed: 0 });
    assert_eq!(mailer.sent().await.len(), 1);
    let jobs = store.reminders_for(appointment.id).await.unwrap();
    assert!(jobs
        .iter()
        .all(|job| job.state == ReminderState::Skipped && job.failure_reason.as_deref() == Some("expired")));
}

#[tokio::test]
async fn day_before_reminder_is_dropped_once_the_fifteen_minute_one_is_due() {
    let store = Arc::new(InMemoryStore::new());
    let mailer = Arc::new(RecordingMailer::new());
    let service = service(&store, &mailer);
    book(&service).await;

    let summary = service
        .reminder_worker()
        .process_due(Utc.with_ymd_and_hms(2030, 1, 12, 9, 50, 0).unwrap())
        .await
        .unwrap();

    assert_eq!(summary.sent, 1);
    assert_eq!(summary.skipped, 1);
    let sent = mailer.sent().await;
    assert_eq!(sent.len(), 2);
    assert!(sent[1].subject.starts_with("Starting soon"));
}

#[tokio::test]
async fn reminder_left_in_processing_is_retried_after_its_lease() {
    let store = Arc::new(InMemoryStore::new());
    let mailer = Arc::new(RecordingMailer::new());
    let service = service(&store, &mailer);
    let appointment = book(&service).await;
    let day_before = Utc.with_ymd_and_hms(2030, 1, 11, 10, 0, 0).unwrap();

    // A worker claimed the day-before reminder and died before completing it.
    let job_id = appointment.scheduled_jobs.day_before.unwrap();
    assert!(store.claim_reminder(job_id, day_before).await.unwrap());

    let worker = service.reminder_worker();
    let within_lease = worker.process_due(day_before + Duration::minutes(CLAIM_LEASE_MINUTES - 1)).await.unwrap();
    assert_eq!(within_lease.claimed, 0);

    let after_lease = worker.process_due(day_before + Duration::minutes(CLAIM_LEASE_MINUTES + 1)).await.unwrap();
    assert_eq!(after_lease.claimed, 1);
    assert_eq!(after_lease.sent, 1);

    let jobs = store.reminders_for(appointment.id).await.unwrap();
    let job = jobs.iter().find(|job| job.id == job_id).unwrap();
    assert_eq!(job.state, ReminderState::Sent);
}

#[tokio::test]
async fn released_reminder_that_was_already_sent_is_not_sent_again() {
    let store = Arc::new(InMemoryStore::new());
    let mailer = Arc::new(RecordingMailer::new());
    let service = service(&store, &mailer);
    let appointment = book(&service).await;
    let day_before = Utc.with_ymd_and_hms(2030, 1, 11, 10, 0, 0).unwrap();

    // The worker got as far as sending and recording before it died.
    let job_id = appointment.scheduled_jobs.day_before.unwrap();
    assert!(store.claim_reminder(job_id, day_before).await.unwrap());
    store
        .record_notification(appointment.id, NotificationKind::DayBefore, &NotificationRecord::sent_at(day_before))
        .await
        .unwrap();

    let summary = service
        .reminder_worker()
        .process_due(day_before + Duration::minutes(CLAIM_LEASE_MINUTES + 1))
        .await
        .unwrap();

    assert_eq!(summary.claimed, 1);
    assert_eq!(mailer.sent().await.len(), 1);
    let jobs = store.reminders_for(appointment.id).await.unwrap();
    let job = jobs.iter().find(|job| job.id == job_id).unwrap();
    assert_eq!(job.state, ReminderState::Sent);
}

#[tokio::test]
async fn shutdown_stops_a_sleeping_worker_promptly() {
    let store = Arc::new(InMemoryStore::new());
    let mailer = Arc::new(RecordingMailer::new());
    let mut config = TestConfig::default().to_app_config();
    config.reminder_poll_interval_seconds = 3600;
    let service = AppointmentBookingService::with_store(&config, Arc::clone(&store), mailer.clone());

    let worker = Arc::new(service.reminder_worker());
    let handle = {
        let worker = Arc::clone(&worker);
        tokio::spawn(async move { worker.run().await })
    };

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    worker.shutdown();

    tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .expect("worker did not stop")
        .unwrap();
}

#[tokio::test]
async fn failed_delivery_is_recorded() {
    let store = Arc::new(InMemoryStore::new());
    let mailer = Arc::new(RecordingMailer::failing("mailbox unavailable"));
    let service = service(&store, &mailer);
    let appointment = book(&service).await;

    let summary = service
        .reminder_worker()
        .process_due(Utc.with_ymd_and_hms(2030, 1, 11, 10, 0, 0).unwrap())
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    let jobs = store.reminders_for(appointment.id).await.unwrap();
    let failed = jobs.iter().find(|job| job.state == ReminderState::Failed).unwrap();
    assert!(failed.failure_reason.as_deref().unwrap().contains("mailbox unavailable"));
}
