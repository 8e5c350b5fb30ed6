//! # Appointment Cell
//!
//! Attorney-facing appointment scheduling: booking with slot conflict
//! checks, meeting links, confirmation and completion e-mails, and
//! persisted day-before / fifteen-minute reminders delivered by a polling
//! worker.
//!
//! Routes are mounted under `/api/appointments` by the API binary and are
//! all scoped to the attorney in the bearer token.

pub mod clock;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod state;
pub mod validation;

pub use clock::PracticeClock;
pub use router::appointment_routes;
pub use services::booking::AppointmentBookingService;
pub use services::memory_store::InMemoryStore;
pub use services::reminders::{ReminderRunSummary, ReminderWorker};
pub use services::supabase_store::SupabaseStore;
pub use state::AppointmentState;
