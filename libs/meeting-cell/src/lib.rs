//! # Meeting Cell
//!
//! Produces join links for client meetings.
//!
//! - **Google Meet**: a Google Calendar event with a Meet conference is
//!   created through the Calendar API; the event's conference link is used.
//! - **Zoom / Teams / Jitsi**: no provider integration; a meeting id and a
//!   placeholder join URL are synthesized locally.
//!
//! Link generation never fails the caller. Every failure is folded into a
//! [`models::MeetingLink`] whose `meeting_join_url` is `None` and whose
//! `error` carries the reason, so bookings go through without a link.
//!
//! ```text
//! +-------------------------------------------------+
//! |  models.rs          |  MeetingType, MeetingLink |
//! |  services/          |                           |
//! |    google.rs        |  Calendar API client      |
//! |    synthesized.rs   |  local placeholder links  |
//! |    generator.rs     |  dispatch by meeting type |
//! +-------------------------------------------------+
//! ```

pub mod models;
pub mod services;

pub use models::{MeetingError, MeetingLink, MeetingRequest, MeetingType};
pub use services::generator::MeetingLinkGenerator;
