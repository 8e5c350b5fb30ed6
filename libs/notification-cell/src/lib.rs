//! # Notification Cell
//!
//! Transactional e-mail for appointments: the [`Mailer`] transport seam
//! (SMTP through `lettre`, or a disabled transport when SMTP is not
//! configured) and the HTML/plain-text templates for every notification kind.

pub mod models;
pub mod services;
pub mod test_utils;

pub use models::{EmailContext, NotificationError, NotificationKind, OutgoingEmail};
pub use services::mailer::{mailer_from_config, DisabledMailer, Mailer, SmtpMailer};
pub use services::templates::render_email;
