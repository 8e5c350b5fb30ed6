// libs/notification-cell/src/services/templates.rs
use crate::models::{EmailContext, NotificationKind, OutgoingEmail};

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn subject(kind: NotificationKind, ctx: &EmailContext) -> String {
    match kind {
        NotificationKind::Confirmation => format!(
            "Appointment confirmed: {} on {} at {}",
            ctx.appointment_type, ctx.appointment_date, ctx.appointment_time
        ),
        NotificationKind::DayBefore => format!(
            "Reminder: your {} is tomorrow at {}",
            ctx.appointment_type, ctx.appointment_time
        ),
        NotificationKind::FifteenMinute => format!(
            "Starting soon: your {} begins at {}",
            ctx.appointment_type, ctx.appointment_time
        ),
        NotificationKind::Completion => format!("Thank you for meeting with us, {}", ctx.client_name),
    }
}

fn intro(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Confirmation => "Your appointment has been scheduled. The details are below.",
        NotificationKind::DayBefore => "This is a reminder that your appointment is tomorrow.",
        NotificationKind::FifteenMinute => "Your appointment starts in about 15 minutes.",
        NotificationKind::Completion => {
            "Your appointment is complete. Reply to this message if you have any follow-up questions."
        }
    }
}

/// (label, raw value) rows shown in both the HTML and text bodies.
fn detail_rows(ctx: &EmailContext) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Date", ctx.appointment_date.clone()),
        ("Time", ctx.appointment_time.clone()),
        ("Type", ctx.appointment_type.clone()),
        ("Duration", format!("{} minutes", ctx.duration_minutes)),
    ];
    if let Some(case_title) = &ctx.case_title {
        rows.push(("Case", case_title.clone()));
    }
    if let Some(meeting_type) = &ctx.meeting_type {
        rows.push(("Meeting", meeting_type.clone()));
    }
    rows
}

pub fn render_email(kind: NotificationKind, ctx: &EmailContext) -> OutgoingEmail {
    let rows = detail_rows(ctx);
    let show_link = kind != NotificationKind::Completion;

    let mut html = String::new();
    html.push_str("<!DOCTYPE html><html><body style=\"font-family: Arial, sans-serif; color: #1f2933;\">");
    html.push_str(&format!("<h2>Hello {},</h2>", escape_html(&ctx.client_name)));
    html.push_str(&format!("<p>{}</p>", intro(kind)));
    html.push_str("<table cellpadding=\"6\" style=\"border-collapse: collapse;\">");
    for (label, value) in &rows {
        html.push_str(&format!(
            "<tr><td><strong>{}</strong></td><td>{}</td></tr>",
            label,
            escape_html(value)
        ));
    }
    html.push_str("</table>");
    if show_link {
        if let Some(url) = &ctx.meeting_join_url {
            let url = escape_html(url);
            html.push_str(&format!("<p><a href=\"{}\">Join the meeting</a><br>{}</p>", url, url));
        }
    }
    if kind == NotificationKind::Confirmation {
        if let Some(notes) = &ctx.notes {
            html.push_str(&format!("<p><em>Notes:</em> {}</p>", escape_html(notes)));
        }
    }
    html.push_str("<p>CaseMate</p></body></html>");

    let mut text = format!("Hello {},\n\n{}\n\n", ctx.client_name, intro(kind));
    for (label, value) in &rows {
        text.push_str(&format!("{}: {}\n", label, value));
    }
    if show_link {
        if let Some(url) = &ctx.meeting_join_url {
            text.push_str(&format!("\nJoin the meeting: {}\n", url));
        }
    }
    text.push_str("\nCaseMate\n");

    OutgoingEmail {
        to: ctx.client_email.clone(),
        subject: subject(kind, ctx),
        html,
        text,
    }
}
