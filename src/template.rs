// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTML and plain-text renderings of contact notifications.

use crate::notifier::Notification;
use crate::submission::ContactDetails;

const NOT_PROVIDED: &str = "Not provided";

/// Notification sent to the site owner for an accepted submission.
pub fn owner_notification(details: &ContactDetails, to: &str) -> Notification {
    let phone = details.phone.as_deref().unwrap_or(NOT_PROVIDED);
    let message = details.message.as_deref().unwrap_or(NOT_PROVIDED);
    let submitted_at = details.submitted_at.to_rfc3339();

    let text_body = format!(
        "New contact form submission\n\
         \n\
         Name: {}\n\
         Email: {}\n\
         Phone: {}\n\
         \n\
         Message:\n{}\n\
         \n\
         Submitted at: {}\n\
         IP address: {}\n",
        details.name, details.email, phone, message, submitted_at, details.identity,
    );

    let html_body = format!(
        "<!DOCTYPE html>\n\
         <html><body style=\"font-family: Arial, sans-serif; color: #1f2937;\">\n\
         <h2 style=\"color: #0f766e;\">New contact form submission</h2>\n\
         <table cellpadding=\"6\" style=\"border-collapse: collapse;\">\n\
         <tr><td><strong>Name</strong></td><td>{}</td></tr>\n\
         <tr><td><strong>Email</strong></td><td><a href=\"mailto:{}\">{}</a></td></tr>\n\
         <tr><td><strong>Phone</strong></td><td>{}</td></tr>\n\
         </table>\n\
         <h3>Message</h3>\n\
         <p style=\"white-space: pre-wrap;\">{}</p>\n\
         <hr>\n\
         <p style=\"font-size: 12px; color: #6b7280;\">Submitted at {} from {}</p>\n\
         </body></html>\n",
        escape_html(&details.name),
        escape_html(&details.email),
        escape_html(&details.email),
        escape_html(phone),
        escape_html(message),
        submitted_at,
        escape_html(&details.identity),
    );

    Notification {
        to: to.to_string(),
        subject: format!(
            "New contact form submission from {}",
            header_text(&details.name)
        ),
        html_body,
        text_body,
        reply_to: Some(details.email.clone()),
    }
}

/// Auto-reply to the submitter. Replies go to `owner`.
pub fn acknowledgement(details: &ContactDetails, owner: &str) -> Notification {
    let text_body = format!(
        "Hi {},\n\
         \n\
         Thank you for contacting us. We have received your message and \
         will get back to you within 24 hours.\n\
         \n\
         If your enquiry is urgent, simply reply to this email.\n",
        details.name,
    );

    let html_body = format!(
        "<!DOCTYPE html>\n\
         <html><body style=\"font-family: Arial, sans-serif; color: #1f2937;\">\n\
         <p>Hi {},</p>\n\
         <p>Thank you for contacting us. We have received your message and \
         will get back to you within 24 hours.</p>\n\
         <p>If your enquiry is urgent, simply reply to this email.</p>\n\
         </body></html>\n",
        escape_html(&details.name),
    );

    Notification {
        to: details.email.clone(),
        subject: "We received your message".to_string(),
        html_body,
        text_body,
        reply_to: Some(owner.to_string()),
    }
}

/// Single-line form of `s` for use in a header: control characters and
/// whitespace runs become one space.
fn header_text(s: &str) -> String {
    s.split(|c: char| c.is_control() || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
