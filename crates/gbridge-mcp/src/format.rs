//! Text renderings of gbridge responses for agent consumption.

use gbridge_protocol::{
    CreateReminderResponse, DownloadAttachmentsResponse, MessageResponse, ReadEmailsResponse,
    ReadRemindersResponse, SendEmailResponse,
};
use serde_json::Value;

const NA: &str = "N/A";

pub fn emails(resp: &ReadEmailsResponse) -> String {
    if resp.emails.is_empty() {
        return "No emails found matching the criteria.".to_string();
    }

    let blocks: Vec<String> = resp
        .emails
        .iter()
        .map(|email| {
            format!(
                "ID: {}\nFrom: {}\nSubject: {}\nSnippet: {}\nLabels: {}\n",
                email.id,
                email.from,
                email.subject,
                email.snippet,
                email.labels.join(", ")
            )
        })
        .collect();

    format!("Found {} email(s):\n\n{}", resp.emails.len(), blocks.join("\n---\n"))
}

pub fn sent(resp: &SendEmailResponse) -> String {
    let mut out = format!(
        "✅ Email sent successfully!\n\nMessage ID: {}\nTo: {}\nSubject: {}\n",
        resp.message_id, resp.details.to, resp.details.subject
    );
    if !resp.details.attachments.is_empty() {
        out.push_str(&format!("Attachments: {}\n", resp.details.attachments.join(", ")));
    }
    out
}

pub fn downloads(resp: &DownloadAttachmentsResponse) -> String {
    if resp.attachments.is_empty() {
        if resp.message.is_empty() {
            return "No attachments found.".to_string();
        }
        return resp.message.clone();
    }

    let lines: Vec<String> = resp
        .attachments
        .iter()
        .map(|att| format!("- {} → {}", att.filename, att.file_path))
        .collect();

    format!(
        "✅ Downloaded {} attachment(s):\n\n{}\n\n{}",
        resp.attachments.len(),
        lines.join("\n"),
        resp.message
    )
}

pub fn reminder_created(resp: &CreateReminderResponse) -> String {
    let link = if resp.html_link.is_empty() { NA } else { resp.html_link.as_str() };
    format!(
        "✅ Reminder created successfully!\n\nEvent ID: {}\nLink: {}\n",
        resp.event_id, link
    )
}

pub fn events(resp: &ReadRemindersResponse) -> String {
    if resp.events.is_empty() {
        return "No calendar events found.".to_string();
    }

    let blocks: Vec<String> = resp
        .events
        .iter()
        .map(|event| {
            let start = event
                .get("start")
                .and_then(|s| s.get("dateTime").or_else(|| s.get("date")))
                .and_then(Value::as_str)
                .unwrap_or(NA);
            format!(
                "ID: {}\nSummary: {}\nStart: {}\nStatus: {}\n",
                field(event, "id"),
                field(event, "summary"),
                start,
                field(event, "status")
            )
        })
        .collect();

    format!("Found {} event(s):\n\n{}", resp.events.len(), blocks.join("\n---\n"))
}

pub fn removed(resp: &MessageResponse) -> String {
    format!("✅ {}", resp.message)
}

fn field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or(NA)
}
