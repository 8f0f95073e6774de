//! RFC 2822 rendering of outgoing mail.
//!
//! A message without attachments is a single `text/plain` part; with
//! attachments it becomes `multipart/mixed` with one part per file.

use mail_builder::headers::address::Address;
use mail_builder::MessageBuilder;

const ATTACHMENT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, thiserror::Error)]
pub enum MimeError {
    #[error("Invalid {0}: header values must not contain line breaks")]
    LineBreak(&'static str),

    #[error("Failed to render message: {0}")]
    Write(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl OutgoingEmail {
    /// Header fields end up verbatim in the header block, so CR/LF is refused
    /// rather than encoded.
    pub fn validate(&self) -> Result<(), MimeError> {
        let fields = [
            ("to", Some(self.to.as_str())),
            ("subject", Some(self.subject.as_str())),
            ("cc", self.cc.as_deref()),
            ("bcc", self.bcc.as_deref()),
        ];
        for (name, value) in fields {
            if value.is_some_and(|v| v.contains(['\r', '\n'])) {
                return Err(MimeError::LineBreak(name));
            }
        }
        Ok(())
    }

    pub fn render(&self) -> Result<String, MimeError> {
        self.validate()?;

        let mut builder = MessageBuilder::new()
            .to(recipients(&self.to))
            .subject(self.subject.as_str())
            .text_body(self.body.as_str());

        if let Some(cc) = self.cc.as_deref().filter(|s| !s.trim().is_empty()) {
            builder = builder.cc(recipients(cc));
        }
        if let Some(bcc) = self.bcc.as_deref().filter(|s| !s.trim().is_empty()) {
            builder = builder.bcc(recipients(bcc));
        }
        for attachment in &self.attachments {
            builder = builder.attachment(
                ATTACHMENT_CONTENT_TYPE,
                attachment.filename.as_str(),
                attachment.bytes.as_slice(),
            );
        }

        Ok(builder.write_to_string()?)
    }
}

/// Comma-separated address list.
fn recipients(raw: &str) -> Address<'_> {
    let list: Vec<&str> = raw.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
    Address::from(list)
}
