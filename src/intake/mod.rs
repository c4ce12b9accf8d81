//! Build message-data packets from raw RFC 5322 messages.
//!
//! Intake validation — sender verification, address signing — happens before
//! this point. This module only maps an already-accepted message into the
//! packet handlers consume.

use std::collections::BTreeMap;

use mail_parser::{MessageParser, MimeHeaders};

use crate::error::{DepotError, Result};
use crate::model::attachment::{Attachment, AttachmentKind};
use crate::model::message::MessageData;

/// Parse a raw message and extract the data packet.
///
/// Attachment parts with an `inline` content disposition are classified as
/// [`AttachmentKind::Inline`]; everything else is a regular attachment.
/// Parts without a filename get `attachment_{idx}`.
pub fn message_data_from_eml(raw: &[u8]) -> Result<MessageData> {
    let parser = MessageParser::default();
    let msg = parser
        .parse(raw)
        .ok_or_else(|| DepotError::Mime("failed to parse message".to_string()))?;

    let subject = msg.subject().unwrap_or("").to_string();
    let sender = msg
        .from()
        .and_then(|a| a.first())
        .and_then(|a| a.address.as_deref())
        .unwrap_or("")
        .to_string();

    let mut attachments: BTreeMap<AttachmentKind, Vec<Attachment>> = BTreeMap::new();

    for (idx, part) in msg.attachments().enumerate() {
        let filename = part
            .attachment_name()
            .map(String::from)
            .unwrap_or_else(|| format!("attachment_{idx}"));

        let content_type = part
            .content_type()
            .map(|ct: &mail_parser::ContentType| {
                let main = ct.ctype();
                match ct.subtype() {
                    Some(sub) => format!("{main}/{sub}"),
                    None => main.to_string(),
                }
            })
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let is_inline = part
            .content_disposition()
            .map(|d: &mail_parser::ContentType| d.ctype() == "inline")
            .unwrap_or(false);

        let kind = if is_inline {
            AttachmentKind::Inline
        } else {
            AttachmentKind::Attachment
        };

        attachments.entry(kind).or_default().push(Attachment::new(
            filename,
            content_type,
            part.contents().to_vec(),
        ));
    }

    Ok(MessageData {
        subject,
        sender,
        attachments,
    })
}
