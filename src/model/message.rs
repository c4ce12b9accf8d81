//! Inbound message record and the parsed message-data packet.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::attachment::{Attachment, AttachmentKind};

/// A validated inbound message, as handed over by the intake pipeline.
///
/// By the time a handler sees this record, the message has already been
/// matched to a sending user and passed intake validation.
#[derive(Debug, Clone)]
pub struct InboundRecord {
    /// Row id assigned at intake.
    pub id: u64,

    /// The sending user this message was matched to.
    pub user_id: u64,

    /// The address the message arrived on.
    pub address: String,

    /// When the message passed intake validation.
    pub received_at: DateTime<Utc>,
}

/// The parsed message-data packet fed to handlers.
#[derive(Debug, Clone, Default)]
pub struct MessageData {
    /// Decoded subject line.
    pub subject: String,

    /// Envelope sender address.
    pub sender: String,

    /// Attachments grouped by kind.
    ///
    /// `BTreeMap` keeps iteration deterministic: kinds in enum order,
    /// packet order within a kind.
    pub attachments: BTreeMap<AttachmentKind, Vec<Attachment>>,
}

impl MessageData {
    /// Append an attachment under the given kind.
    pub fn push_attachment(&mut self, kind: AttachmentKind, attachment: Attachment) {
        self.attachments.entry(kind).or_default().push(attachment);
    }

    /// Total number of attachments across all kinds.
    pub fn attachment_count(&self) -> usize {
        self.attachments.values().map(Vec::len).sum()
    }

    /// Iterate attachments in delivery order.
    pub fn iter_attachments(&self) -> impl Iterator<Item = (AttachmentKind, &Attachment)> {
        self.attachments
            .iter()
            .flat_map(|(kind, list)| list.iter().map(move |a| (*kind, a)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iteration_order_is_kind_then_packet_order() {
        let mut data = MessageData::default();
        data.push_attachment(
            AttachmentKind::Inline,
            Attachment::new("logo.png", "image/png", vec![1]),
        );
        data.push_attachment(
            AttachmentKind::Attachment,
            Attachment::new("a.txt", "text/plain", vec![2]),
        );
        data.push_attachment(
            AttachmentKind::Attachment,
            Attachment::new("b.txt", "text/plain", vec![3]),
        );

        let names: Vec<&str> = data
            .iter_attachments()
            .map(|(_, a)| a.filename.as_str())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "logo.png"]);
        assert_eq!(data.attachment_count(), 3);
    }
}
