//! Attachment descriptors from the parsed message-data packet.
//!
//! Content arrives already decoded — transfer-encoding handling happens
//! upstream, at intake.

use serde::{Deserialize, Serialize};

/// Classification key for the attachments map.
///
/// The enum order is the delivery order: regular attachments are processed
/// before inline parts, regardless of how the packet was assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    /// A regular file attachment.
    Attachment,
    /// An inline part referenced from the HTML body (e.g. embedded images).
    Inline,
}

impl AttachmentKind {
    /// Stable lowercase label, used in trace output and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attachment => "attachment",
            Self::Inline => "inline",
        }
    }
}

/// A single decoded attachment.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Filename of the attachment. Generated if missing from the headers.
    pub filename: String,

    /// MIME content type (e.g. `"image/jpeg"`, `"application/pdf"`).
    pub content_type: String,

    /// Decoded size in bytes. Quota pre-flight reads this without touching
    /// the content.
    pub size: u64,

    /// Decoded content bytes.
    pub content: Vec<u8>,
}

impl Attachment {
    /// Build an attachment from decoded content; `size` is derived.
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            size: content.len() as u64,
            content,
        }
    }
}
