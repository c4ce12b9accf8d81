//! Inbound message handlers.
//!
//! A handler receives a validated inbound record plus the parsed data packet
//! and performs one pipeline action. Handlers expose a name and description
//! for admin tooling.

pub mod private_files;

use serde::Serialize;

use crate::error::Result;
use crate::model::message::{InboundRecord, MessageData};
use crate::storage::StoredFileRecord;

/// A processing step in the inbound pipeline.
pub trait MessageHandler {
    /// Short human-readable name, shown in admin tooling.
    fn name(&self) -> &'static str;

    /// One-line description of what the handler does.
    fn description(&self) -> &'static str;

    /// Process a message received and validated by the intake pipeline.
    ///
    /// Per-attachment problems are reported in the outcome, never as an
    /// `Err`; an `Err` means the message as a whole was rejected.
    fn process_message(&self, record: &InboundRecord, data: &MessageData)
        -> Result<DeliveryOutcome>;
}

/// An attachment skipped because storing it would exceed the user's quota.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedAttachment {
    pub filename: String,
    pub size: u64,
}

/// An attachment that could not be persisted.
#[derive(Debug, Clone, Serialize)]
pub struct FailedAttachment {
    pub filename: String,
    pub reason: String,
}

/// Per-attachment classification for one processed message.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeliveryOutcome {
    /// Files persisted into the user's private area.
    pub uploaded: Vec<StoredFileRecord>,
    /// Attachments skipped over quota.
    pub skipped: Vec<SkippedAttachment>,
    /// Attachments that failed for another reason.
    pub failed: Vec<FailedAttachment>,
}

impl DeliveryOutcome {
    /// True when every attachment was stored.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }

    /// Number of attachments classified, across all buckets.
    pub fn total(&self) -> usize {
        self.uploaded.len() + self.skipped.len() + self.failed.len()
    }
}
