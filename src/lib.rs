//! `maildepot` — deliver attachments from inbound email into per-user
//! private file areas.
//!
//! This crate provides the delivery side of an inbound-email pipeline: a
//! parsed message-data packet goes through the private-files handler, which
//! checks the sender's capability, enforces the storage quota, and persists
//! each attachment through the file-storage seam.

pub mod config;
pub mod error;
pub mod handler;
pub mod intake;
pub mod model;
pub mod quota;
pub mod security;
pub mod storage;
