//! Store attachments from inbound email as private files.
//!
//! The handler checks the sender's `ManageOwnFiles` capability, resolves a
//! quota ceiling, then classifies each attachment: stored, skipped over
//! quota, or failed. Individual attachment problems never abort the message.

use tracing::{debug, info, warn};

use crate::error::{DepotError, Result};
use crate::model::message::{InboundRecord, MessageData};
use crate::quota::{self, QuotaCeiling};
use crate::security::policy::{AccessPolicy, UserDirectory};
use crate::security::{Capability, UserContext};
use crate::storage::{FileAreaKey, FileStorage, NewStoredFile};

use super::{DeliveryOutcome, FailedAttachment, MessageHandler, SkippedAttachment};

/// Directory path within the private area; attachments land at the root.
const FILE_PATH: &str = "/";

/// Site-wide settings stamped onto stored files.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    /// License recorded on stored files.
    pub default_license: String,
    /// Per-user private area ceiling in bytes.
    pub user_quota_bytes: u64,
}

/// The private-files delivery handler.
pub struct PrivateFilesHandler<'a> {
    storage: &'a dyn FileStorage,
    policy: &'a dyn AccessPolicy,
    directory: &'a dyn UserDirectory,
    settings: SiteSettings,
}

impl<'a> PrivateFilesHandler<'a> {
    pub fn new(
        storage: &'a dyn FileStorage,
        policy: &'a dyn AccessPolicy,
        directory: &'a dyn UserDirectory,
        settings: SiteSettings,
    ) -> Self {
        Self {
            storage,
            policy,
            directory,
            settings,
        }
    }
}

impl MessageHandler for PrivateFilesHandler<'_> {
    fn name(&self) -> &'static str {
        "Private files"
    }

    fn description(&self) -> &'static str {
        "Store attachments from inbound email in the sender's private file area"
    }

    fn process_message(
        &self,
        record: &InboundRecord,
        data: &MessageData,
    ) -> Result<DeliveryOutcome> {
        let user = self
            .directory
            .user(record.user_id)
            .ok_or(DepotError::UnknownUser(record.user_id))?;
        let context = UserContext::for_user(&user);

        if !self
            .policy
            .has_capability(&user, Capability::ManageOwnFiles, &context)
        {
            return Err(DepotError::PermissionDenied {
                username: user.username.clone(),
                capability: Capability::ManageOwnFiles.as_str().to_string(),
            });
        }

        let ceiling = quota::ceiling_for(
            &user,
            &context,
            self.policy,
            self.settings.user_quota_bytes,
        );
        let area = FileAreaKey::user_private(context.id);

        let mut outcome = DeliveryOutcome::default();

        for (kind, attachment) in data.iter_attachments() {
            debug!(
                kind = kind.as_str(),
                filename = %attachment.filename,
                size = attachment.size,
                "processing attachment"
            );

            let over = match quota::would_exceed(self.storage, &area, ceiling, attachment.size) {
                Ok(over) => over,
                Err(e) => {
                    warn!(filename = %attachment.filename, error = %e, "quota check failed");
                    outcome.failed.push(FailedAttachment {
                        filename: attachment.filename.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            if over {
                info!(
                    filename = %attachment.filename,
                    size = attachment.size,
                    "skipping attachment, user would be over quota"
                );
                outcome.skipped.push(SkippedAttachment {
                    filename: attachment.filename.clone(),
                    size: attachment.size,
                });
                continue;
            }

            let filename =
                match self
                    .storage
                    .unused_filename(&area, FILE_PATH, &attachment.filename)
                {
                    Ok(filename) => filename,
                    Err(e) => {
                        warn!(filename = %attachment.filename, error = %e, "cannot resolve a filename");
                        outcome.failed.push(FailedAttachment {
                            filename: attachment.filename.clone(),
                            reason: e.to_string(),
                        });
                        continue;
                    }
                };

            let file = NewStoredFile {
                area: area.clone(),
                file_path: FILE_PATH.to_string(),
                filename,
                author: user.full_name.clone(),
                license: self.settings.default_license.clone(),
                user_id: user.id,
            };

            debug!(
                filename = %file.filename,
                path = %format!(
                    "/{}/{}/{}/{}{}{}",
                    area.context_id, area.component, area.file_area,
                    area.item_id, file.file_path, file.filename
                ),
                "attaching file"
            );

            match self.storage.create_file(&file, &attachment.content) {
                Ok(stored) => {
                    info!(filename = %stored.filename, size = stored.size, "attachment stored");
                    outcome.uploaded.push(stored);
                }
                Err(e) => {
                    warn!(filename = %file.filename, error = %e, "failed to store attachment");
                    outcome.failed.push(FailedAttachment {
                        filename: attachment.filename.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            message_id = record.id,
            uploaded = outcome.uploaded.len(),
            skipped = outcome.skipped.len(),
            failed = outcome.failed.len(),
            "message processed"
        );

        // Skipped and failed attachments do not constitute a message failure.
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DepotError;
    use crate::model::attachment::{Attachment, AttachmentKind};
    use crate::model::user::User;
    use crate::security::policy::{Grants, StaticAccess};
    use crate::storage::StoredFileRecord;

    /// Storage stub whose writes always fail, for the failed bucket.
    struct BrokenStorage;

    impl FileStorage for BrokenStorage {
        fn unused_filename(
            &self,
            _area: &FileAreaKey,
            _file_path: &str,
            requested: &str,
        ) -> Result<String> {
            Ok(requested.to_string())
        }

        fn create_file(&self, file: &NewStoredFile, _content: &[u8]) -> Result<StoredFileRecord> {
            Err(DepotError::FileExists(file.filename.clone()))
        }

        fn area_bytes_used(&self, _area: &FileAreaKey) -> Result<u64> {
            Ok(0)
        }

        fn list_area(&self, _area: &FileAreaKey) -> Result<Vec<StoredFileRecord>> {
            Ok(Vec::new())
        }
    }

    fn sample_user() -> User {
        User {
            id: 1,
            username: "alice".to_string(),
            full_name: "Alice Archer".to_string(),
            email: "alice@example.com".to_string(),
        }
    }

    fn sample_record() -> InboundRecord {
        InboundRecord {
            id: 42,
            user_id: 1,
            address: "alice@example.com".to_string(),
            received_at: chrono::Utc::now(),
        }
    }

    fn settings() -> SiteSettings {
        SiteSettings {
            default_license: "all-rights-reserved".to_string(),
            user_quota_bytes: 1024,
        }
    }

    #[test]
    fn test_storage_failure_lands_in_failed_bucket() {
        let mut access = StaticAccess::new();
        access.insert(sample_user(), Grants::default());
        let storage = BrokenStorage;
        let handler = PrivateFilesHandler::new(&storage, &access, &access, settings());

        let mut data = MessageData::default();
        data.push_attachment(
            AttachmentKind::Attachment,
            Attachment::new("doc.txt", "text/plain", b"hello".to_vec()),
        );

        let outcome = handler.process_message(&sample_record(), &data).unwrap();
        assert!(outcome.uploaded.is_empty());
        assert!(outcome.skipped.is_empty());
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].filename, "doc.txt");
    }

    #[test]
    fn test_unknown_user_rejects_message() {
        let access = StaticAccess::new();
        let storage = BrokenStorage;
        let handler = PrivateFilesHandler::new(&storage, &access, &access, settings());

        let err = handler
            .process_message(&sample_record(), &MessageData::default())
            .unwrap_err();
        assert!(matches!(err, DepotError::UnknownUser(1)));
    }

    #[test]
    fn test_handler_metadata() {
        let access = StaticAccess::new();
        let storage = BrokenStorage;
        let handler = PrivateFilesHandler::new(&storage, &access, &access, settings());
        assert_eq!(handler.name(), "Private files");
        assert!(!handler.description().is_empty());
    }
}
