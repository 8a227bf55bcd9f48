//! Quota-aware, deduplicating upload workflow.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use common::storage::{
    BoxReader, ContentHash, ObjectStore, ResourceCategory, StoredObject, hash_reader, mime,
};
use sea_orm::*;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use super::{quota, registry, remote};
use crate::audit::{AuditAction, AuditEvent, AuditLog};
use crate::entity::{physical_file, user_file};
use crate::error::AppError;

/// An uploaded multipart part spooled to a temporary file.
///
/// The temporary file is removed when this value is dropped.
#[derive(Debug)]
pub struct SpooledFile {
    filename: String,
    path: PathBuf,
}

impl SpooledFile {
    pub fn new(filename: String, path: PathBuf) -> Self {
        Self { filename, path }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SpooledFile {
    fn drop(&mut self) {
        let path = std::mem::take(&mut self.path);
        // Unlinking blocks, so on a runtime it goes to the blocking pool. Best effort.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || {
                    let _ = std::fs::remove_file(path);
                });
            }
            Err(_) => {
                let _ = std::fs::remove_file(path);
            }
        }
    }
}

/// A spooled file with its fingerprint and MIME type resolved.
#[derive(Debug)]
pub struct PreparedFile {
    pub spooled: SpooledFile,
    pub hash: ContentHash,
    pub size: u64,
    pub mime_type: String,
}

/// Result of storing one file.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub user_file_id: i32,
    pub filename: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub deduplicated: bool,
}

/// Physical row resolved for an upload, plus the object uploaded for it, if any.
struct Resolved {
    physical: physical_file::Model,
    uploaded: Option<StoredObject>,
}

pub struct UploadOrchestrator<'a> {
    db: &'a DatabaseConnection,
    store: &'a dyn ObjectStore,
    audit: &'a AuditLog,
    quota_bytes: u64,
    remote_timeout: Duration,
}

impl<'a> UploadOrchestrator<'a> {
    pub fn new(
        db: &'a DatabaseConnection,
        store: &'a dyn ObjectStore,
        audit: &'a AuditLog,
        quota_bytes: u64,
        remote_timeout: Duration,
    ) -> Self {
        Self {
            db,
            store,
            audit,
            quota_bytes,
            remote_timeout,
        }
    }

    /// Hash the content and determine its MIME type.
    pub async fn prepare(&self, spooled: SpooledFile) -> Result<PreparedFile, AppError> {
        let mut file = tokio::fs::File::open(spooled.path())
            .await
            .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))?;

        let (hash, size) = hash_reader(&mut file).await?;
        if size == 0 {
            return Err(AppError::Validation(format!(
                "File '{}' is empty",
                spooled.filename()
            )));
        }
        let mime_type = mime::detect(spooled.filename(), &mut file).await?;

        Ok(PreparedFile {
            spooled,
            hash,
            size,
            mime_type,
        })
    }

    /// Store a batch of files for `owner_id`.
    ///
    /// Quota is admitted for the whole batch before anything is uploaded.
    /// Each file then commits in its own transaction; the batch stops at the
    /// first failure and files committed before it stay committed.
    #[instrument(skip(self, files), fields(file_count = files.len()))]
    pub async fn process_batch(
        &self,
        owner_id: i32,
        files: Vec<SpooledFile>,
    ) -> Result<Vec<UploadedFile>, AppError> {
        if files.is_empty() {
            return Err(AppError::Validation(
                "No files provided in 'files' field".into(),
            ));
        }

        let mut prepared = Vec::with_capacity(files.len());
        for file in files {
            prepared.push(self.prepare(file).await?);
        }

        let batch: Vec<(ContentHash, u64)> = prepared.iter().map(|p| (p.hash, p.size)).collect();
        let new_bytes =
            quota::check_and_reserve(self.db, owner_id, self.quota_bytes, &batch).await?;
        debug!(owner_id, new_bytes, "Batch admitted by quota");

        let mut stored = Vec::with_capacity(prepared.len());
        for file in &prepared {
            match self.process_one(owner_id, file).await {
                Ok(uploaded) => stored.push(uploaded),
                Err(e) if stored.is_empty() => return Err(e),
                Err(e) => {
                    return Err(AppError::BatchIncomplete {
                        stored: stored.len(),
                        cause: Box::new(e),
                    });
                }
            }
        }

        Ok(stored)
    }

    /// Store one prepared file in its own transaction.
    #[instrument(skip(self, file), fields(filename = %file.spooled.filename(), content_hash = %file.hash))]
    pub async fn process_one(
        &self,
        owner_id: i32,
        file: &PreparedFile,
    ) -> Result<UploadedFile, AppError> {
        let txn = self.db.begin().await?;

        let resolved = match registry::increment_ref(&txn, &file.hash).await? {
            Some(physical) => Resolved {
                physical,
                uploaded: None,
            },
            None => self.register_new(&txn, file).await?,
        };
        let deduplicated = resolved.uploaded.is_none();

        let user_file = user_file::ActiveModel {
            owner_id: Set(owner_id),
            physical_file_id: Set(resolved.physical.id),
            filename: Set(file.spooled.filename().to_string()),
            is_public: Set(false),
            download_count: Set(0),
            uploaded_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        if let Err(e) = txn.commit().await {
            if let Some(object) = &resolved.uploaded {
                warn!(
                    object_id = %object.object_id,
                    content_hash = %file.hash,
                    "Commit failed after upload, orphaned remote object"
                );
            }
            return Err(e.into());
        }

        info!(
            owner_id,
            user_file_id = user_file.id,
            physical_file_id = resolved.physical.id,
            deduplicated,
            "File stored"
        );

        self.audit.record(AuditEvent::new(
            Some(owner_id),
            Some(user_file.id),
            AuditAction::FileUpload,
            json!({
                "filename": user_file.filename,
                "size": file.size,
                "deduplicated": deduplicated,
            }),
        ));

        Ok(UploadedFile {
            user_file_id: user_file.id,
            filename: user_file.filename,
            size_bytes: file.size,
            mime_type: resolved.physical.mime_type,
            uploaded_at: user_file.uploaded_at,
            deduplicated,
        })
    }

    /// Upload new content and register it, recovering from a concurrent
    /// registration of the same fingerprint.
    async fn register_new(
        &self,
        txn: &DatabaseTransaction,
        file: &PreparedFile,
    ) -> Result<Resolved, AppError> {
        let reader: BoxReader = Box::new(
            tokio::fs::File::open(file.spooled.path())
                .await
                .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))?,
        );
        let category = ResourceCategory::from_mime(&file.mime_type);
        let stored = remote::upload(
            self.store,
            self.remote_timeout,
            reader,
            category,
            &file.mime_type,
        )
        .await?;
        debug!(object_id = %stored.object_id, %category, "Uploaded new content");

        let savepoint = txn.begin().await?;
        match registry::insert_new(&savepoint, &file.hash, &stored, file.size, &file.mime_type)
            .await
        {
            Ok(physical) => {
                savepoint.commit().await?;
                Ok(Resolved {
                    physical,
                    uploaded: Some(stored),
                })
            }
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                savepoint.rollback().await?;
                debug!("Content registered concurrently, falling back to increment");
                self.discard(&stored).await;

                let physical = registry::increment_ref(txn, &file.hash)
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal(format!(
                            "physical file {} missing after unique violation",
                            file.hash
                        ))
                    })?;
                Ok(Resolved {
                    physical,
                    uploaded: None,
                })
            }
            Err(e) => {
                let _ = savepoint.rollback().await;
                self.discard(&stored).await;
                Err(e.into())
            }
        }
    }

    async fn discard(&self, stored: &StoredObject) {
        let destroyed = remote::destroy(self.store, self.remote_timeout, &stored.object_id).await;
        if let Err(e) = destroyed {
            warn!(
                object_id = %stored.object_id,
                error = %e,
                "Failed to discard uploaded object, orphaned remote object"
            );
        }
    }
}
