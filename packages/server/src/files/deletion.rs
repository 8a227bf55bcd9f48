//! User file removal and physical file garbage collection.

use std::time::Duration;

use common::storage::ObjectStore;
use sea_orm::*;
use serde_json::json;
use tracing::{info, instrument, warn};

use super::{find_user_file_for_update, registry, remote};
use crate::audit::{AuditAction, AuditEvent, AuditLog};
use crate::entity::{file_share, user_file};
use crate::error::AppError;

#[derive(Debug)]
pub struct DeletedFile {
    pub user_file_id: i32,
    pub filename: String,
    /// Whether the physical content was released as well.
    pub purged: bool,
}

/// Delete a user file, releasing its physical content when the last
/// reference goes away.
///
/// A failure to destroy the remote object is logged and does not stop the
/// metadata from being removed.
#[instrument(skip(db, store, audit))]
pub async fn delete_user_file(
    db: &DatabaseConnection,
    store: &dyn ObjectStore,
    remote_timeout: Duration,
    audit: &AuditLog,
    requester_id: i32,
    is_admin: bool,
    user_file_id: i32,
) -> Result<DeletedFile, AppError> {
    let txn = db.begin().await?;

    let file = find_user_file_for_update(&txn, user_file_id).await?;
    if file.owner_id != requester_id && !is_admin {
        return Err(AppError::PermissionDenied);
    }

    file_share::Entity::delete_many()
        .filter(file_share::Column::UserFileId.eq(file.id))
        .exec(&txn)
        .await?;
    user_file::Entity::delete_by_id(file.id).exec(&txn).await?;

    let physical = registry::decrement_ref(&txn, file.physical_file_id)
        .await?
        .ok_or_else(|| {
            AppError::Internal(format!(
                "physical file {} referenced by user file {} is missing",
                file.physical_file_id, file.id
            ))
        })?;

    let purged = physical.ref_count <= 0;
    if purged {
        let destroyed = remote::destroy(store, remote_timeout, &physical.remote_object_id).await;
        if let Err(e) = destroyed {
            warn!(
                object_id = %physical.remote_object_id,
                physical_file_id = physical.id,
                error = %e,
                "Could not destroy remote object, orphaned remote object"
            );
        }
        registry::delete(&txn, physical.id).await?;
    }

    txn.commit().await?;

    info!(
        user_file_id = file.id,
        physical_file_id = physical.id,
        ref_count = physical.ref_count,
        purged,
        "User file deleted"
    );

    audit.record(AuditEvent::new(
        Some(requester_id),
        Some(file.id),
        AuditAction::FileDelete,
        json!({ "filename": file.filename, "purged": purged }),
    ));

    Ok(DeletedFile {
        user_file_id: file.id,
        filename: file.filename,
        purged,
    })
}
