//! Visibility changes and the per-recipient sharing ledger.

use chrono::Utc;
use sea_orm::*;
use serde_json::json;
use tracing::{debug, instrument};

use super::find_user_file;
use crate::audit::{AuditAction, AuditEvent, AuditLog};
use crate::entity::{app_user, file_share, user_file};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    AlreadyShared,
}

async fn find_owned_file<C: ConnectionTrait>(
    db: &C,
    owner_id: i32,
    user_file_id: i32,
) -> Result<user_file::Model, AppError> {
    let file = find_user_file(db, user_file_id).await?;
    if file.owner_id != owner_id {
        return Err(AppError::PermissionDenied);
    }
    Ok(file)
}

async fn set_public(
    db: &DatabaseConnection,
    audit: &AuditLog,
    owner_id: i32,
    user_file_id: i32,
    is_public: bool,
) -> Result<user_file::Model, AppError> {
    let file = find_owned_file(db, owner_id, user_file_id).await?;

    let mut active: user_file::ActiveModel = file.into();
    active.is_public = Set(is_public);
    let file = active.update(db).await?;

    let action = if is_public {
        AuditAction::FileSharePublic
    } else {
        AuditAction::FileUnsharePublic
    };
    audit.record(AuditEvent::new(
        Some(owner_id),
        Some(file.id),
        action,
        json!({ "filename": file.filename }),
    ));

    Ok(file)
}

#[instrument(skip(db, audit))]
pub async fn make_public(
    db: &DatabaseConnection,
    audit: &AuditLog,
    owner_id: i32,
    user_file_id: i32,
) -> Result<user_file::Model, AppError> {
    set_public(db, audit, owner_id, user_file_id, true).await
}

#[instrument(skip(db, audit))]
pub async fn make_private(
    db: &DatabaseConnection,
    audit: &AuditLog,
    owner_id: i32,
    user_file_id: i32,
) -> Result<user_file::Model, AppError> {
    set_public(db, audit, owner_id, user_file_id, false).await
}

/// Grant `recipient_username` access to one of the owner's files.
#[instrument(skip(db, audit))]
pub async fn share_with_user(
    db: &DatabaseConnection,
    audit: &AuditLog,
    owner_id: i32,
    user_file_id: i32,
    recipient_username: &str,
) -> Result<ShareOutcome, AppError> {
    let recipient = app_user::Entity::find()
        .filter(app_user::Column::Username.eq(recipient_username.trim()))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User to share with not found".into()))?;

    if recipient.id == owner_id {
        return Err(AppError::Validation(
            "You cannot share a file with yourself".into(),
        ));
    }

    let file = find_owned_file(db, owner_id, user_file_id).await?;

    let share = file_share::ActiveModel {
        user_file_id: Set(file.id),
        recipient_id: Set(recipient.id),
        shared_at: Set(Utc::now()),
        ..Default::default()
    };

    match share.insert(db).await {
        Ok(_) => {}
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            debug!(recipient_id = recipient.id, "File already shared with recipient");
            return Ok(ShareOutcome::AlreadyShared);
        }
        Err(e) => return Err(e.into()),
    }

    audit.record(AuditEvent::new(
        Some(owner_id),
        Some(file.id),
        AuditAction::FileShareUser,
        json!({
            "filename": file.filename,
            "recipientUsername": recipient.username,
        }),
    ));

    Ok(ShareOutcome::Shared)
}

/// Remove the caller's own grant for a file shared with them.
///
/// Returns whether a grant existed. Other recipients and the file itself
/// are never touched.
#[instrument(skip(db, audit))]
pub async fn unshare_self(
    db: &DatabaseConnection,
    audit: &AuditLog,
    recipient_id: i32,
    user_file_id: i32,
) -> Result<bool, AppError> {
    let result = file_share::Entity::delete_many()
        .filter(file_share::Column::UserFileId.eq(user_file_id))
        .filter(file_share::Column::RecipientId.eq(recipient_id))
        .exec(db)
        .await?;

    let removed = result.rows_affected > 0;
    if removed {
        audit.record(AuditEvent::new(
            Some(recipient_id),
            Some(user_file_id),
            AuditAction::FileUnshareSelf,
            serde_json::Value::Null,
        ));
    }
    Ok(removed)
}

/// How a file is being reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPath {
    /// Through the authenticated API by this user.
    Authenticated { requester_id: i32 },
    /// Through the unauthenticated public link.
    Public,
}

/// Whether `file` is visible through `path`: owned by or shared with the
/// requester, or public when reached through the public link.
pub async fn can_access<C: ConnectionTrait>(
    db: &C,
    path: AccessPath,
    file: &user_file::Model,
) -> Result<bool, DbErr> {
    let requester_id = match path {
        AccessPath::Public => return Ok(file.is_public),
        AccessPath::Authenticated { requester_id } => requester_id,
    };
    if file.owner_id == requester_id {
        return Ok(true);
    }
    let shared = file_share::Entity::find()
        .filter(file_share::Column::UserFileId.eq(file.id))
        .filter(file_share::Column::RecipientId.eq(requester_id))
        .count(db)
        .await?;
    Ok(shared > 0)
}
