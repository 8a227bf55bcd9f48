use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::*;
use serde_json::json;
use tracing::instrument;

use super::sharing::{AccessPath, can_access};
use crate::audit::{AuditAction, AuditEvent, AuditLog};
use crate::entity::{physical_file, user_file};
use crate::error::AppError;
use crate::utils::url::normalize_download_url;

/// Authorize a download, count it, and return the URL to redirect to.
///
/// Admins may download any file through the authenticated path.
#[instrument(skip(db, audit))]
pub async fn record_download(
    db: &DatabaseConnection,
    audit: &AuditLog,
    path: AccessPath,
    is_admin: bool,
    user_file_id: i32,
) -> Result<String, AppError> {
    let txn = db.begin().await?;

    let (file, physical) = user_file::Entity::find_by_id(user_file_id)
        .find_also_related(physical_file::Entity)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))?;
    let physical = physical.ok_or_else(|| {
        AppError::Internal(format!("user file {user_file_id} has no physical file"))
    })?;

    let allowed = match path {
        AccessPath::Authenticated { .. } => is_admin || can_access(&txn, path, &file).await?,
        AccessPath::Public => can_access(&txn, path, &file).await?,
    };
    if !allowed {
        return Err(AppError::PermissionDenied);
    }

    user_file::Entity::update_many()
        .col_expr(
            user_file::Column::DownloadCount,
            Expr::col(user_file::Column::DownloadCount).add(1),
        )
        .filter(user_file::Column::Id.eq(file.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    let (user_id, action) = match path {
        AccessPath::Authenticated { requester_id } => {
            (Some(requester_id), AuditAction::FileDownloadAuth)
        }
        AccessPath::Public => (None, AuditAction::FileDownloadPublic),
    };
    audit.record(AuditEvent::new(
        user_id,
        Some(file.id),
        action,
        json!({ "filename": file.filename }),
    ));

    Ok(normalize_download_url(&physical.remote_url))
}
