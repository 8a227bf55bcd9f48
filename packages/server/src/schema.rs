use sea_orm::*;
use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use tracing::{info, warn};

use crate::entity::{audit_log, user_file};

/// Ensure composite indexes exist.
///
/// Schema sync only creates single-column indexes, so these are added
/// manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Listing and search: WHERE owner_id = ? ORDER BY uploaded_at DESC
    let owner_uploaded = Index::create()
        .if_not_exists()
        .name("idx_user_file_owner_uploaded")
        .table(user_file::Entity)
        .col(user_file::Column::OwnerId)
        .col(user_file::Column::UploadedAt)
        .to_string(PostgresQueryBuilder);

    // Audit history: WHERE user_id = ? ORDER BY created_at DESC
    let audit_user_created = Index::create()
        .if_not_exists()
        .name("idx_audit_log_user_created")
        .table(audit_log::Entity)
        .col(audit_log::Column::UserId)
        .col(audit_log::Column::CreatedAt)
        .to_string(PostgresQueryBuilder);

    for (name, stmt) in [
        ("idx_user_file_owner_uploaded", owner_uploaded),
        ("idx_audit_log_user_created", audit_user_created),
    ] {
        match db.execute_unprepared(&stmt).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => warn!("Failed to create index {}: {}", name, e),
        }
    }

    Ok(())
}
