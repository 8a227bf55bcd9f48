use axum::{Json, extract::State};
use sea_orm::*;
use tracing::instrument;

use crate::entity::audit_log;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::audit::AuditLogEntry;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Audit",
    operation_id = "listMyAuditLogs",
    summary = "The caller's audit history",
    description = "Entries are written asynchronously and may appear shortly after the action.",
    responses(
        (status = 200, description = "Audit entries, newest first", body = Vec<AuditLogEntry>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 429, description = "Too many requests (RATE_LIMITED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_logs(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AuditLogEntry>>, AppError> {
    let logs = audit_log::Entity::find()
        .filter(audit_log::Column::UserId.eq(auth_user.user_id))
        .order_by_desc(audit_log::Column::CreatedAt)
        .order_by_desc(audit_log::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(logs.into_iter().map(AuditLogEntry::from).collect()))
}
