use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::files::search;
use crate::models::file::FileListItem;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/files",
    tag = "Admin",
    operation_id = "listAllFiles",
    summary = "List every file in the system",
    description = "Returns all user files with their owner, newest first. Requires the `admin` role.",
    responses(
        (status = 200, description = "All files", body = Vec<FileListItem>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_all_files(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<FileListItem>>, AppError> {
    auth_user.require_admin()?;
    Ok(Json(search::list_all_files(&state.db).await?))
}
