use axum::extract::{Path, State};
use axum::response::Response;
use tracing::instrument;

use super::file::found;
use crate::error::{AppError, ErrorBody};
use crate::files::download;
use crate::files::sharing::AccessPath;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/files/public/{id}",
    tag = "Sharing",
    operation_id = "downloadPublicFile",
    summary = "Download a public file",
    description = "No authentication. Counts the download and redirects to the stored content.",
    params(("id" = i32, Path, description = "User file ID")),
    responses(
        (status = 302, description = "Redirect to the content"),
        (status = 403, description = "File is not public (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn download_public_file(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let url =
        download::record_download(&state.db, &state.audit, AccessPath::Public, false, id).await?;
    Ok(found(url))
}
