use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::files::sharing::{AccessPath, ShareOutcome};
use crate::files::upload::{SpooledFile, UploadOrchestrator};
use crate::files::{analytics, deletion, download, search, sharing};
use crate::models::analytics::AnalyticsResponse;
use crate::models::file::{
    FileListItem, PublicLinkResponse, SearchRequest, ShareWithUserRequest, SharedByMeItem,
    UploadResponse, UploadedFileResponse, validate_search_filters, validate_share_request,
};
use crate::models::shared::MessageResponse;
use crate::state::AppState;
use crate::utils::filename::sanitize_upload_filename;

/// Multipart field carrying the uploaded files.
const FILES_FIELD: &str = "files";

pub fn upload_body_limit(max_bytes: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_bytes)
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "Files",
    operation_id = "uploadFiles",
    summary = "Upload one or more files",
    description = "Stores every part of the `files` multipart field. Identical content is stored \
        once and shared between user files. The whole batch is checked against the storage quota \
        before anything is stored.",
    request_body(content_type = "multipart/form-data", description = "One or more `files` parts"),
    responses(
        (status = 201, description = "Files stored", body = UploadResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Storage quota exceeded (QUOTA_EXCEEDED)", body = ErrorBody),
        (status = 429, description = "Too many requests (RATE_LIMITED)", body = ErrorBody),
        (status = 502, description = "Remote store failure (REMOTE_STORE_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn upload_files(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let max_bytes = state.config.storage.max_upload_bytes as u64;
    let mut spooled = Vec::new();
    let mut total_bytes: u64 = 0;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        let raw_name = field
            .file_name()
            .ok_or_else(|| AppError::Validation("Each file part needs a filename".into()))?
            .to_string();
        let filename = sanitize_upload_filename(&raw_name)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let file = spool_field(field, filename, max_bytes, &mut total_bytes).await?;
        spooled.push(file);
    }

    let orchestrator = UploadOrchestrator::new(
        &state.db,
        state.object_store.as_ref(),
        &state.audit,
        state.config.storage.quota_bytes,
        state.config.storage.remote_timeout(),
    );
    let stored = orchestrator.process_batch(auth_user.user_id, spooled).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "Files uploaded successfully".into(),
            uploaded_count: stored.len(),
            files: stored.into_iter().map(UploadedFileResponse::from).collect(),
        }),
    ))
}

/// Stream one multipart field into a temporary file.
async fn spool_field(
    mut field: axum::extract::multipart::Field<'_>,
    filename: String,
    max_bytes: u64,
    total_bytes: &mut u64,
) -> Result<SpooledFile, AppError> {
    let temp_path = std::env::temp_dir().join(format!("keyvia-upload-{}", Uuid::new_v4()));
    // Created first so the temp file is removed on every error path.
    let spooled = SpooledFile::new(filename, temp_path);

    let mut temp_file = tokio::fs::File::create(spooled.path())
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        *total_bytes += chunk.len() as u64;
        if *total_bytes > max_bytes {
            return Err(AppError::Validation(format!(
                "Upload exceeds maximum size of {max_bytes} bytes"
            )));
        }
        temp_file
            .write_all(&chunk)
            .await
            .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
    }

    temp_file
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;

    Ok(spooled)
}

#[utoipa::path(
    post,
    path = "/search",
    tag = "Files",
    operation_id = "searchFiles",
    summary = "Search visible files",
    description = "Returns files the caller owns or that were shared with them, newest first. \
        All filters are optional.",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Matching files", body = Vec<FileListItem>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 429, description = "Too many requests (RATE_LIMITED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn search_files(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SearchRequest>,
) -> Result<Json<Vec<FileListItem>>, AppError> {
    validate_search_filters(&payload.filters)?;
    let files = search::search_files(&state.db, auth_user.user_id, &payload.filters).await?;
    Ok(Json(files))
}

#[utoipa::path(
    get,
    path = "/shared-by-me",
    tag = "Sharing",
    operation_id = "listSharedByMe",
    summary = "Files the caller made public or shared",
    responses(
        (status = 200, description = "Shared files with their recipients", body = Vec<SharedByMeItem>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 429, description = "Too many requests (RATE_LIMITED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn shared_by_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<SharedByMeItem>>, AppError> {
    Ok(Json(
        search::shared_by_me(&state.db, auth_user.user_id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/analytics",
    tag = "Files",
    operation_id = "getAnalytics",
    summary = "Storage and activity analytics for the caller",
    responses(
        (status = 200, description = "Analytics", body = AnalyticsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 429, description = "Too many requests (RATE_LIMITED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_analytics(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    Ok(Json(
        analytics::owner_analytics(&state.db, auth_user.user_id).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Files",
    operation_id = "deleteFile",
    summary = "Delete a file",
    description = "Removes the caller's file. The stored content is released once no file \
        references it. Admins may delete any file.",
    params(("id" = i32, Path, description = "User file ID")),
    responses(
        (status = 200, description = "File deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
        (status = 429, description = "Too many requests (RATE_LIMITED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    deletion::delete_user_file(
        &state.db,
        state.object_store.as_ref(),
        state.config.storage.remote_timeout(),
        &state.audit,
        auth_user.user_id,
        auth_user.is_admin(),
        id,
    )
    .await?;

    Ok(Json(MessageResponse::new("File deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/{id}/download",
    tag = "Files",
    operation_id = "downloadFile",
    summary = "Download a file",
    description = "Counts the download and redirects to the stored content. Allowed for the \
        owner, recipients of a share, and admins. The token may be passed as a `token` query \
        parameter.",
    params(("id" = i32, Path, description = "User file ID")),
    responses(
        (status = 302, description = "Redirect to the content"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "No access (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
        (status = 429, description = "Too many requests (RATE_LIMITED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn download_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let url = download::record_download(
        &state.db,
        &state.audit,
        AccessPath::Authenticated {
            requester_id: auth_user.user_id,
        },
        auth_user.is_admin(),
        id,
    )
    .await?;

    Ok(found(url))
}

/// `302 Found` pointing at `url`.
pub(crate) fn found(url: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, url)]).into_response()
}

#[utoipa::path(
    post,
    path = "/{id}/share-public",
    tag = "Sharing",
    operation_id = "makeFilePublic",
    summary = "Make a file public",
    description = "Anyone holding the returned link can download the file without signing in.",
    params(("id" = i32, Path, description = "User file ID")),
    responses(
        (status = 200, description = "File is public", body = PublicLinkResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, headers), fields(user_id = auth_user.user_id))]
pub async fn make_public(
    auth_user: AuthUser,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Result<Json<PublicLinkResponse>, AppError> {
    let file = sharing::make_public(&state.db, &state.audit, auth_user.user_id, id).await?;

    Ok(Json(PublicLinkResponse {
        message: "File is now public".into(),
        public_link: public_link(&state, &headers, file.id),
    }))
}

/// Absolute public download URL, based on the request's `Host` header when present.
fn public_link(state: &AppState, headers: &HeaderMap, user_file_id: i32) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!("{}:{}", state.config.server.host, state.config.server.port)
        });
    format!("http://{host}/api/v1/files/public/{user_file_id}")
}

#[utoipa::path(
    delete,
    path = "/{id}/share-public",
    tag = "Sharing",
    operation_id = "makeFilePrivate",
    summary = "Make a file private",
    params(("id" = i32, Path, description = "User file ID")),
    responses(
        (status = 200, description = "File is private", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn make_private(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    sharing::make_private(&state.db, &state.audit, auth_user.user_id, id).await?;
    Ok(Json(MessageResponse::new("File is now private")))
}

#[utoipa::path(
    post,
    path = "/{id}/share",
    tag = "Sharing",
    operation_id = "shareFileWithUser",
    summary = "Share a file with another user",
    description = "Sharing the same file with the same user twice is not an error; the second \
        call answers 200 instead of 201.",
    params(("id" = i32, Path, description = "User file ID")),
    request_body = ShareWithUserRequest,
    responses(
        (status = 201, description = "Share created", body = MessageResponse),
        (status = 200, description = "Already shared with this user", body = MessageResponse),
        (status = 400, description = "Sharing with yourself (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File or recipient not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn share_with_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<ShareWithUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_share_request(&payload)?;
    let recipient = payload.share_with_username.trim();

    let outcome =
        sharing::share_with_user(&state.db, &state.audit, auth_user.user_id, id, recipient)
            .await?;

    Ok(match outcome {
        ShareOutcome::Shared => (
            StatusCode::CREATED,
            Json(MessageResponse::new(format!(
                "File successfully shared with {recipient}"
            ))),
        ),
        ShareOutcome::AlreadyShared => (
            StatusCode::OK,
            Json(MessageResponse::new(format!(
                "File is already shared with {recipient}"
            ))),
        ),
    })
}

#[utoipa::path(
    delete,
    path = "/{id}/unshare-self",
    tag = "Sharing",
    operation_id = "unshareSelf",
    summary = "Remove a file shared with you from your view",
    description = "Only the caller's own grant is removed. Repeating the call is harmless.",
    params(("id" = i32, Path, description = "User file ID")),
    responses(
        (status = 200, description = "Grant removed", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn unshare_self(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    sharing::unshare_self(&state.db, &state.audit, auth_user.user_id, id).await?;
    Ok(Json(MessageResponse::new("File removed from your view")))
}
