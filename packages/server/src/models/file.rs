use chrono::{DateTime, Utc};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::files::upload::UploadedFile;

/// One stored file in an upload response.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFileResponse {
    #[schema(example = 17)]
    pub user_file_id: i32,
    #[schema(example = "report.pdf")]
    pub filename: String,
    #[schema(example = 48213)]
    pub size_bytes: u64,
    #[schema(example = "application/pdf")]
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
    /// `true` when identical content was already stored and no upload happened.
    pub deduplicated: bool,
}

impl From<UploadedFile> for UploadedFileResponse {
    fn from(file: UploadedFile) -> Self {
        Self {
            user_file_id: file.user_file_id,
            filename: file.filename,
            size_bytes: file.size_bytes,
            mime_type: file.mime_type,
            uploaded_at: file.uploaded_at,
            deduplicated: file.deduplicated,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[schema(example = "Files uploaded successfully")]
    pub message: String,
    #[schema(example = 2)]
    pub uploaded_count: usize,
    pub files: Vec<UploadedFileResponse>,
}

/// Optional search filters; absent or empty fields do not filter.
#[derive(Serialize, Deserialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilters {
    /// Case-insensitive filename substring.
    #[schema(example = "report")]
    pub filename: Option<String>,
    /// Case-insensitive substring of the owner's display name.
    pub owner_name: Option<String>,
    /// Exact MIME type.
    #[schema(example = "application/pdf")]
    pub mime_type: Option<String>,
    pub min_size: Option<i64>,
    pub max_size: Option<i64>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
#[serde(default)]
pub struct SearchRequest {
    pub filters: SearchFilters,
}

pub fn validate_search_filters(filters: &SearchFilters) -> Result<(), AppError> {
    if let (Some(min), Some(max)) = (filters.min_size, filters.max_size)
        && min > max
    {
        return Err(AppError::Validation(
            "minSize must not be greater than maxSize".into(),
        ));
    }
    if filters.min_size.is_some_and(|s| s < 0) || filters.max_size.is_some_and(|s| s < 0) {
        return Err(AppError::Validation("Sizes must be >= 0".into()));
    }
    if let (Some(start), Some(end)) = (filters.start_date, filters.end_date)
        && start > end
    {
        return Err(AppError::Validation(
            "startDate must not be after endDate".into(),
        ));
    }
    Ok(())
}

/// File descriptor returned by search and listing endpoints.
#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileListItem {
    #[schema(example = 17)]
    pub id: i32,
    #[schema(example = "report.pdf")]
    pub filename: String,
    /// Size of the content in bytes.
    #[schema(example = 48213)]
    pub size: i64,
    #[schema(example = "application/pdf")]
    pub mime_type: String,
    pub is_public: bool,
    pub download_count: i64,
    pub uploaded_at: DateTime<Utc>,
    pub url: String,
    #[schema(example = "Alice Liddell")]
    pub owner_name: String,
    /// Number of user files sharing this content.
    #[schema(example = 2)]
    pub ref_count: i32,
    /// Owner's display name when the file was shared with the requester.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_by: Option<String>,
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct SharedRecipient {
    pub id: i32,
    pub username: String,
    pub name: String,
}

/// A file the requester made public or shared with others.
#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SharedByMeItem {
    pub id: i32,
    pub filename: String,
    pub size: i64,
    pub mime_type: String,
    pub is_public: bool,
    pub download_count: i64,
    pub uploaded_at: DateTime<Utc>,
    pub url: String,
    pub owner_name: String,
    #[schema(value_type = Vec<SharedRecipient>)]
    pub shared_with: serde_json::Value,
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareWithUserRequest {
    #[schema(example = "bob")]
    pub share_with_username: String,
}

pub fn validate_share_request(payload: &ShareWithUserRequest) -> Result<(), AppError> {
    if payload.share_with_username.trim().is_empty() {
        return Err(AppError::Validation(
            "shareWithUsername must not be empty".into(),
        ));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicLinkResponse {
    #[schema(example = "File is now public")]
    pub message: String,
    #[schema(example = "http://127.0.0.1:8080/api/v1/files/public/17")]
    pub public_link: String,
}
