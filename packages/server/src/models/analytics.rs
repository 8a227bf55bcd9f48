use chrono::NaiveDate;
use sea_orm::FromQueryResult;
use serde::Serialize;

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageStatistics {
    /// Sum of every owned file's size, counting duplicates.
    pub original_usage_bytes: i64,
    /// Sum of distinct content sizes.
    pub deduplicated_usage_bytes: i64,
    pub savings_bytes: i64,
    pub savings_percentage: f64,
}

impl StorageStatistics {
    pub fn new(original: i64, deduplicated: i64) -> Self {
        let savings = original - deduplicated;
        let savings_percentage = if original > 0 {
            savings as f64 / original as f64 * 100.0
        } else {
            0.0
        };
        Self {
            original_usage_bytes: original,
            deduplicated_usage_bytes: deduplicated,
            savings_bytes: savings,
            savings_percentage,
        }
    }
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct UploadsByDay {
    pub day: NaiveDate,
    pub count: i64,
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MimeTypeCount {
    pub mime_type: String,
    pub count: i64,
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopDownloadedFile {
    pub filename: String,
    pub download_count: i64,
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MostSharedFile {
    pub filename: String,
    pub share_count: i64,
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopCollaborator {
    pub recipient_name: String,
    pub files_shared_with_count: i64,
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct LargestFile {
    pub filename: String,
    pub size: i64,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SharingAnalytics {
    pub most_shared_files: Vec<MostSharedFile>,
    pub top_collaborators: Vec<TopCollaborator>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileSizeAnalytics {
    pub largest_files: Vec<LargestFile>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub storage_statistics: StorageStatistics,
    pub uploads_by_day: Vec<UploadsByDay>,
    pub file_type_breakdown: Vec<MimeTypeCount>,
    pub top_downloaded_files: Vec<TopDownloadedFile>,
    pub sharing_analytics: SharingAnalytics,
    pub file_size_analytics: FileSizeAnalytics,
}
