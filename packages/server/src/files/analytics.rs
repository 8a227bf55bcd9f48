//! Per-owner storage and activity analytics.

use sea_orm::{ConnectionTrait, DbBackend, DbErr, FromQueryResult, Statement};

use crate::models::analytics::{
    AnalyticsResponse, FileSizeAnalytics, LargestFile, MimeTypeCount, MostSharedFile,
    SharingAnalytics, StorageStatistics, TopCollaborator, TopDownloadedFile, UploadsByDay,
};

const TOP_N: i64 = 5;

#[derive(Debug, FromQueryResult)]
struct StorageRow {
    original_bytes: i64,
    deduplicated_bytes: i64,
}

fn owner_statement(sql: &str, owner_id: i32) -> Statement {
    Statement::from_sql_and_values(
        DbBackend::Postgres,
        sql,
        [owner_id.into(), TOP_N.into()],
    )
}

async fn storage_statistics<C: ConnectionTrait>(
    db: &C,
    owner_id: i32,
) -> Result<StorageStatistics, DbErr> {
    let row = StorageRow::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        r#"SELECT
             COALESCE((SELECT SUM(pf.size_bytes) FROM user_file uf
                       JOIN physical_file pf ON pf.id = uf.physical_file_id
                       WHERE uf.owner_id = $1), 0)::BIGINT AS original_bytes,
             COALESCE((SELECT SUM(pf.size_bytes) FROM physical_file pf
                       WHERE pf.id IN (SELECT physical_file_id FROM user_file WHERE owner_id = $1)),
                      0)::BIGINT AS deduplicated_bytes"#,
        [owner_id.into()],
    ))
    .one(db)
    .await?;

    Ok(row
        .map(|r| StorageStatistics::new(r.original_bytes, r.deduplicated_bytes))
        .unwrap_or_else(|| StorageStatistics::new(0, 0)))
}

async fn uploads_by_day<C: ConnectionTrait>(
    db: &C,
    owner_id: i32,
) -> Result<Vec<UploadsByDay>, DbErr> {
    UploadsByDay::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        r#"SELECT (uploaded_at AT TIME ZONE 'UTC')::DATE AS day, COUNT(*)::BIGINT AS count
           FROM user_file WHERE owner_id = $1
           GROUP BY day ORDER BY day"#,
        [owner_id.into()],
    ))
    .all(db)
    .await
}

async fn file_type_breakdown<C: ConnectionTrait>(
    db: &C,
    owner_id: i32,
) -> Result<Vec<MimeTypeCount>, DbErr> {
    MimeTypeCount::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        r#"SELECT pf.mime_type, COUNT(*)::BIGINT AS count
           FROM user_file uf JOIN physical_file pf ON pf.id = uf.physical_file_id
           WHERE uf.owner_id = $1
           GROUP BY pf.mime_type ORDER BY count DESC, pf.mime_type"#,
        [owner_id.into()],
    ))
    .all(db)
    .await
}

async fn top_downloaded<C: ConnectionTrait>(
    db: &C,
    owner_id: i32,
) -> Result<Vec<TopDownloadedFile>, DbErr> {
    TopDownloadedFile::find_by_statement(owner_statement(
        r#"SELECT filename, download_count FROM user_file
           WHERE owner_id = $1 AND download_count > 0
           ORDER BY download_count DESC, id LIMIT $2"#,
        owner_id,
    ))
    .all(db)
    .await
}

async fn most_shared<C: ConnectionTrait>(
    db: &C,
    owner_id: i32,
) -> Result<Vec<MostSharedFile>, DbErr> {
    MostSharedFile::find_by_statement(owner_statement(
        r#"SELECT uf.filename, COUNT(fs.id)::BIGINT AS share_count
           FROM user_file uf JOIN file_share fs ON fs.user_file_id = uf.id
           WHERE uf.owner_id = $1
           GROUP BY uf.id, uf.filename
           ORDER BY share_count DESC, uf.id LIMIT $2"#,
        owner_id,
    ))
    .all(db)
    .await
}

async fn top_collaborators<C: ConnectionTrait>(
    db: &C,
    owner_id: i32,
) -> Result<Vec<TopCollaborator>, DbErr> {
    TopCollaborator::find_by_statement(owner_statement(
        r#"SELECT r.name AS recipient_name, COUNT(DISTINCT fs.user_file_id)::BIGINT AS files_shared_with_count
           FROM file_share fs
           JOIN user_file uf ON uf.id = fs.user_file_id
           JOIN app_user r ON r.id = fs.recipient_id
           WHERE uf.owner_id = $1
           GROUP BY r.id, r.name
           ORDER BY files_shared_with_count DESC, r.id LIMIT $2"#,
        owner_id,
    ))
    .all(db)
    .await
}

async fn largest_files<C: ConnectionTrait>(
    db: &C,
    owner_id: i32,
) -> Result<Vec<LargestFile>, DbErr> {
    LargestFile::find_by_statement(owner_statement(
        r#"SELECT uf.filename, pf.size_bytes AS size
           FROM user_file uf JOIN physical_file pf ON pf.id = uf.physical_file_id
           WHERE uf.owner_id = $1
           ORDER BY pf.size_bytes DESC, uf.id LIMIT $2"#,
        owner_id,
    ))
    .all(db)
    .await
}

/// Run every analytics query for `owner_id` concurrently.
pub async fn owner_analytics<C: ConnectionTrait>(
    db: &C,
    owner_id: i32,
) -> Result<AnalyticsResponse, DbErr> {
    let (storage, uploads, types, downloads, shared, collaborators, largest) = tokio::try_join!(
        storage_statistics(db, owner_id),
        uploads_by_day(db, owner_id),
        file_type_breakdown(db, owner_id),
        top_downloaded(db, owner_id),
        most_shared(db, owner_id),
        top_collaborators(db, owner_id),
        largest_files(db, owner_id),
    )?;

    Ok(AnalyticsResponse {
        storage_statistics: storage,
        uploads_by_day: uploads,
        file_type_breakdown: types,
        top_downloaded_files: downloads,
        sharing_analytics: SharingAnalytics {
            most_shared_files: shared,
            top_collaborators: collaborators,
        },
        file_size_analytics: FileSizeAnalytics {
            largest_files: largest,
        },
    })
}
