//! Read models over the file tables: search, shared-by-me and the admin list.

use sea_orm::{ConnectionTrait, DbBackend, DbErr, FromQueryResult, Statement, Value};

use crate::models::file::{FileListItem, SearchFilters, SharedByMeItem};
use crate::models::shared::escape_like;
use crate::utils::url::normalize_download_url;

const FILE_COLUMNS: &str = "uf.id, uf.filename, pf.size_bytes AS size, pf.mime_type, \
     uf.is_public, uf.download_count, uf.uploaded_at, pf.remote_url AS url, \
     owner.name AS owner_name";

const FILE_JOINS: &str = "FROM user_file uf \
     JOIN physical_file pf ON pf.id = uf.physical_file_id \
     JOIN app_user owner ON owner.id = uf.owner_id";

/// Positional-parameter WHERE builder.
#[derive(Debug, Default)]
struct Conditions {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl Conditions {
    /// Bind `value` and add `template` with every `?` replaced by its placeholder.
    fn push(&mut self, template: &str, value: impl Into<Value>) {
        self.values.push(value.into());
        let placeholder = format!("${}", self.values.len());
        self.clauses.push(template.replace('?', &placeholder));
    }

    fn apply_filters(&mut self, filters: &SearchFilters) {
        if let Some(filename) = non_empty(&filters.filename) {
            self.push(
                "uf.filename ILIKE ? ESCAPE '\\'",
                format!("%{}%", escape_like(filename)),
            );
        }
        if let Some(owner_name) = non_empty(&filters.owner_name) {
            self.push(
                "owner.name ILIKE ? ESCAPE '\\'",
                format!("%{}%", escape_like(owner_name)),
            );
        }
        if let Some(mime_type) = non_empty(&filters.mime_type) {
            self.push("pf.mime_type = ?", mime_type.to_string());
        }
        if let Some(min) = filters.min_size {
            self.push("pf.size_bytes >= ?", min);
        }
        if let Some(max) = filters.max_size {
            self.push("pf.size_bytes <= ?", max);
        }
        if let Some(start) = filters.start_date {
            self.push("uf.uploaded_at >= ?", start);
        }
        if let Some(end) = filters.end_date {
            self.push("uf.uploaded_at <= ?", end);
        }
    }

    fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn build_search(requester_id: i32, filters: &SearchFilters) -> Statement {
    let mut conditions = Conditions::default();
    conditions.push(
        "(uf.owner_id = ? OR EXISTS (SELECT 1 FROM file_share fs \
         WHERE fs.user_file_id = uf.id AND fs.recipient_id = $1))",
        requester_id,
    );
    conditions.apply_filters(filters);

    let sql = format!(
        "SELECT {FILE_COLUMNS}, pf.ref_count, \
         CASE WHEN uf.owner_id = $1 THEN NULL ELSE owner.name END AS shared_by \
         {FILE_JOINS}{} ORDER BY uf.uploaded_at DESC, uf.id DESC",
        conditions.where_sql()
    );
    Statement::from_sql_and_values(DbBackend::Postgres, sql, conditions.values)
}

fn normalize_urls(mut items: Vec<FileListItem>) -> Vec<FileListItem> {
    for item in &mut items {
        item.url = normalize_download_url(&item.url);
    }
    items
}

/// Files the requester owns or that were shared with them, newest first.
///
/// Each file appears at most once regardless of how many share rows exist.
pub async fn search_files<C: ConnectionTrait>(
    db: &C,
    requester_id: i32,
    filters: &SearchFilters,
) -> Result<Vec<FileListItem>, DbErr> {
    let items = FileListItem::find_by_statement(build_search(requester_id, filters))
        .all(db)
        .await?;
    Ok(normalize_urls(items))
}

/// The requester's own files that are public or shared with at least one user.
pub async fn shared_by_me<C: ConnectionTrait>(
    db: &C,
    owner_id: i32,
) -> Result<Vec<SharedByMeItem>, DbErr> {
    let sql = format!(
        "SELECT {FILE_COLUMNS}, \
         COALESCE((SELECT jsonb_agg(jsonb_build_object('id', r.id, 'username', r.username, 'name', r.name) \
                   ORDER BY fs.shared_at) \
                   FROM file_share fs JOIN app_user r ON r.id = fs.recipient_id \
                   WHERE fs.user_file_id = uf.id), '[]'::jsonb) AS shared_with \
         {FILE_JOINS} \
         WHERE uf.owner_id = $1 \
           AND (uf.is_public OR EXISTS (SELECT 1 FROM file_share s WHERE s.user_file_id = uf.id)) \
         ORDER BY uf.uploaded_at DESC, uf.id DESC"
    );
    let mut items = SharedByMeItem::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        sql,
        [owner_id.into()],
    ))
    .all(db)
    .await?;

    for item in &mut items {
        item.url = normalize_download_url(&item.url);
    }
    Ok(items)
}

/// Every user file in the system, newest first.
pub async fn list_all_files<C: ConnectionTrait>(db: &C) -> Result<Vec<FileListItem>, DbErr> {
    let sql = format!(
        "SELECT {FILE_COLUMNS}, pf.ref_count, NULL::TEXT AS shared_by \
         {FILE_JOINS} ORDER BY uf.uploaded_at DESC, uf.id DESC"
    );
    let items = FileListItem::find_by_statement(Statement::from_string(DbBackend::Postgres, sql))
        .all(db)
        .await?;
    Ok(normalize_urls(items))
}
