//! Physical file registry: one row per distinct content fingerprint.
//!
//! Reference counts are changed only with single `UPDATE ... RETURNING`
//! statements so the row lock taken by the update covers the read.

use std::collections::HashSet;

use chrono::Utc;
use common::storage::{ContentHash, StoredObject};
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::*;

use crate::entity::physical_file;

/// Increment the reference count of the row holding `hash`.
///
/// Returns the updated row, or `None` if the content is not registered.
pub async fn increment_ref<C: ConnectionTrait>(
    db: &C,
    hash: &ContentHash,
) -> Result<Option<physical_file::Model>, DbErr> {
    let rows = physical_file::Entity::update_many()
        .col_expr(
            physical_file::Column::RefCount,
            Expr::col(physical_file::Column::RefCount).add(1),
        )
        .filter(physical_file::Column::ContentHash.eq(hash.to_hex()))
        .exec_with_returning(db)
        .await?;
    Ok(rows.into_iter().next())
}

/// Decrement the reference count of a physical file and return the new state.
pub async fn decrement_ref<C: ConnectionTrait>(
    db: &C,
    physical_file_id: i32,
) -> Result<Option<physical_file::Model>, DbErr> {
    let rows = physical_file::Entity::update_many()
        .col_expr(
            physical_file::Column::RefCount,
            Expr::col(physical_file::Column::RefCount).sub(1),
        )
        .filter(physical_file::Column::Id.eq(physical_file_id))
        .exec_with_returning(db)
        .await?;
    Ok(rows.into_iter().next())
}

/// Register newly uploaded content with a reference count of one.
pub async fn insert_new<C: ConnectionTrait>(
    db: &C,
    hash: &ContentHash,
    stored: &StoredObject,
    size_bytes: u64,
    mime_type: &str,
) -> Result<physical_file::Model, DbErr> {
    physical_file::ActiveModel {
        content_hash: Set(hash.to_hex()),
        remote_url: Set(stored.url.clone()),
        remote_object_id: Set(stored.object_id.clone()),
        size_bytes: Set(i64::try_from(size_bytes).unwrap_or(i64::MAX)),
        mime_type: Set(mime_type.to_string()),
        ref_count: Set(1),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn delete<C: ConnectionTrait>(db: &C, physical_file_id: i32) -> Result<(), DbErr> {
    physical_file::Entity::delete_by_id(physical_file_id)
        .exec(db)
        .await?;
    Ok(())
}

/// Which of `hashes` are already registered.
pub async fn persisted_hashes<C: ConnectionTrait>(
    db: &C,
    hashes: &[ContentHash],
) -> Result<HashSet<ContentHash>, DbErr> {
    if hashes.is_empty() {
        return Ok(HashSet::new());
    }

    let hex: Vec<String> = hashes.iter().map(ContentHash::to_hex).collect();
    let rows: Vec<String> = physical_file::Entity::find()
        .select_only()
        .column(physical_file::Column::ContentHash)
        .filter(physical_file::Column::ContentHash.is_in(hex))
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows
        .iter()
        .filter_map(|h| ContentHash::from_hex(h).ok())
        .collect())
}
