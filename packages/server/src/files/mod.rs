//! Core file workflows: deduplicated uploads, reference-counted deletion,
//! sharing, and the read models built on top of them.

pub mod analytics;
pub mod deletion;
pub mod download;
pub mod quota;
pub mod registry;
pub mod remote;
pub mod search;
pub mod sharing;
pub mod upload;

use sea_orm::*;
use sea_orm::sea_query::LockType;

use crate::entity::user_file;
use crate::error::AppError;

pub async fn find_user_file<C: ConnectionTrait>(
    db: &C,
    user_file_id: i32,
) -> Result<user_file::Model, AppError> {
    user_file::Entity::find_by_id(user_file_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))
}

/// Like [`find_user_file`], locking the row for the rest of the transaction.
pub async fn find_user_file_for_update<C: ConnectionTrait>(
    db: &C,
    user_file_id: i32,
) -> Result<user_file::Model, AppError> {
    user_file::Entity::find_by_id(user_file_id)
        .lock(LockType::Update)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))
}
