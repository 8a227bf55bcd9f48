use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per distinct content fingerprint.
///
/// `ref_count` always equals the number of `user_file` rows pointing here;
/// it is only ever changed by single-statement updates inside a transaction.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "physical_file")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Hex SHA-256 of the content.
    #[sea_orm(unique)]
    pub content_hash: String,

    pub remote_url: String,

    /// Handle used to destroy the remote object.
    pub remote_object_id: String,

    pub size_bytes: i64,
    pub mime_type: String,
    pub ref_count: i32,

    #[sea_orm(has_many)]
    pub user_files: HasMany<super::user_file::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
