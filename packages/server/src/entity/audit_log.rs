use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only record of mutating actions.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// NULL for anonymous actions such as public downloads.
    pub user_id: Option<i32>,

    /// The user file the action applied to.
    pub target_id: Option<i32>,

    #[sea_orm(indexed)]
    pub action: String,

    #[sea_orm(column_type = "JsonBinary")]
    pub details: Json,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
