use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "app_user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    /// Display name shown to other users.
    pub name: String,

    /// Argon2 PHC string.
    #[serde(skip_serializing)]
    pub password: String,

    /// `user` or `admin`.
    pub role: String,

    #[sea_orm(has_many)]
    pub files: HasMany<super::user_file::Entity>,

    #[sea_orm(has_many)]
    pub received_shares: HasMany<super::file_share::Entity>,

    pub created_at: DateTimeUtc,
    pub last_login: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}
