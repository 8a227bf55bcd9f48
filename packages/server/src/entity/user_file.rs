use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_file")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub owner_id: i32,
    #[sea_orm(belongs_to, from = "owner_id", to = "id", on_delete = "Cascade")]
    pub owner: HasOne<super::app_user::Entity>,

    #[sea_orm(indexed)]
    pub physical_file_id: i32,
    #[sea_orm(belongs_to, from = "physical_file_id", to = "id", on_delete = "Restrict")]
    pub physical_file: HasOne<super::physical_file::Entity>,

    pub filename: String,

    #[sea_orm(default_value = false)]
    pub is_public: bool,

    #[sea_orm(default_value = 0)]
    pub download_count: i64,

    #[sea_orm(has_many)]
    pub shares: HasMany<super::file_share::Entity>,

    pub uploaded_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
