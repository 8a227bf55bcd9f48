use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "file_share")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "file_recipient")]
    pub user_file_id: i32,
    #[sea_orm(belongs_to, from = "user_file_id", to = "id", on_delete = "Cascade")]
    pub user_file: HasOne<super::user_file::Entity>,

    #[sea_orm(unique_key = "file_recipient", indexed)]
    pub recipient_id: i32,
    #[sea_orm(belongs_to, from = "recipient_id", to = "id", on_delete = "Cascade")]
    pub recipient: HasOne<super::app_user::Entity>,

    pub shared_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
