use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::audit_log;

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: i64,
    #[schema(example = "FILE_UPLOAD")]
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<i32>,
    #[schema(value_type = Object)]
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<audit_log::Model> for AuditLogEntry {
    fn from(model: audit_log::Model) -> Self {
        Self {
            id: model.id,
            action: model.action,
            target_id: model.target_id,
            details: model.details,
            created_at: model.created_at,
        }
    }
}
