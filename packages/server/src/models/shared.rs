use serde::Serialize;

/// Plain acknowledgement returned by mutating endpoints.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    #[schema(example = "File deleted successfully")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
