use bytes::Bytes;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub token: Option<String>,
    pub subdomain: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub ok: bool,
    pub email: String,
    pub subdomain: String,
}

/// Text fields accepted by the comment endpoint, multipart or JSON alike.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentFields {
    pub body: Option<String>,
    pub html_body: Option<String>,
    #[serde(rename = "isPublic")]
    pub is_public: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct CommentForm {
    pub fields: CommentFields,
    pub files: Vec<UploadedFile>,
}
