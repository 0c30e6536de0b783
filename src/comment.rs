use crate::error::ApiError;
use crate::types::CommentFields;
use serde_json::{json, Map, Value};

/// Substituted when only attachments were supplied; Zendesk rejects a comment
/// with no body at all.
pub const FALLBACK_BODY: &str = "Attachment(s) uploaded.";

#[derive(Debug, Clone, PartialEq)]
pub struct CommentPayload {
    pub body: Option<String>,
    pub html_body: Option<String>,
    pub is_public: bool,
    pub upload_tokens: Vec<String>,
}

/// Lenient visibility parse: absent means public, otherwise only the literal
/// string "true" (any case) is public and everything else is an internal note.
pub fn parse_is_public(raw: Option<&str>) -> bool {
    match raw {
        None => true,
        Some(value) => value.trim().eq_ignore_ascii_case("true"),
    }
}

pub fn compose(fields: &CommentFields, upload_tokens: Vec<String>) -> Result<CommentPayload, ApiError> {
    let is_public = parse_is_public(fields.is_public.as_deref());

    let html_present = fields
        .html_body
        .as_deref()
        .map_or(false, |s| !s.trim().is_empty());
    if html_present {
        return Ok(CommentPayload {
            body: None,
            html_body: fields.html_body.clone(),
            is_public,
            upload_tokens,
        });
    }

    let body_present = fields.body.as_deref().map_or(false, |s| !s.trim().is_empty());
    if body_present {
        return Ok(CommentPayload {
            body: fields.body.clone(),
            html_body: None,
            is_public,
            upload_tokens,
        });
    }

    if upload_tokens.is_empty() {
        return Err(ApiError::Validation(
            "Empty message. Provide body, html_body, or at least one file.".to_string(),
        ));
    }

    Ok(CommentPayload {
        body: Some(FALLBACK_BODY.to_string()),
        html_body: None,
        is_public,
        upload_tokens,
    })
}

/// Wire shape for the ticket update carrying the comment.
pub fn ticket_payload(comment: &CommentPayload) -> Value {
    let mut inner = Map::new();
    if let Some(html) = &comment.html_body {
        inner.insert("html_body".to_string(), json!(html));
    } else if let Some(body) = &comment.body {
        inner.insert("body".to_string(), json!(body));
    }
    inner.insert("public".to_string(), json!(comment.is_public));
    if !comment.upload_tokens.is_empty() {
        inner.insert("uploads".to_string(), json!(comment.upload_tokens));
    }
    json!({"ticket": {"comment": Value::Object(inner)}})
}
