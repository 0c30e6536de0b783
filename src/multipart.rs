use crate::error::ApiError;
use crate::types::{CommentForm, UploadedFile};
use axum::extract::Multipart;

/// Decode a multipart body into the comment's named text fields plus its file
/// parts. One shared decoder: every caller gets the same field names and the
/// same per-file size cap.
pub async fn read_comment_form(
    mut multipart: Multipart,
    max_file_bytes: usize,
) -> Result<CommentForm, ApiError> {
    let mut form = CommentForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::Validation(format!("Malformed multipart body: {err}")))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(filename) = field.file_name().map(|s| s.to_string()) {
            let content_type = field.content_type().map(|s| s.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|err| ApiError::Validation(format!("Malformed multipart body: {err}")))?;
            if data.len() > max_file_bytes {
                return Err(ApiError::Validation(format!(
                    "File {} exceeds the {} byte limit",
                    filename, max_file_bytes
                )));
            }
            form.files.push(UploadedFile {
                filename,
                content_type,
                data,
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|err| ApiError::Validation(format!("Malformed multipart body: {err}")))?;
        match name.as_str() {
            "body" => form.fields.body = Some(value),
            "html_body" => form.fields.html_body = Some(value),
            "isPublic" => form.fields.is_public = Some(value),
            _ => {}
        }
    }

    Ok(form)
}
