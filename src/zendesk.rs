use crate::config::ZendeskConfig;
use crate::error::{transport_error, upstream_error, ApiError};
use crate::session::Session;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use tokio::time::sleep;

/// Only this namespace may be relayed; anything else is rejected before any
/// network call.
pub const API_PREFIX: &str = "/api/v2";

const MAX_RATE_LIMIT_WAIT_SECONDS: u64 = 10;

// Mirrors encodeURIComponent: unreserved marks stay literal.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'!')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: Value,
}

pub fn base_url(cfg: &ZendeskConfig, subdomain: &str) -> String {
    cfg.base_url_template.replace("{subdomain}", subdomain)
}

/// Basic-Auth value in Zendesk's token convention: base64("{email}/token:{api_token}").
pub fn basic_auth(email: &str, api_token: &str) -> String {
    let raw = format!("{}/token:{}", email, api_token);
    format!("Basic {}", STANDARD.encode(raw))
}

pub fn ensure_api_path(path: &str) -> Result<(), ApiError> {
    if path.starts_with(API_PREFIX) {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "Invalid path: must start with {}",
            API_PREFIX
        )))
    }
}

pub fn encode_query_value(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

fn parse_body(text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| json!({"raw": text}))
}

fn retry_after_seconds(resp: &reqwest::Response) -> Option<u64> {
    resp.headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Single-shot relay of one request to the upstream API. Forwards the JSON
/// body on writes, decodes JSON with a raw-text fallback, and retries once on
/// a rate-limit response when configured, honoring the upstream wait hint.
pub async fn dispatch(
    client: &Client,
    cfg: &ZendeskConfig,
    session: &Session,
    method: Method,
    path: &str,
    body: Option<&Value>,
) -> Result<UpstreamReply, ApiError> {
    ensure_api_path(path)?;
    let url = format!("{}{}", base_url(cfg, &session.subdomain), path);
    let auth = basic_auth(&session.email, &session.api_token);

    let mut retried = false;
    loop {
        let mut req = client
            .request(method.clone(), &url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, auth.clone());
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(transport_error)?;
        let status = resp.status();

        if status == StatusCode::TOO_MANY_REQUESTS && cfg.retry_on_rate_limit && !retried {
            let wait = retry_after_seconds(&resp)
                .unwrap_or(1)
                .min(MAX_RATE_LIMIT_WAIT_SECONDS);
            tracing::warn!(wait, "rate limited, retrying once");
            sleep(std::time::Duration::from_secs(wait)).await;
            retried = true;
            continue;
        }

        let text = resp.text().await.map_err(transport_error)?;
        let value = parse_body(&text);
        if !status.is_success() {
            return Err(upstream_error(status, value));
        }
        return Ok(UpstreamReply {
            status,
            body: value,
        });
    }
}

/// Stage one file with the uploads endpoint and return its upload token.
/// The body is the raw file bytes, not JSON; the filename travels as a query
/// parameter.
pub async fn upload_attachment(
    client: &Client,
    cfg: &ZendeskConfig,
    session: &Session,
    filename: &str,
    content_type: Option<&str>,
    data: Bytes,
) -> Result<String, ApiError> {
    let url = format!(
        "{}{}/uploads.json?filename={}",
        base_url(cfg, &session.subdomain),
        API_PREFIX,
        encode_query_value(filename),
    );

    let resp = client
        .post(&url)
        .header(ACCEPT, "application/json")
        .header(AUTHORIZATION, basic_auth(&session.email, &session.api_token))
        .header(
            CONTENT_TYPE,
            content_type.unwrap_or("application/octet-stream"),
        )
        .body(data)
        .send()
        .await
        .map_err(transport_error)?;

    let status = resp.status();
    let text = resp.text().await.map_err(transport_error)?;
    let value = parse_body(&text);
    if !status.is_success() {
        return Err(upstream_error(status, value));
    }

    value
        .get("upload")
        .and_then(|u| u.get("token"))
        .and_then(|t| t.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| ApiError::Internal(format!("upload response missing token: {}", value)))
}

pub async fn update_ticket(
    client: &Client,
    cfg: &ZendeskConfig,
    session: &Session,
    ticket_id: u64,
    payload: &Value,
) -> Result<UpstreamReply, ApiError> {
    let path = format!("{}/tickets/{}.json", API_PREFIX, ticket_id);
    dispatch(client, cfg, session, Method::PUT, &path, Some(payload)).await
}
