pub mod comment;
pub mod config;
pub mod error;
pub mod multipart;
pub mod session;
pub mod types;
pub mod zendesk;

pub use config::Config;

use self::config::load_config;
use self::error::ApiError;
use self::session::Session;
use self::types::{CommentFields, CommentForm, LoginRequest, SessionInfo};
use self::zendesk::UpstreamReply;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Path, Query, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TicketQuery {
    pub include: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentsQuery {
    pub include: Option<String>,
    pub inline: Option<String>,
}

pub fn http_client(cfg: &config::ZendeskConfig) -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.timeout_seconds))
        .build()?)
}

pub async fn create_app() -> anyhow::Result<(AppState, Router)> {
    let config = load_config();
    let http = http_client(&config.zendesk)?;
    let state = AppState {
        config: config.clone(),
        http,
    };
    let app = router(state.clone());
    Ok((state, app))
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.upload.max_file_bytes.saturating_mul(4);
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(session_info))
        .route(
            "/zendesk-proxy",
            get(proxy_get).post(proxy_post).put(proxy_put),
        )
        .route("/tickets/:id", get(get_ticket).put(put_ticket))
        .route("/tickets/:id/comments", get(list_comments))
        .route("/tickets/:id/comment", post(post_comment))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

fn require_session(state: &AppState, jar: &CookieJar) -> Result<Session, ApiError> {
    session::resolve(jar, &state.config.session).ok_or(ApiError::Unauthenticated)
}

fn parse_ticket_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::Validation(format!("Invalid ticket id: {raw}")))
}

fn require_proxy_path(query: ProxyQuery) -> Result<String, ApiError> {
    query
        .path
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| {
            ApiError::Validation("Missing or invalid ?path=/api/v2/... query parameter".to_string())
        })
}

fn first_non_empty(primary: Option<String>, fallback: Option<String>) -> Option<String> {
    primary
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            fallback
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

fn reply_response(reply: UpstreamReply) -> Response {
    let status = StatusCode::from_u16(reply.status.as_u16()).unwrap_or(StatusCode::OK);
    (status, Json(reply.body)).into_response()
}

async fn health() -> impl IntoResponse {
    Json(json!({"ok": true}))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    let req: LoginRequest = if body.is_empty() {
        LoginRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|err| ApiError::Validation(format!("Malformed login body: {err}")))?
    };

    let cfg = &state.config.zendesk;
    let email = first_non_empty(req.email, cfg.email.clone());
    let api_token = first_non_empty(req.token, cfg.api_token.clone());
    let subdomain = first_non_empty(req.subdomain, cfg.subdomain.clone());

    let (Some(email), Some(api_token), Some(subdomain)) = (email, api_token, subdomain) else {
        return Err(ApiError::Validation(
            "Missing email, token, or subdomain.".to_string(),
        ));
    };

    let session = Session::new(email, api_token, subdomain);

    let mut user = json!({"email": session.email});
    if cfg.verify_login {
        let reply = zendesk::dispatch(
            &state.http,
            cfg,
            &session,
            Method::GET,
            "/api/v2/users/me.json",
            None,
        )
        .await?;
        if let Some(me) = reply.body.get("user") {
            user = json!({
                "id": me.get("id"),
                "name": me.get("name"),
                "email": me
                    .get("email")
                    .and_then(|v| v.as_str())
                    .unwrap_or(&session.email),
            });
        }
    }

    tracing::info!(subdomain = %session.subdomain, "login accepted");
    let jar = jar.add(session::session_cookie(&state.config.session, &session));
    Ok((
        jar,
        Json(json!({"ok": true, "user": user, "subdomain": session.subdomain})),
    ))
}

async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    let jar = jar.add(session::clear_session_cookie(&state.config.session));
    (jar, Json(json!({"ok": true})))
}

async fn session_info(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<SessionInfo>, ApiError> {
    let session = require_session(&state, &jar)?;
    Ok(Json(SessionInfo {
        ok: true,
        email: session.email,
        subdomain: session.subdomain,
    }))
}

async fn proxy_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<ProxyQuery>,
) -> Result<Response, ApiError> {
    let session = require_session(&state, &jar)?;
    let path = require_proxy_path(query)?;
    let reply = zendesk::dispatch(
        &state.http,
        &state.config.zendesk,
        &session,
        Method::GET,
        &path,
        None,
    )
    .await?;
    Ok(reply_response(reply))
}

async fn proxy_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<ProxyQuery>,
    body: Bytes,
) -> Result<Response, ApiError> {
    proxy_write(state, jar, query, Method::POST, body).await
}

async fn proxy_put(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<ProxyQuery>,
    body: Bytes,
) -> Result<Response, ApiError> {
    proxy_write(state, jar, query, Method::PUT, body).await
}

async fn proxy_write(
    state: AppState,
    jar: CookieJar,
    query: ProxyQuery,
    method: Method,
    body: Bytes,
) -> Result<Response, ApiError> {
    let session = require_session(&state, &jar)?;
    let path = require_proxy_path(query)?;
    let payload: Option<Value> = if body.is_empty() {
        None
    } else {
        Some(
            serde_json::from_slice(&body)
                .map_err(|err| ApiError::Validation(format!("Malformed JSON body: {err}")))?,
        )
    };
    let reply = zendesk::dispatch(
        &state.http,
        &state.config.zendesk,
        &session,
        method,
        &path,
        payload.as_ref(),
    )
    .await?;
    Ok(reply_response(reply))
}

async fn get_ticket(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Query(query): Query<TicketQuery>,
) -> Result<Response, ApiError> {
    let session = require_session(&state, &jar)?;
    let ticket_id = parse_ticket_id(&id)?;
    let include = query
        .include
        .unwrap_or_else(|| "users,organizations,groups".to_string());
    let path = format!(
        "{}/tickets/{}.json?include={}",
        zendesk::API_PREFIX,
        ticket_id,
        zendesk::encode_query_value(&include),
    );
    let reply = zendesk::dispatch(
        &state.http,
        &state.config.zendesk,
        &session,
        Method::GET,
        &path,
        None,
    )
    .await?;
    Ok(reply_response(reply))
}

async fn put_ticket(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let session = require_session(&state, &jar)?;
    let ticket_id = parse_ticket_id(&id)?;
    let value: Value = if body.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(&body)
            .map_err(|err| ApiError::Validation(format!("Malformed JSON body: {err}")))?
    };
    // Accept either a pre-wrapped {ticket: {...}} update or bare ticket fields.
    let payload = if value.get("ticket").is_some() {
        value
    } else {
        json!({"ticket": value})
    };
    let reply = zendesk::update_ticket(
        &state.http,
        &state.config.zendesk,
        &session,
        ticket_id,
        &payload,
    )
    .await?;
    Ok(reply_response(reply))
}

async fn list_comments(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Query(query): Query<CommentsQuery>,
) -> Result<Response, ApiError> {
    let session = require_session(&state, &jar)?;
    let ticket_id = parse_ticket_id(&id)?;
    let include = query.include.unwrap_or_else(|| "users".to_string());
    let mut path = format!(
        "{}/tickets/{}/comments.json?include={}",
        zendesk::API_PREFIX,
        ticket_id,
        zendesk::encode_query_value(&include),
    );
    if query.inline.as_deref() == Some("true") {
        path.push_str("&include_inline_images=true");
    }
    let reply = zendesk::dispatch(
        &state.http,
        &state.config.zendesk,
        &session,
        Method::GET,
        &path,
        None,
    )
    .await?;
    Ok(reply_response(reply))
}

async fn post_comment(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
    req: Request,
) -> Result<Response, ApiError> {
    let session = require_session(&state, &jar)?;
    let ticket_id = parse_ticket_id(&id)?;

    let form = if is_multipart(req.headers()) {
        let parts = Multipart::from_request(req, &())
            .await
            .map_err(|err| ApiError::Validation(format!("Malformed multipart body: {err}")))?;
        multipart::read_comment_form(parts, state.config.upload.max_file_bytes).await?
    } else {
        let bytes = axum::body::to_bytes(req.into_body(), state.config.upload.max_file_bytes)
            .await
            .map_err(|err| ApiError::Validation(format!("Unreadable request body: {err}")))?;
        let fields: CommentFields = if bytes.is_empty() {
            CommentFields::default()
        } else {
            serde_json::from_slice(&bytes)
                .map_err(|err| ApiError::Validation(format!("Malformed JSON body: {err}")))?
        };
        CommentForm {
            fields,
            files: Vec::new(),
        }
    };

    // All uploads must succeed before the comment goes out; the first failure
    // aborts and surfaces that upload's error.
    let mut tokens = Vec::with_capacity(form.files.len());
    for file in &form.files {
        let token = zendesk::upload_attachment(
            &state.http,
            &state.config.zendesk,
            &session,
            &file.filename,
            file.content_type.as_deref(),
            file.data.clone(),
        )
        .await?;
        tokens.push(token);
    }

    let composed = comment::compose(&form.fields, tokens)?;
    let payload = comment::ticket_payload(&composed);
    let reply = zendesk::update_ticket(
        &state.http,
        &state.config.zendesk,
        &session,
        ticket_id,
        &payload,
    )
    .await?;
    Ok(reply_response(reply))
}
