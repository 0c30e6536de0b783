use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub zendesk: ZendeskConfig,
    pub session: SessionConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZendeskConfig {
    pub email: Option<String>,
    pub api_token: Option<String>,
    pub subdomain: Option<String>,
    pub base_url_template: String,
    pub timeout_seconds: u64,
    pub verify_login: bool,
    pub retry_on_rate_limit: bool,
}

impl Default for ZendeskConfig {
    fn default() -> Self {
        Self {
            email: None,
            api_token: None,
            subdomain: None,
            base_url_template: "https://{subdomain}.zendesk.com".to_string(),
            timeout_seconds: 30,
            verify_login: true,
            retry_on_rate_limit: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_hours: i64,
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "zd_session".to_string(),
            ttl_hours: 8,
            secure: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub max_file_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 20 * 1024 * 1024,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            zendesk: ZendeskConfig::default(),
            session: SessionConfig::default(),
            upload: UploadConfig::default(),
        }
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn resolve_config_path() -> PathBuf {
    env::var("TICKET_RELAY_CONFIG")
        .ok()
        .map(PathBuf::from)
        .unwrap_or_else(|| expand_tilde("~/.ticket-relay/ticket-relay.json"))
}

pub fn ensure_config_dir() {
    let path = resolve_config_path();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
}

pub fn load_config() -> Config {
    let config_path = resolve_config_path();

    let mut cfg = Config::default();

    if config_path.exists() {
        if let Ok(raw) = fs::read_to_string(&config_path) {
            if let Ok(file_cfg) = serde_json::from_str::<Config>(&raw) {
                cfg = file_cfg;
            }
        }
    }

    // Override from environment
    if let Ok(email) = env::var("TICKET_RELAY_ZENDESK_EMAIL") {
        if !email.trim().is_empty() {
            cfg.zendesk.email = Some(email);
        }
    }

    if let Ok(token) = env::var("TICKET_RELAY_ZENDESK_TOKEN") {
        if !token.trim().is_empty() {
            cfg.zendesk.api_token = Some(token);
        }
    }

    if let Ok(subdomain) = env::var("TICKET_RELAY_ZENDESK_SUBDOMAIN") {
        if !subdomain.trim().is_empty() {
            cfg.zendesk.subdomain = Some(subdomain);
        }
    }

    if let Ok(secure) = env::var("TICKET_RELAY_SECURE_COOKIES") {
        if !secure.trim().is_empty() {
            cfg.session.secure = secure.trim().eq_ignore_ascii_case("true");
        }
    }

    cfg
}
