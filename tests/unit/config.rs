use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::sync::Mutex;
use ticket_relay::config::{
    expand_tilde, load_config, Config, SessionConfig, UploadConfig, ZendeskConfig,
};

// Tests touching TICKET_RELAY_CONFIG must not interleave.
static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

#[test]
fn test_default_server_binding() {
    let cfg = Config::default();
    assert_eq!(cfg.server.host, "0.0.0.0");
    assert_eq!(cfg.server.port, 8090);
}

#[test]
fn test_default_zendesk_section() {
    let zd = ZendeskConfig::default();
    assert!(zd.email.is_none());
    assert!(zd.api_token.is_none());
    assert!(zd.subdomain.is_none());
    assert_eq!(zd.base_url_template, "https://{subdomain}.zendesk.com");
    assert_eq!(zd.timeout_seconds, 30);
    assert!(zd.verify_login);
    assert!(zd.retry_on_rate_limit);
}

#[test]
fn test_default_session_section() {
    let session = SessionConfig::default();
    assert_eq!(session.cookie_name, "zd_session");
    assert_eq!(session.ttl_hours, 8);
    assert!(!session.secure);
}

#[test]
fn test_default_upload_cap() {
    assert_eq!(UploadConfig::default().max_file_bytes, 20 * 1024 * 1024);
}

#[test]
fn test_expand_tilde_absolute_path_untouched() {
    assert_eq!(
        expand_tilde("/etc/ticket-relay.json"),
        PathBuf::from("/etc/ticket-relay.json")
    );
}

#[test]
fn test_expand_tilde_home_prefix() {
    let path = expand_tilde("~/.ticket-relay/ticket-relay.json");
    assert!(path
        .to_string_lossy()
        .ends_with(".ticket-relay/ticket-relay.json"));
}

#[test]
fn test_config_file_parse() {
    let raw = r#"{
        "server": {"host": "127.0.0.1", "port": 9000},
        "zendesk": {
            "email": "agent@example.com",
            "api_token": "tok",
            "subdomain": "acme",
            "base_url_template": "https://{subdomain}.zendesk.com",
            "timeout_seconds": 10,
            "verify_login": false,
            "retry_on_rate_limit": false
        },
        "session": {"cookie_name": "zd", "ttl_hours": 24, "secure": true},
        "upload": {"max_file_bytes": 1048576}
    }"#;
    let cfg: Config = serde_json::from_str(raw).unwrap();
    assert_eq!(cfg.server.port, 9000);
    assert_eq!(cfg.zendesk.email, Some("agent@example.com".to_string()));
    assert!(!cfg.zendesk.verify_login);
    assert_eq!(cfg.session.cookie_name, "zd");
    assert_eq!(cfg.session.ttl_hours, 24);
    assert!(cfg.session.secure);
    assert_eq!(cfg.upload.max_file_bytes, 1048576);
}

#[test]
fn test_load_config_from_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ticket-relay.json");
    let mut cfg = Config::default();
    cfg.server.port = 9321;
    cfg.zendesk.subdomain = Some("acme".to_string());
    cfg.session.ttl_hours = 2;
    std::fs::write(&path, serde_json::to_string_pretty(&cfg).unwrap()).unwrap();

    std::env::set_var("TICKET_RELAY_CONFIG", &path);
    let loaded = load_config();
    std::env::remove_var("TICKET_RELAY_CONFIG");

    assert_eq!(loaded.server.port, 9321);
    assert_eq!(loaded.zendesk.subdomain, Some("acme".to_string()));
    assert_eq!(loaded.session.ttl_hours, 2);
}

#[test]
fn test_load_config_ignores_malformed_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ticket-relay.json");
    std::fs::write(&path, "{not json").unwrap();

    std::env::set_var("TICKET_RELAY_CONFIG", &path);
    let loaded = load_config();
    std::env::remove_var("TICKET_RELAY_CONFIG");

    assert_eq!(loaded.server.port, 8090);
}

#[test]
fn test_config_serialize_roundtrip() {
    let cfg = Config::default();
    let raw = serde_json::to_string_pretty(&cfg).unwrap();
    let back: Config = serde_json::from_str(&raw).unwrap();
    assert_eq!(back.zendesk.timeout_seconds, cfg.zendesk.timeout_seconds);
    assert_eq!(back.upload.max_file_bytes, cfg.upload.max_file_bytes);
}
