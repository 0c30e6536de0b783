use ticket_relay::config::ZendeskConfig;
use ticket_relay::zendesk::{base_url, basic_auth, encode_query_value, ensure_api_path, API_PREFIX};

#[test]
fn test_api_prefix_value() {
    assert_eq!(API_PREFIX, "/api/v2");
}

#[test]
fn test_basic_auth_convention() {
    // The upstream expects base64("{email}/token:{api_token}").
    let header = basic_auth("jdoe@example.com", "abc123");
    assert!(header.starts_with("Basic "));
    assert_eq!(header, "Basic amRvZUBleGFtcGxlLmNvbS90b2tlbjphYmMxMjM=");
}

#[test]
fn test_base_url_from_subdomain() {
    let cfg = ZendeskConfig::default();
    assert_eq!(base_url(&cfg, "acme"), "https://acme.zendesk.com");
    assert_eq!(base_url(&cfg, "support-eu"), "https://support-eu.zendesk.com");
}

#[test]
fn test_namespace_gate_accepts() {
    assert!(ensure_api_path("/api/v2/tickets.json").is_ok());
    assert!(ensure_api_path("/api/v2/tickets/42.json?include=users").is_ok());
    assert!(ensure_api_path("/api/v2/uploads.json?filename=a.txt").is_ok());
}

#[test]
fn test_namespace_gate_rejects() {
    assert!(ensure_api_path("/v1/widgets.json").is_err());
    assert!(ensure_api_path("/api/v1/tickets.json").is_err());
    assert!(ensure_api_path("https://acme.zendesk.com/api/v2/tickets.json").is_err());
    assert!(ensure_api_path("//evil.example/api/v2").is_err());
}

#[test]
fn test_filename_encoding() {
    assert_eq!(encode_query_value("notes.pdf"), "notes.pdf");
    assert_eq!(encode_query_value("quarterly report.xlsx"), "quarterly%20report.xlsx");
    assert_eq!(encode_query_value("a+b&c.txt"), "a%2Bb%26c.txt");
}
