mod common;

use std::time::Duration;

use logbook_cli::api::{ApiError, Credentials, HttpClient, LoginReply, RemoteClient};
use serde_json::json;

const TIMEOUT: Duration = Duration::from_secs(2);

#[test]
fn login_posts_credentials_and_returns_reply() {
    let (url, server) = common::http_server("200 OK", r#"{"message":"welcome","token":"abc123"}"#);
    let client = HttpClient::new(&url, TIMEOUT).unwrap();

    let reply = client.login(&Credentials::new("alice", "secret")).unwrap();
    assert_eq!(
        reply,
        LoginReply {
            message: "welcome".into(),
            token: "abc123".into()
        }
    );

    let request = server.join().unwrap();
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/login");
    assert_eq!(request.body, json!({"username": "alice", "password": "secret"}));
}

#[test]
fn login_rejection_carries_status() {
    let (url, server) = common::http_server("401 Unauthorized", r#"{"error":"bad credentials"}"#);
    let client = HttpClient::new(&url, TIMEOUT).unwrap();

    let err = client.login(&Credentials::new("alice", "wrong")).unwrap_err();
    server.join().unwrap();

    match &err {
        ApiError::Authentication { status, body } => {
            assert_eq!(status, "401 Unauthorized");
            assert!(body.contains("bad credentials"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.to_string().starts_with("login failed with status: 401 Unauthorized"));
}

#[test]
fn login_reply_without_token_is_invalid() {
    let (url, server) = common::http_server("200 OK", r#"{"message":"welcome"}"#);
    let client = HttpClient::new(&url, TIMEOUT).unwrap();

    let err = client.login(&Credentials::new("alice", "secret")).unwrap_err();
    server.join().unwrap();
    assert!(matches!(err, ApiError::InvalidResponse(_)));
}

#[test]
fn login_reply_with_line_break_in_token_is_invalid() {
    let (url, server) = common::http_server("200 OK", r#"{"message":"welcome","token":"abc\ndef"}"#);
    let client = HttpClient::new(&url, TIMEOUT).unwrap();

    let err = client.login(&Credentials::new("alice", "secret")).unwrap_err();
    server.join().unwrap();
    assert!(matches!(err, ApiError::InvalidResponse(_)), "got {:?}", err);
}

#[test]
fn send_message_posts_token_and_message() {
    let (url, server) = common::http_server("200 OK", r#""logged""#);
    let client = HttpClient::new(&url, TIMEOUT).unwrap();

    let response = client.send_message("abc123", "hello").unwrap();
    assert_eq!(response, "logged");

    let request = server.join().unwrap();
    assert_eq!(request.path, "/log");
    assert_eq!(request.body, json!({"token": "abc123", "message": "hello"}));
}

#[test]
fn send_message_with_bad_token_is_rejected() {
    let (url, server) = common::http_server("401 Unauthorized", "invalid token");
    let client = HttpClient::new(&url, TIMEOUT).unwrap();

    let err = client.send_message("stale", "hello").unwrap_err();
    server.join().unwrap();

    assert!(err.is_rejection());
    assert_eq!(
        err.to_string(),
        "failed to send message: 401 Unauthorized - invalid token"
    );
}

#[test]
fn unreachable_server_is_a_connect_error() {
    let client = HttpClient::new(&common::closed_addr(), TIMEOUT).unwrap();

    let err = client.send_message("abc123", "hello").unwrap_err();
    assert!(matches!(err, ApiError::Connect { .. }), "got {:?}", err);
}

#[test]
fn silent_server_times_out() {
    let (addr, server) = common::silent_server(Duration::from_millis(800));
    let client = HttpClient::new(&addr, Duration::from_millis(200)).unwrap();

    let err = client.send_message("abc123", "hello").unwrap_err();
    server.join().unwrap();
    assert!(matches!(err, ApiError::Timeout(_)), "got {:?}", err);
}
