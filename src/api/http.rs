// JSON-over-HTTP transport: a small blocking reqwest client that POSTs
// JSON bodies to the server's `/login` and `/log` endpoints.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ApiError, Credentials, LoginReply, RemoteClient};

/// Acknowledgement used when the server answers a send with an empty body.
const DEFAULT_ACK: &str = "message sent";

/// Holds a reqwest blocking client, the server's base URL and the per-request
/// timeout.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

/// Payload for `/log`.
#[derive(Serialize, Debug)]
struct SendMessageRequest<'a> {
    token: &'a str,
    message: &'a str,
}

/// Body shapes accepted from `/log`: a bare JSON string or an object with a
/// `response` (or `message`) field.
#[derive(Deserialize)]
#[serde(untagged)]
enum Acknowledgement {
    Text(String),
    Object {
        response: Option<String>,
        message: Option<String>,
    },
}

impl HttpClient {
    /// Create a client for `server`. A missing scheme defaults to `http://`.
    pub fn new(server: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(HttpClient {
            client,
            base_url: normalize_base_url(server),
            timeout,
        })
    }

    fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "POST");
        self.client
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| self.map_send_error(e))
    }

    fn map_send_error(&self, err: reqwest::Error) -> ApiError {
        warn!(error = %err, "HTTP request failed");
        if err.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else if err.is_connect() {
            ApiError::Connect {
                addr: self.base_url.clone(),
                reason: err.to_string(),
            }
        } else {
            ApiError::Transport(err.to_string())
        }
    }

    fn read_body(&self, res: Response) -> Result<String, ApiError> {
        res.text().map_err(|e| self.map_send_error(e))
    }
}

impl RemoteClient for HttpClient {
    fn login(&self, credentials: &Credentials) -> Result<LoginReply, ApiError> {
        let res = self.post("/login", credentials)?;
        let status = res.status();
        if !status.is_success() {
            let txt = res.text().unwrap_or_default();
            return Err(ApiError::Authentication {
                status: status.to_string(),
                body: ApiError::truncate_body(&txt),
            });
        }
        let txt = self.read_body(res)?;
        let reply: LoginReply = serde_json::from_str(&txt)
            .map_err(|e| ApiError::InvalidResponse(format!("parsing login response: {}", e)))?;
        reply.validated()
    }

    fn send_message(&self, token: &str, message: &str) -> Result<String, ApiError> {
        let res = self.post("/log", &SendMessageRequest { token, message })?;
        let status = res.status();
        if !status.is_success() {
            let txt = res.text().unwrap_or_default();
            return Err(ApiError::Rejected {
                status: status.to_string(),
                body: ApiError::truncate_body(&txt),
            });
        }
        let txt = self.read_body(res)?;
        Ok(parse_acknowledgement(&txt))
    }
}

fn normalize_base_url(server: &str) -> String {
    let server = server.trim().trim_end_matches('/');
    if server.starts_with("http://") || server.starts_with("https://") {
        server.to_string()
    } else {
        format!("http://{}", server)
    }
}

fn parse_acknowledgement(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return DEFAULT_ACK.to_string();
    }
    match serde_json::from_str::<Acknowledgement>(body) {
        Ok(Acknowledgement::Text(text)) => text,
        Ok(Acknowledgement::Object { response, message }) => response
            .or(message)
            .unwrap_or_else(|| body.to_string()),
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_scheme_and_loses_trailing_slash() {
        assert_eq!(normalize_base_url("localhost:8080"), "http://localhost:8080");
        assert_eq!(
            normalize_base_url("https://logs.example.com/"),
            "https://logs.example.com"
        );
    }

    #[test]
    fn acknowledgement_shapes() {
        assert_eq!(parse_acknowledgement("\"logged\""), "logged");
        assert_eq!(parse_acknowledgement(r#"{"response":"logged"}"#), "logged");
        assert_eq!(parse_acknowledgement(r#"{"message":"stored"}"#), "stored");
        assert_eq!(parse_acknowledgement("logged\n"), "logged");
        assert_eq!(parse_acknowledgement(""), DEFAULT_ACK);
        assert_eq!(parse_acknowledgement(r#"{"ok":true}"#), r#"{"ok":true}"#);
    }
}
