// Remote client for the logbook server.
//
// The server exposes two calls, `login` and `send_message`. Both transports
// implement the same `RemoteClient` capability so the command handlers
// never branch on the wire format:
// - `HttpClient`: JSON bodies POSTed to `/login` and `/log`
// - `RpcClient`: typed requests as newline-delimited JSON over TCP

pub mod error;
pub mod http;
pub mod rpc;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{Config, Transport};

pub use error::ApiError;
pub use http::HttpClient;
pub use rpc::RpcClient;

/// Username and password for a single login attempt.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login: a greeting for the user and the session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginReply {
    pub message: String,
    pub token: String,
}

impl LoginReply {
    /// Reject replies that carry no usable token.
    ///
    /// The token file holds one line, so a token must be non-empty, free of
    /// line breaks and without surrounding whitespace to survive a save/load.
    pub fn validated(self) -> Result<Self, ApiError> {
        if self.token.trim().is_empty() {
            return Err(ApiError::InvalidResponse(
                "login reply did not include a token".into(),
            ));
        }
        if self.token.contains(['\n', '\r']) || self.token.trim() != self.token {
            return Err(ApiError::InvalidResponse(
                "login reply token contains line breaks or surrounding whitespace".into(),
            ));
        }
        Ok(self)
    }
}

pub trait RemoteClient {
    fn login(&self, credentials: &Credentials) -> Result<LoginReply, ApiError>;

    /// Send `message` on behalf of the session identified by `token` and
    /// return the server's acknowledgement.
    fn send_message(&self, token: &str, message: &str) -> Result<String, ApiError>;
}

/// Build the client for the configured transport.
pub fn connect(config: &Config) -> Result<Box<dyn RemoteClient>, ApiError> {
    let client: Box<dyn RemoteClient> = match config.transport {
        Transport::Http => Box::new(HttpClient::new(&config.server, config.timeout)?),
        Transport::Rpc => Box::new(RpcClient::new(&config.server, config.timeout)),
    };
    Ok(client)
}
