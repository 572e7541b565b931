// Typed RPC transport.
//
// Each call opens one TCP connection, writes a single `Request` as a line
// of JSON and reads back a single `Reply` line. Connect, write and read are
// bounded by one deadline derived from the client's timeout. Name resolution
// happens before the deadline starts and is not bounded by it.

use std::fmt;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ApiError, Credentials, LoginReply, RemoteClient};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Request {
    Login {
        #[serde(flatten)]
        credentials: Credentials,
    },
    SendMessage { token: String, message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reply<T> {
    Ok { result: T },
    Error { code: Code, message: String },
}

impl<T> Reply<T> {
    pub fn ok(result: T) -> Self {
        Self::Ok { result }
    }

    pub fn error(code: Code, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }
}

/// Failure classes a server can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
    Unauthenticated,
    InvalidArgument,
    NotFound,
    Internal,
    Unavailable,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Code::Unauthenticated => "unauthenticated",
            Code::InvalidArgument => "invalid_argument",
            Code::NotFound => "not_found",
            Code::Internal => "internal",
            Code::Unavailable => "unavailable",
            Code::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageResult {
    pub response: String,
}

#[derive(Debug, Clone)]
pub struct RpcClient {
    addr: String,
    timeout: Duration,
}

impl RpcClient {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    fn call<T: DeserializeOwned>(&self, request: &Request) -> Result<Reply<T>, ApiError> {
        let deadline = Instant::now() + self.timeout;
        let stream = self.open(deadline)?;

        let mut line = serde_json::to_string(request)
            .map_err(|e| ApiError::Transport(format!("encoding request: {}", e)))?;
        line.push('\n');

        stream
            .set_write_timeout(Some(self.remaining(deadline)?))
            .map_err(|e| self.io_error(e))?;
        let mut reader = BufReader::new(stream);
        reader
            .get_mut()
            .write_all(line.as_bytes())
            .map_err(|e| self.io_error(e))?;

        reader
            .get_ref()
            .set_read_timeout(Some(self.remaining(deadline)?))
            .map_err(|e| self.io_error(e))?;
        let mut response_line = String::new();
        let read = reader
            .read_line(&mut response_line)
            .map_err(|e| self.io_error(e))?;
        if read == 0 {
            return Err(ApiError::InvalidResponse(
                "connection closed before a reply was received".into(),
            ));
        }

        serde_json::from_str(response_line.trim())
            .map_err(|e| ApiError::InvalidResponse(format!("parsing reply: {}", e)))
    }

    /// Resolve and connect. `to_socket_addrs` blocks on the system resolver
    /// and cannot be cancelled, so resolution time is not charged against
    /// `deadline`; only the connect attempts are.
    fn open(&self, deadline: Instant) -> Result<TcpStream, ApiError> {
        let addrs: Vec<SocketAddr> = self
            .addr
            .to_socket_addrs()
            .map_err(|e| ApiError::Connect {
                addr: self.addr.clone(),
                reason: e.to_string(),
            })?
            .collect();

        let mut last_err = None;
        for addr in addrs {
            let remaining = self.remaining(deadline)?;
            debug!(%addr, "connecting");
            match TcpStream::connect_timeout(&addr, remaining) {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    warn!(%addr, error = %e, "connect failed");
                    last_err = Some(e);
                }
            }
        }

        Err(match last_err {
            Some(e) if is_timeout(&e) => ApiError::Timeout(self.timeout),
            Some(e) => ApiError::Connect {
                addr: self.addr.clone(),
                reason: e.to_string(),
            },
            None => ApiError::Connect {
                addr: self.addr.clone(),
                reason: "address did not resolve".into(),
            },
        })
    }

    fn remaining(&self, deadline: Instant) -> Result<Duration, ApiError> {
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            Err(ApiError::Timeout(self.timeout))
        } else {
            Ok(left)
        }
    }

    fn io_error(&self, err: io::Error) -> ApiError {
        if is_timeout(&err) {
            ApiError::Timeout(self.timeout)
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}

impl RemoteClient for RpcClient {
    fn login(&self, credentials: &Credentials) -> Result<LoginReply, ApiError> {
        let request = Request::Login {
            credentials: credentials.clone(),
        };
        match self.call::<LoginReply>(&request)? {
            Reply::Ok { result } => result.validated(),
            Reply::Error { code, message } => Err(ApiError::Authentication {
                status: code.to_string(),
                body: ApiError::truncate_body(&message),
            }),
        }
    }

    fn send_message(&self, token: &str, message: &str) -> Result<String, ApiError> {
        let request = Request::SendMessage {
            token: token.to_string(),
            message: message.to_string(),
        };
        match self.call::<SendMessageResult>(&request)? {
            Reply::Ok { result } => Ok(result.response),
            Reply::Error { code, message } => Err(ApiError::Rejected {
                status: code.to_string(),
                body: ApiError::truncate_body(&message),
            }),
        }
    }
}
