// Runtime configuration.
//
// Built once from the parsed command line (flags or their environment
// variables) and passed by reference into the command handlers.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::session::SessionStore;

/// Default server address for the JSON-over-HTTP transport.
pub const DEFAULT_HTTP_SERVER: &str = "http://localhost:8080";

/// Default server address for the RPC transport.
pub const DEFAULT_RPC_SERVER: &str = "localhost:50051";

/// Per-call timeout applied to both transports.
pub const DEFAULT_TIMEOUT_SECS: u64 = 1;

/// Wire transport used to reach the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Transport {
    #[default]
    Http,
    Rpc,
}

impl Transport {
    pub fn default_server(self) -> &'static str {
        match self {
            Transport::Http => DEFAULT_HTTP_SERVER,
            Transport::Rpc => DEFAULT_RPC_SERVER,
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Http => f.write_str("http"),
            Transport::Rpc => f.write_str("rpc"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub transport: Transport,
    pub server: String,
    pub timeout: Duration,
    pub token_path: PathBuf,
}

impl Config {
    /// Fill in defaults for anything the caller left unset.
    pub fn from_options(
        transport: Transport,
        server: Option<String>,
        timeout_secs: Option<u64>,
        token_path: Option<PathBuf>,
    ) -> Self {
        let server = server.unwrap_or_else(|| transport.default_server().to_string());
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        let token_path = token_path.unwrap_or_else(SessionStore::default_path);
        Self {
            transport,
            server,
            timeout,
            token_path,
        }
    }

    pub fn session_store(&self) -> SessionStore {
        SessionStore::new(&self.token_path)
    }
}
