// Library root
// -----------
// This crate exposes the library surface for the `logbook` binary. The
// binary (`main.rs`) parses flags into a `Config` and hands it to the
// command handlers in `ui`.
//
// Module responsibilities:
// - `config`: Explicit runtime configuration (transport, server address,
//   timeout, token file location).
// - `session`: Persists the bearer token between invocations.
// - `api`: The `RemoteClient` capability and its HTTP and RPC adapters.
// - `ui`: Password capture and the `login` / `run` command flows.
pub mod api;
pub mod config;
pub mod session;
pub mod ui;
