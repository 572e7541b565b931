// UI layer: password capture plus the `login` and `run` command flows.
// Handlers write user-facing text to the given writer and report failures
// there; only a failure to write output itself is returned as an error.

use std::io::{self, Write};
use std::time::Duration;

use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::api::{Credentials, LoginReply, RemoteClient};
use crate::session::SessionStore;

/// Source of the user's password for a login attempt.
pub trait PasswordReader {
    fn read_password(&self, prompt: &str) -> io::Result<String>;
}

/// Reads from the terminal without echoing input.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPasswordReader;

impl PasswordReader for TerminalPasswordReader {
    fn read_password(&self, prompt: &str) -> io::Result<String> {
        Password::new().with_prompt(prompt).interact()
    }
}

/// Result of a command as seen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        self == Outcome::Succeeded
    }
}

/// Prompt for a password, authenticate `username` and persist the token.
///
/// The token file is only written after the server accepted the
/// credentials and returned a token that fits on one line.
pub fn login(
    username: &str,
    client: &dyn RemoteClient,
    store: &SessionStore,
    passwords: &dyn PasswordReader,
    out: &mut dyn Write,
) -> io::Result<Outcome> {
    let password = match passwords.read_password("Enter password") {
        Ok(p) => p,
        Err(e) => {
            writeln!(out, "Error reading password: {}", e)?;
            return Ok(Outcome::Failed);
        }
    };
    let credentials = Credentials::new(username, password.trim());

    let spinner = spinner("Logging in...");
    let result = client.login(&credentials);
    spinner.finish_and_clear();

    let reply = match result.and_then(LoginReply::validated) {
        Ok(reply) => reply,
        Err(e) => {
            warn!(username, error = %e, "login rejected");
            writeln!(out, "Login failed: {}", e)?;
            return Ok(Outcome::Failed);
        }
    };

    if let Err(e) = store.save(&reply.token) {
        writeln!(out, "Login failed: {}", e)?;
        return Ok(Outcome::Failed);
    }
    info!(username, "logged in");
    writeln!(out, "{}", reply.message)?;
    Ok(Outcome::Succeeded)
}

/// Send `message` using the stored session token.
pub fn run(
    message: &str,
    client: &dyn RemoteClient,
    store: &SessionStore,
    out: &mut dyn Write,
) -> io::Result<Outcome> {
    // No token means no request.
    let token = match store.load() {
        Ok(token) => token,
        Err(e) => {
            writeln!(out, "You must login first: {}", e)?;
            return Ok(Outcome::Failed);
        }
    };

    let spinner = spinner("Sending...");
    let result = client.send_message(&token, message);
    spinner.finish_and_clear();

    match result {
        Ok(response) => {
            writeln!(out, "{}", response)?;
            Ok(Outcome::Succeeded)
        }
        Err(e) => {
            if e.is_rejection() {
                warn!(error = %e, "server rejected message; session may be stale");
            }
            writeln!(out, "Error: {}", e)?;
            Ok(Outcome::Failed)
        }
    }
}

/// Spinner on stderr while a request is in flight. Hidden when stderr is
/// not a terminal.
fn spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
