#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde_json::Value;

/// A request captured by the mock HTTP server.
#[derive(Debug)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub body: Value,
}

/// How long a mock server waits for the client before giving up.
const ACCEPT_DEADLINE: Duration = Duration::from_secs(5);

fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    (listener, addr)
}

/// Poll for a connection so a client that never connects fails the test
/// instead of hanging it.
fn accept(listener: &TcpListener) -> TcpStream {
    let deadline = Instant::now() + ACCEPT_DEADLINE;
    loop {
        match listener.accept() {
            Ok((stream, _)) => {
                stream.set_nonblocking(false).unwrap();
                return stream;
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                assert!(
                    Instant::now() < deadline,
                    "client did not connect within {:?}",
                    ACCEPT_DEADLINE
                );
                thread::sleep(Duration::from_millis(10));
            }
            Err(e) => panic!("accept failed: {}", e),
        }
    }
}

/// Serve exactly one HTTP request with the given status line and body.
/// Returns the base URL and a handle yielding the captured request.
pub fn http_server(status: &'static str, body: &'static str) -> (String, JoinHandle<HttpRequest>) {
    let (listener, addr) = bind();
    let handle = thread::spawn(move || {
        let stream = accept(&listener);
        let mut reader = BufReader::new(stream);

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default().to_string();
        let path = parts.next().unwrap_or_default().to_string();

        let mut content_length = 0;
        loop {
            let mut header = String::new();
            reader.read_line(&mut header).unwrap();
            let header = header.trim_end();
            if header.is_empty() {
                break;
            }
            if let Some((name, value)) = header.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap();
                }
            }
        }

        let mut raw = vec![0u8; content_length];
        reader.read_exact(&mut raw).unwrap();
        let body_json = serde_json::from_slice(&raw).unwrap_or(Value::Null);

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        reader.get_mut().write_all(response.as_bytes()).unwrap();
        reader.get_mut().flush().unwrap();

        HttpRequest {
            method,
            path,
            body: body_json,
        }
    });
    (format!("http://{}", addr), handle)
}

/// Serve exactly one RPC call, answering with `reply`. Returns the address
/// and a handle yielding the decoded request line.
pub fn rpc_server(reply: Value) -> (String, JoinHandle<Value>) {
    let (listener, addr) = bind();
    let handle = thread::spawn(move || {
        let stream = accept(&listener);
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();

        let mut out = serde_json::to_string(&reply).unwrap();
        out.push('\n');
        reader.get_mut().write_all(out.as_bytes()).unwrap();

        serde_json::from_str(line.trim()).unwrap()
    });
    (addr, handle)
}

/// Accept one connection and hold it open without answering.
pub fn silent_server(hold: Duration) -> (String, JoinHandle<()>) {
    let (listener, addr) = bind();
    let handle = thread::spawn(move || {
        let stream = accept(&listener);
        thread::sleep(hold);
        drop(stream);
    });
    (addr, handle)
}

/// An address nothing is listening on.
pub fn closed_addr() -> String {
    let (listener, addr) = bind();
    drop(listener);
    addr
}
