//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use recaptcha_gate::verify::Endpoint;
use recaptcha_gate::Settings;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A local stand-in for the verification API.
#[allow(dead_code)]
pub struct MockBackend {
    pub addr: SocketAddr,
    /// TCP connections accepted so far.
    pub connections: Arc<AtomicUsize>,
    /// Raw requests received, in arrival order.
    pub requests: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl MockBackend {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::parse(&format!("http://{}/recaptcha/api/siteverify", self.addr)).unwrap()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a keep-alive backend answering every request with `body`.
#[allow(dead_code)]
pub async fn start_json_backend(body: &'static str) -> MockBackend {
    start_backend("200 OK", body, true).await
}

/// Start a backend answering with a fixed status and body.
///
/// With `keep_alive` false every response carries `Connection: close`.
pub async fn start_backend(status: &'static str, body: &'static str, keep_alive: bool) -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));

    let accepted = connections.clone();
    let received = requests.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            accepted.fetch_add(1, Ordering::SeqCst);
            let received = received.clone();
            tokio::spawn(async move {
                while let Some(request) = read_request(&mut socket).await {
                    received.lock().unwrap().push(request);

                    let connection = if keep_alive { "keep-alive" } else { "close" };
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: {}\r\n\r\n{}",
                        status,
                        body.len(),
                        connection,
                        body
                    );
                    if socket.write_all(response.as_bytes()).await.is_err() || !keep_alive {
                        let _ = socket.shutdown().await;
                        break;
                    }
                }
            });
        }
    });

    MockBackend {
        addr,
        connections,
        requests,
    }
}

/// Start a backend that reads requests and never answers.
#[allow(dead_code)]
pub async fn start_silent_backend() -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));

    let accepted = connections.clone();
    let received = requests.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            accepted.fetch_add(1, Ordering::SeqCst);
            let received = received.clone();
            tokio::spawn(async move {
                if let Some(request) = read_request(&mut socket).await {
                    received.lock().unwrap().push(request);
                }
                // Hold the socket open until the client gives up.
                let mut sink = [0u8; 64];
                while matches!(socket.read(&mut sink).await, Ok(n) if n > 0) {}
            });
        }
    });

    MockBackend {
        addr,
        connections,
        requests,
    }
}

/// Start a backend that sends a response head announcing `Content-Length: 100`,
/// a few body bytes, and then nothing more.
#[allow(dead_code)]
pub async fn start_stalled_body_backend() -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));

    let accepted = connections.clone();
    let received = requests.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            accepted.fetch_add(1, Ordering::SeqCst);
            let received = received.clone();
            tokio::spawn(async move {
                let Some(request) = read_request(&mut socket).await else {
                    return;
                };
                received.lock().unwrap().push(request);

                let head = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"success\":";
                if socket.write_all(head.as_bytes()).await.is_err() {
                    return;
                }
                let mut sink = [0u8; 64];
                while matches!(socket.read(&mut sink).await, Ok(n) if n > 0) {}
            });
        }
    });

    MockBackend {
        addr,
        connections,
        requests,
    }
}

/// An address nothing listens on.
#[allow(dead_code)]
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Build a settings map from key/value pairs.
#[allow(dead_code)]
pub fn settings(pairs: &[(&str, &str)]) -> Settings {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect::<HashMap<_, _>>()
}

/// Read one HTTP/1.1 request (head plus `Content-Length` body).
async fn read_request(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let head_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())?
        })
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some(String::from_utf8_lossy(&buf[..head_end + content_length]).to_string())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
