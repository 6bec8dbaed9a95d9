//! Canned HTTP server for exercising [`rendezvous_data::HttpBackend`].

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;

/// Fixed reply for one request path.
#[derive(Debug, Clone)]
pub struct Route {
    path: String,
    status: u16,
    body: String,
    delay: Duration,
}

impl Route {
    /// Answer `path` with `status` and `body`.
    pub fn new(path: &str, status: u16, body: &str) -> Self {
        Self {
            path: path.to_owned(),
            status,
            body: body.to_owned(),
            delay: Duration::ZERO,
        }
    }

    /// Wait before answering.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A loopback server answering from a fixed route table.
///
/// Unknown paths get `404` with an empty body. Every request head is recorded
/// so tests can inspect headers.
pub struct CannedServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl CannedServer {
    /// Bind to an ephemeral port and serve `routes` on `runtime`.
    pub fn start(runtime: &Runtime, routes: Vec<Route>) -> Self {
        let listener = runtime
            .block_on(TcpListener::bind("127.0.0.1:0"))
            .unwrap_or_else(|err| panic!("bind canned server: {err}"));
        let address = listener
            .local_addr()
            .unwrap_or_else(|err| panic!("canned server address: {err}"));
        let routes = Arc::new(routes);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        let handle = runtime.spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = Arc::clone(&routes);
                let seen = Arc::clone(&seen);
                tokio::spawn(async move {
                    // Clients may hang up early, e.g. after a timeout.
                    let _ignored = serve(stream, &routes, &seen).await;
                });
            }
        });

        Self {
            base_url: format!("http://{address}"),
            requests,
            handle,
        }
    }

    /// Base URL to configure the backend with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request heads received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl Drop for CannedServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(
    mut stream: TcpStream,
    routes: &[Route],
    seen: &Mutex<Vec<String>>,
) -> std::io::Result<()> {
    let mut head = Vec::new();
    let mut buffer = [0_u8; 1024];
    loop {
        let read = stream.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        head.extend_from_slice(buffer.get(..read).unwrap_or_default());
        if head.windows(4).any(|window| window == b"\r\n\r\n") {
            break;
        }
    }
    let head = String::from_utf8_lossy(&head).into_owned();
    let path = head
        .split_whitespace()
        .nth(1)
        .and_then(|target| target.split('?').next())
        .unwrap_or("/")
        .to_owned();
    seen.lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .push(head);

    let route = routes.iter().find(|route| route.path == path);
    let (status, body, delay) = route.map_or((404, "", Duration::ZERO), |route| {
        (route.status, route.body.as_str(), route.delay)
    });
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\n\
         Content-Length: {length}\r\nConnection: close\r\n\r\n{body}",
        reason = reason_phrase(status),
        length = body.len(),
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    }
}
