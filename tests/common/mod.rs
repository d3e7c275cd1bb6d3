#![allow(dead_code)]

use async_trait::async_trait;
use relayx::core::events::{DispatchEvent, EventListener};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// One scripted HTTP reply
#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub body: Vec<u8>,
    /// Omit `Content-Length` and delimit the body by closing the connection
    pub close_delimited: bool,
    pub delay: Option<Duration>,
}

impl CannedResponse {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.as_bytes().to_vec(),
            close_delimited: false,
            delay: None,
        }
    }

    pub fn bytes(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            body,
            close_delimited: false,
            delay: None,
        }
    }

    pub fn close_delimited(mut self) -> Self {
        self.close_delimited = true;
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// What the server saw
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path plus query string
    pub target: String,
    /// Lower-cased names
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }
}

/// In-process HTTP/1.1 responder replaying scripted replies in order
///
/// The last reply repeats once the script runs out.
pub struct MockServer {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServer {
    pub async fn start(script: Vec<CannedResponse>) -> Self {
        assert!(!script.is_empty(), "script needs at least one response");
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let script = Arc::new(script);

        let (hits_task, requests_task) = (hits.clone(), requests.clone());
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let index = hits_task.fetch_add(1, Ordering::SeqCst);
                let reply = script[index.min(script.len() - 1)].clone();
                let requests = requests_task.clone();
                tokio::spawn(async move {
                    if let Some(request) = read_request(&stream).await {
                        requests.lock().unwrap().push(request);
                    }
                    write_response(stream, reply).await;
                });
            }
        });

        Self {
            addr,
            hits,
            requests,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(stream: &TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        stream.readable().await.ok()?;
        match stream.try_read(&mut chunk) {
            Ok(0) => return None,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
            Err(_) => return None,
        }
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        stream.readable().await.ok()?;
        match stream.try_read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => body.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
            Err(_) => break,
        }
    }

    Some(RecordedRequest {
        method,
        target,
        headers,
        body,
    })
}

async fn write_response(mut stream: TcpStream, reply: CannedResponse) {
    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }

    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nConnection: close\r\n",
        reply.status,
        reason(reply.status)
    );
    if !reply.close_delimited {
        head.push_str(&format!("Content-Length: {}\r\n", reply.body.len()));
    }
    head.push_str("\r\n");

    let _ = stream.write_all(head.as_bytes()).await;
    let _ = stream.write_all(&reply.body).await;
    let _ = stream.shutdown().await;
    // drain so the client never sees a reset
    let mut sink = [0u8; 1024];
    let _ = tokio::time::timeout(Duration::from_millis(50), stream.read(&mut sink)).await;
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Forwards every event to a channel
pub struct ChannelListener(pub mpsc::UnboundedSender<Arc<DispatchEvent>>);

#[async_trait]
impl EventListener for ChannelListener {
    async fn on_event(&self, event: Arc<DispatchEvent>) -> anyhow::Result<()> {
        self.0.send(event)?;
        Ok(())
    }
}

/// Next event, failing the test after one second
pub async fn next_event(
    rx: &mut mpsc::UnboundedReceiver<Arc<DispatchEvent>>,
) -> Arc<DispatchEvent> {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("event within 1s")
        .expect("channel open")
}
