#![allow(dead_code)]

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{StatusCode, Uri},
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Notify;

use selection_explainer::analyzer::Analyzer;
use selection_explainer::clock::FixedClock;
use selection_explainer::gemini::GeminiClient;
use selection_explainer::rate_limit::{LimiterConfig, RateLimiter};
use selection_explainer::store::{CounterStore, MemoryStore};

pub const NOW: i64 = 1_700_000_000_000;

#[derive(Default)]
struct Recorded {
    uri: Option<Uri>,
    body: Option<serde_json::Value>,
}

struct FakeState {
    status: StatusCode,
    body: String,
    hits: AtomicUsize,
    recorded: Mutex<Recorded>,
    // when set, each reply waits for one notification
    gate: Option<Arc<Notify>>,
}

// Stand-in for the Gemini endpoint that always answers with one canned reply.
pub struct FakeProvider {
    pub base_url: String,
    state: Arc<FakeState>,
}

impl FakeProvider {
    pub async fn spawn(status: StatusCode, body: impl Into<String>) -> Self {
        Self::start(status, body.into(), None).await
    }

    // Like `spawn`, but every reply is held until the returned `Notify` fires.
    pub async fn spawn_held(status: StatusCode, body: impl Into<String>) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let provider = Self::start(status, body.into(), Some(gate.clone())).await;
        (provider, gate)
    }

    async fn start(status: StatusCode, body: String, gate: Option<Arc<Notify>>) -> Self {
        let state = Arc::new(FakeState {
            status,
            body,
            hits: AtomicUsize::new(0),
            recorded: Mutex::new(Recorded::default()),
            gate,
        });
        let app = Router::new().fallback(fake_generate).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn last_uri(&self) -> Option<Uri> {
        self.state.recorded.lock().unwrap().uri.clone()
    }

    pub fn last_body(&self) -> Option<serde_json::Value> {
        self.state.recorded.lock().unwrap().body.clone()
    }
}

async fn fake_generate(
    State(state): State<Arc<FakeState>>,
    uri: Uri,
    body: Bytes,
) -> (StatusCode, String) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    {
        let mut recorded = state.recorded.lock().unwrap();
        recorded.uri = Some(uri);
        recorded.body = serde_json::from_slice(&body).ok();
    }
    if let Some(gate) = &state.gate {
        gate.notified().await;
    }
    (state.status, state.body.clone())
}

// Answers every request with a 200 whose body stops short of its
// Content-Length, then closes the connection.
pub async fn truncating_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            read_request(&mut socket).await;
            let reply = "HTTP/1.1 200 OK\r\n\
                         Content-Type: application/json\r\n\
                         Content-Length: 4096\r\n\r\n\
                         {\"candidates\":[";
            let _ = socket.write_all(reply.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });
    format!("http://{}", addr)
}

// Consume headers and body so closing the socket doesn't reset it early
async fn read_request(socket: &mut tokio::net::TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let Ok(n) = socket.read(&mut chunk).await else { return };
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(end) = text.find("\r\n\r\n") {
            let length = text[..end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    if !name.eq_ignore_ascii_case("content-length") {
                        return None;
                    }
                    value.trim().parse::<usize>().ok()
                })
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                return;
            }
        }
    }
}

// Minimal reader for a `text/event-stream` response.
pub struct EventReader {
    res: reqwest::Response,
    buf: String,
}

impl EventReader {
    pub fn new(res: reqwest::Response) -> Self {
        Self { res, buf: String::new() }
    }

    // Next `(event, data)` pair, or `None` once the stream has ended.
    pub async fn next_event(&mut self) -> Option<(String, serde_json::Value)> {
        loop {
            if let Some(end) = self.buf.find("\n\n") {
                let block: String = self.buf.drain(..end + 2).collect();
                let mut name = None;
                let mut data = None;
                for line in block.lines() {
                    if let Some(v) = line.strip_prefix("event:") {
                        name = Some(v.trim().to_string());
                    } else if let Some(v) = line.strip_prefix("data:") {
                        data = serde_json::from_str(v.trim()).ok();
                    }
                }
                // keep-alive comments carry no data
                if let (Some(name), Some(data)) = (name, data) {
                    return Some((name, data));
                }
                continue;
            }
            let chunk = self.res.chunk().await.ok()??;
            self.buf.push_str(&String::from_utf8_lossy(&chunk));
        }
    }
}

// Address with nothing listening on it.
pub async fn dead_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

// bypass any proxy configured in the environment
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

pub fn gemini(base_url: &str) -> GeminiClient {
    GeminiClient::new(http_client(), base_url, "gemini-1.5-flash")
}

pub fn analyzer(store: Arc<dyn CounterStore>, base_url: &str, clock: Arc<FixedClock>) -> Analyzer {
    Analyzer::new(
        store.clone(),
        RateLimiter::new(store, LimiterConfig::default()),
        gemini(base_url),
        clock,
    )
}

pub async fn store_with_key(key: &str) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.save_api_key(key).await.unwrap();
    store
}

pub fn answer(text: &str) -> String {
    serde_json::json!({
        "candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]
    })
    .to_string()
}
