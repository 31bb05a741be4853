//! Common Test Utilities
//!
//! Shared helpers, fixtures, and test infrastructure.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout, Instant};
use tokio_tungstenite::{
    connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};

use feed_gateway::config::{ProfileStoreBackend, Settings};
use feed_gateway::domain::{ProfileStore, SocialProfile};
use feed_gateway::infrastructure::profile_store::InMemoryProfileStore;
use feed_gateway::presentation::http::create_router;
use feed_gateway::shared::error::StoreError;
use feed_gateway::startup::{AppState, Application};

/// How long a client waits for an expected frame
const RECV_TIMEOUT: Duration = Duration::from_secs(3);

/// Field carried by the self-addressed frames used to sync on a join
const SYNC_FIELD: &str = "syncID";

/// Settings for a server on an ephemeral local port with the in-memory store
pub fn test_settings() -> Settings {
    let mut settings = Settings::defaults().expect("default settings");
    settings.server.host = "127.0.0.1".into();
    settings.server.port = 0;
    settings.profile_store.backend = ProfileStoreBackend::Memory;
    settings
}

/// A running gateway
pub struct TestApp {
    pub addr: SocketAddr,
    pub state: AppState,
    pub store: Arc<InMemoryProfileStore>,
}

impl TestApp {
    /// Spawn a gateway with an empty profile store
    pub async fn spawn() -> Self {
        Self::spawn_with_store(InMemoryProfileStore::new()).await
    }

    /// Spawn a gateway over `store`
    pub async fn spawn_with_store(store: InMemoryProfileStore) -> Self {
        Self::spawn_with_settings(test_settings(), store).await
    }

    /// Spawn a gateway with custom settings over `store`
    pub async fn spawn_with_settings(settings: Settings, store: InMemoryProfileStore) -> Self {
        let store = Arc::new(store);
        let app = Application::build_with_store(
            settings,
            Arc::clone(&store) as Arc<dyn ProfileStore>,
        )
        .await
        .expect("build application");

        let addr = app.local_addr().expect("local addr");
        let state = app.state().clone();
        tokio::spawn(app.run_until_stopped());

        Self { addr, state, store }
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }

    /// Connect a client to `/ws`
    pub async fn connect(&self) -> WsClient {
        WsClient::connect(&self.ws_url("/ws")).await
    }

    /// Connect a client and join as `uid`
    pub async fn join(&self, uid: &str, room: Option<&str>) -> WsClient {
        let mut client = self.connect().await;
        client.join(uid, room).await;
        client
    }

    /// Wait until the registry holds `expected` entries
    pub async fn wait_for_registered(&self, expected: usize) {
        let deadline = Instant::now() + RECV_TIMEOUT;
        while self.state.registry.len() != expected {
            assert!(
                Instant::now() < deadline,
                "registry has {} entries, expected {}",
                self.state.registry.len(),
                expected
            );
            sleep(Duration::from_millis(10)).await;
        }
    }
}

/// WebSocket test client
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    pub async fn connect(url: &str) -> Self {
        let (stream, _) = connect_async(url).await.expect("websocket connect");
        Self { stream }
    }

    pub async fn send_json(&mut self, value: &Value) {
        self.send_text(&value.to_string()).await;
    }

    pub async fn send_text(&mut self, text: &str) {
        self.stream
            .send(Message::Text(text.to_string().into()))
            .await
            .expect("send text");
    }

    pub async fn send_binary(&mut self, data: Vec<u8>) {
        self.stream
            .send(Message::Binary(data.into()))
            .await
            .expect("send binary");
    }

    /// Join as `uid` and wait until the server has registered the connection.
    ///
    /// Frames from one socket are handled in order, so once a notification
    /// sent after the join comes back the join has been applied.
    pub async fn join(&mut self, uid: &str, room: Option<&str>) {
        let mut join = json!({"type": "join", "uid": uid});
        if let Some(room) = room {
            join["roomID"] = json!(room);
        }
        self.send_json(&join).await;
        self.sync(uid).await;
    }

    /// Round-trip a self-addressed notification
    pub async fn sync(&mut self, uid: &str) {
        let marker = uuid::Uuid::new_v4().to_string();
        self.send_json(&json!({"type": "notification", "uid": uid, "syncID": marker}))
            .await;

        let deadline = Instant::now() + RECV_TIMEOUT;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let frame = self
                .next_frame(remaining)
                .await
                .expect("sync notification not echoed");
            if frame[SYNC_FIELD] == marker.as_str() {
                return;
            }
        }
    }

    /// Next event frame, skipping sync frames
    pub async fn recv_json(&mut self) -> Value {
        loop {
            let frame = self
                .next_frame(RECV_TIMEOUT)
                .await
                .expect("expected a frame");
            if frame.get(SYNC_FIELD).is_none() {
                return frame;
            }
        }
    }

    /// Assert that no event frame arrives within `window`
    pub async fn expect_silence(&mut self, window: Duration) {
        let deadline = Instant::now() + window;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return;
            }
            match self.next_frame(remaining).await {
                Some(frame) if frame.get(SYNC_FIELD).is_some() => continue,
                Some(frame) => panic!("unexpected frame: {}", frame),
                None => return,
            }
        }
    }

    /// Whether the server has closed the socket within `window`
    pub async fn is_closed_within(&mut self, window: Duration) -> bool {
        let result = timeout(window, async {
            loop {
                match self.stream.next().await {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return true,
                    Some(Ok(_)) => continue,
                }
            }
        })
        .await;
        result.unwrap_or(false)
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }

    async fn next_frame(&mut self, wait: Duration) -> Option<Value> {
        let result = timeout(wait, async {
            while let Some(msg) = self.stream.next().await {
                match msg.expect("websocket read") {
                    Message::Text(text) => {
                        return Some(serde_json::from_str(text.as_str()).expect("frame is JSON"))
                    }
                    Message::Close(_) => return None,
                    _ => continue,
                }
            }
            None
        })
        .await;
        result.unwrap_or(None)
    }
}

/// Profiles with the given uids and no relations
pub fn profiles(uids: &[&str]) -> InMemoryProfileStore {
    InMemoryProfileStore::with_profiles(uids.iter().copied().map(SocialProfile::new))
}

/// Router over `store` for in-process HTTP tests
pub fn test_router(store: Arc<dyn ProfileStore>) -> Router {
    create_router(AppState::new(test_settings(), store))
}

/// Profile store whose backend is down
pub struct UnavailableStore;

#[async_trait]
impl ProfileStore for UnavailableStore {
    async fn get_profile(&self, _uid: &str) -> Result<Option<SocialProfile>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn list_profile_ids(&self) -> Result<Vec<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}
