// Shared primitives for one-time server bootstrapping across integration tests.
#![allow(dead_code)]

use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

use base64::Engine;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Password the test server is configured with.
pub const TEST_PASSWORD: &str = "integration-password";

// Global host:port used by all tests after the server publishes its bound address.
static SERVER_ADDR: OnceLock<String> = OnceLock::new();
// One-time guard that ensures the server bootstrap path runs only once.
static SERVER_READY: OnceLock<()> = OnceLock::new();

/// Ensure the test server is running and return the shared host:port.
pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        let published_addr = Arc::new(OnceLock::<String>::new());
        let published_addr_thread = Arc::clone(&published_addr);
        // Spawn an OS thread so the server outlives individual `#[tokio::test]` runtimes.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                // Bind to an ephemeral port to avoid collisions with local services.
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_addr_thread.set(addr.to_string());
                let config = prompter_server::Config {
                    port: addr.port(),
                    password: TEST_PASSWORD.to_string(),
                    trust_proxy: false,
                };
                prompter_server::run(listener, config)
                    .await
                    .expect("server failed");
            });
        });
        wait_for_server_addr_and_readiness(published_addr);
    });

    SERVER_ADDR
        .get()
        .expect("server address should be initialized")
        .as_str()
}

// Wait for address publication and then for the socket to accept TCP connections.
fn wait_for_server_addr_and_readiness(published_addr: Arc<OnceLock<String>>) {
    let addr = loop {
        if let Some(addr) = published_addr.get() {
            break addr.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let _ = SERVER_ADDR.set(addr.clone());

    // Retry for a short period to avoid racing server bind/accept.
    for _ in 0..100 {
        if std::net::TcpStream::connect(&addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}

pub type WsClient = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Connects a WebSocket client with valid credentials and the given role
/// sub-protocol.
pub async fn connect(protocol: &str) -> WsClient {
    try_connect(Some(protocol), Some(TEST_PASSWORD))
        .await
        .expect("websocket connect")
}

/// Connects a WebSocket client with optional sub-protocol and credentials.
pub async fn try_connect(
    protocol: Option<&str>,
    password: Option<&str>,
) -> Result<WsClient, tokio_tungstenite::tungstenite::Error> {
    let addr = ensure_server();
    let mut request = format!("ws://{addr}/ws").into_client_request()?;
    if let Some(password) = password {
        let credentials =
            base64::engine::general_purpose::STANDARD.encode(format!("admin:{password}"));
        request.headers_mut().insert(
            "Authorization",
            HeaderValue::from_str(&format!("Basic {credentials}")).expect("header value"),
        );
    }
    if let Some(protocol) = protocol {
        request.headers_mut().insert(
            "Sec-WebSocket-Protocol",
            HeaderValue::from_str(protocol).expect("header value"),
        );
    }
    let (client, _response) = tokio_tungstenite::connect_async(request).await?;
    Ok(client)
}

/// Next text frame from the server, parsed as JSON. Panics on timeout.
pub async fn recv_json(client: &mut WsClient) -> serde_json::Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for message")
            .expect("stream ended while waiting for message")
            .expect("websocket error");
        if let Message::Text(text) = message {
            return serde_json::from_str(&text).expect("server sent invalid json");
        }
    }
}

/// Asserts that no frame arrives within a short window. Messages this guards
/// against would already be queued by the time callers get here.
pub async fn expect_silence(client: &mut WsClient) {
    match tokio::time::timeout(Duration::from_millis(300), client.next()).await {
        Err(_) => {}
        Ok(Some(Ok(message))) => panic!("expected no message, got {message:?}"),
        Ok(Some(Err(e))) => panic!("websocket error while expecting silence: {e}"),
        Ok(None) => panic!("stream ended while expecting silence"),
    }
}

/// Sends a JSON value as a text frame.
pub async fn send_json(client: &mut WsClient, value: serde_json::Value) {
    send_text(client, &value.to_string()).await;
}

/// Sends a raw text frame, JSON or not.
pub async fn send_text(client: &mut WsClient, text: &str) {
    client
        .send(Message::text(text.to_string()))
        .await
        .expect("websocket send");
}
