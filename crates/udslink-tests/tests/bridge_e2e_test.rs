//! End-to-end bridge tests
//!
//! Each test spins up a real UDS simulator (or a raw echo backend) and a
//! real bridge on ephemeral ports, then drives them through the tester
//! client or a raw WebSocket.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use example_ecu::{DidStore, EcuServer};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use udslink_bridge::{Bridge, BridgeConfig, SessionRegistry};
use udslink_client::{ClientError, DiagClient};
use udslink_codec::{NegativeResponseCode, UdsRequest, UdsResponse};

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Harness
// =============================================================================

async fn start_ecu() -> SocketAddr {
    let store = Arc::new(DidStore::new());
    let server = EcuServer::bind("127.0.0.1:0", store).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    addr
}

/// Backend that echoes every received chunk back verbatim.
async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 2048];
                loop {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            if stream.write_all(&buf[..n]).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            });
        }
    });
    addr
}

/// Backend that accepts and immediately closes every connection.
async fn start_slamming_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            drop(stream);
        }
    });
    addr
}

async fn start_bridge(backend: SocketAddr) -> (SocketAddr, SessionRegistry) {
    start_bridge_to(&backend.to_string()).await
}

async fn start_bridge_to(backend_addr: &str) -> (SocketAddr, SessionRegistry) {
    let config = BridgeConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        backend_addr: backend_addr.to_string(),
    };
    let bridge = Bridge::bind(&config).await.unwrap();
    let addr = bridge.local_addr().unwrap();
    let registry = bridge.registry();
    tokio::spawn(bridge.run());
    (addr, registry)
}

async fn wait_until(mut condition: impl FnMut() -> bool, what: &str) {
    let deadline = tokio::time::Instant::now() + TEST_TIMEOUT;
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "Timed out waiting for: {what}"
        );
        sleep(Duration::from_millis(10)).await;
    }
}

// =============================================================================
// Relay round trips
// =============================================================================

#[tokio::test]
async fn test_read_did_round_trip() {
    let ecu = start_ecu().await;
    let (bridge, _) = start_bridge(ecu).await;

    let mut client = DiagClient::new();
    client.connect(&format!("ws://{bridge}")).await.unwrap();

    let response = timeout(
        TEST_TIMEOUT,
        client.request(&UdsRequest::read_data_by_id(0x1234)),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(response, UdsResponse::Positive { service: 0x22 });
    client.disconnect().await;
}

#[tokio::test]
async fn test_write_then_read_back() {
    let ecu = start_ecu().await;
    let (bridge, _) = start_bridge(ecu).await;

    let mut client = DiagClient::new();
    client.connect(&format!("ws://{bridge}")).await.unwrap();

    let write = UdsRequest::write_data_by_id(0x0105, vec![0x01, 0x02]);
    let response = timeout(TEST_TIMEOUT, client.request(&write))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(response, UdsResponse::Positive { service: 0x2E });

    // Raw frame check: the read response must carry the bytes just written.
    let (mut ws, _) = connect_async(format!("ws://{bridge}")).await.unwrap();
    ws.send(Message::Binary(vec![0x22, 0x01, 0x05]))
        .await
        .unwrap();
    let frame = timeout(TEST_TIMEOUT, ws.next()).await.unwrap();
    match frame {
        Some(Ok(Message::Binary(data))) => {
            assert_eq!(data, vec![0x62, 0x01, 0x05, 0x01, 0x02]);
        }
        other => panic!("Expected binary response frame, got {other:?}"),
    }
    ws.close(None).await.unwrap();
}

#[tokio::test]
async fn test_negative_response_for_unsupported_service() {
    let ecu = start_ecu().await;
    let (bridge, _) = start_bridge(ecu).await;

    let mut client = DiagClient::new();
    client.connect(&format!("ws://{bridge}")).await.unwrap();

    let request = UdsRequest::new(0x10, 0x0001, Vec::new());
    let response = timeout(TEST_TIMEOUT, client.request(&request))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        response,
        UdsResponse::Negative {
            service: 0x10,
            nrc: NegativeResponseCode::ServiceNotSupported,
        }
    );
}

#[tokio::test]
async fn test_relay_transparency_with_echo_backend() {
    let echo = start_echo_backend().await;
    let (bridge, _) = start_bridge(echo).await;

    let (mut ws, _) = connect_async(format!("ws://{bridge}")).await.unwrap();

    // Not a valid UDS frame on purpose: the bridge must not care.
    let payload: Vec<u8> = (0u16..512).map(|i| (i % 251) as u8).collect();
    ws.send(Message::Binary(payload.clone())).await.unwrap();

    // The echo may come back split across several messages; order and
    // content must survive regardless.
    let mut received = Vec::new();
    while received.len() < payload.len() {
        let frame = timeout(TEST_TIMEOUT, ws.next())
            .await
            .expect("echo did not arrive in time");
        match frame {
            Some(Ok(Message::Binary(data))) => received.extend_from_slice(&data),
            other => panic!("Expected binary frame, got {other:?}"),
        }
    }
    assert_eq!(received, payload);

    ws.close(None).await.unwrap();
}

#[tokio::test]
async fn test_messages_keep_order() {
    let echo = start_echo_backend().await;
    let (bridge, _) = start_bridge(echo).await;

    let (mut ws, _) = connect_async(format!("ws://{bridge}")).await.unwrap();

    let chunks: Vec<Vec<u8>> = (0u8..10).map(|i| vec![i; 16]).collect();
    for chunk in &chunks {
        ws.send(Message::Binary(chunk.clone())).await.unwrap();
    }

    let expected: Vec<u8> = chunks.concat();
    let mut received = Vec::new();
    while received.len() < expected.len() {
        match timeout(TEST_TIMEOUT, ws.next()).await.unwrap() {
            Some(Ok(Message::Binary(data))) => received.extend_from_slice(&data),
            other => panic!("Expected binary frame, got {other:?}"),
        }
    }
    assert_eq!(received, expected);
}

// =============================================================================
// Session lifecycle
// =============================================================================

#[tokio::test]
async fn test_session_registered_and_removed() {
    let ecu = start_ecu().await;
    let (bridge, registry) = start_bridge(ecu).await;

    let mut client = DiagClient::new();
    client.connect(&format!("ws://{bridge}")).await.unwrap();
    // Exercise the session so both sides are known-good before closing.
    let _ = timeout(
        TEST_TIMEOUT,
        client.request(&UdsRequest::read_data_by_id(0x0001)),
    )
    .await
    .unwrap()
    .unwrap();

    {
        let registry = registry.clone();
        wait_until(move || registry.len() == 1, "session registration").await;
    }

    client.disconnect().await;

    {
        let registry = registry.clone();
        wait_until(move || registry.is_empty(), "session teardown").await;
    }
}

#[tokio::test]
async fn test_session_isolation_on_client_close() {
    let ecu = start_ecu().await;
    let (bridge, registry) = start_bridge(ecu).await;
    let url = format!("ws://{bridge}");

    let mut client_a = DiagClient::new();
    let mut client_b = DiagClient::new();
    client_a.connect(&url).await.unwrap();
    client_b.connect(&url).await.unwrap();

    // Both sessions live
    let request = UdsRequest::read_data_by_id(0x1234);
    assert!(timeout(TEST_TIMEOUT, client_a.request(&request))
        .await
        .unwrap()
        .unwrap()
        .is_positive());
    assert!(timeout(TEST_TIMEOUT, client_b.request(&request))
        .await
        .unwrap()
        .unwrap()
        .is_positive());

    // Tearing down A must leave B fully functional
    client_a.disconnect().await;
    {
        let registry = registry.clone();
        wait_until(move || registry.len() == 1, "session A teardown").await;
    }

    let response = timeout(TEST_TIMEOUT, client_b.request(&request))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(response, UdsResponse::Positive { service: 0x22 });
}

#[tokio::test]
async fn test_backend_close_closes_client() {
    let slamming = start_slamming_backend().await;
    let (bridge, registry) = start_bridge(slamming).await;

    let (mut ws, _) = connect_async(format!("ws://{bridge}")).await.unwrap();

    // The backend drops its end right away; the bridge must propagate the
    // close instead of leaving the WebSocket hanging.
    let frame = timeout(TEST_TIMEOUT, ws.next())
        .await
        .expect("close was not propagated");
    assert!(matches!(frame, Some(Ok(Message::Close(_))) | None));

    let registry = registry.clone();
    wait_until(move || registry.is_empty(), "session teardown").await;
}

#[tokio::test]
async fn test_failed_backend_connect_is_session_local() {
    // Reserve a port, then free it so the first session's connect fails.
    let placeholder = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let backend_addr = placeholder.local_addr().unwrap();
    drop(placeholder);

    let (bridge, registry) = start_bridge(backend_addr).await;
    let url = format!("ws://{bridge}");

    // Session A: handshake succeeds, then the bridge closes the socket
    // because the backend is unreachable. No session is registered.
    let (mut ws_a, _) = connect_async(&url).await.unwrap();
    let frame = timeout(TEST_TIMEOUT, ws_a.next())
        .await
        .expect("failed session was not closed");
    assert!(matches!(frame, Some(Ok(Message::Close(_))) | None));
    assert!(registry.is_empty());

    // Bring the backend up on the same address; session B must relay fine.
    let store = Arc::new(DidStore::new());
    let server = EcuServer::bind(&backend_addr.to_string(), store)
        .await
        .unwrap();
    tokio::spawn(server.run());

    let mut client_b = DiagClient::new();
    client_b.connect(&url).await.unwrap();
    let response = timeout(
        TEST_TIMEOUT,
        client_b.request(&UdsRequest::read_data_by_id(0x0002)),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(response, UdsResponse::Positive { service: 0x22 });
}

#[tokio::test]
async fn test_client_sees_closed_error_after_backend_goes_away() {
    let slamming = start_slamming_backend().await;
    let (bridge, _) = start_bridge(slamming).await;

    let mut client = DiagClient::new();
    client.connect(&format!("ws://{bridge}")).await.unwrap();

    let result = timeout(TEST_TIMEOUT, client.recv()).await.unwrap();
    assert!(matches!(result, Err(ClientError::Closed)));
    assert!(!client.is_connected());
}
