//! End-to-end handshake tests against an in-process WebSocket server that
//! speaks the deepstream text protocol.

use std::time::Duration;

use deepstream_client_rs::{
    Action, DeepstreamClient, DeepstreamClientOptions, ConnectionState, Topic,
};
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;

const FS: char = '\u{1f}';
const MS: char = '\u{1e}';

fn frame(parts: &[&str]) -> WsMessage {
    let joined = parts.join(&FS.to_string());
    WsMessage::Text(format!("{joined}{MS}").into())
}

async fn expect_text(ws: &mut WebSocketStream<TcpStream>) -> String {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for a client message")
            .expect("client closed the stream")
            .expect("websocket read failed");
        if let WsMessage::Text(text) = message {
            return text.to_string();
        }
    }
}

async fn wait_until_logged_in(client: &DeepstreamClient) {
    for _ in 0..100 {
        if client.is_logged_in().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("client never reached the logged-in state");
}

#[tokio::test]
async fn test_full_handshake_reaches_open_and_answers_ping() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        ws.send(frame(&["C", "CH"])).await.unwrap();
        let challenge_response = expect_text(&mut ws).await;
        assert!(challenge_response.starts_with(&format!("C{FS}CHR{FS}")));

        ws.send(frame(&["C", "A"])).await.unwrap();
        let auth_request = expect_text(&mut ws).await;
        assert!(auth_request.starts_with(&format!("A{FS}REQ{FS}")));

        ws.send(frame(&["A", "A"])).await.unwrap();

        ws.send(frame(&["C", "PI"])).await.unwrap();
        let pong = expect_text(&mut ws).await;
        assert_eq!(pong, format!("C{FS}PO{MS}"));
    });

    let client = DeepstreamClient::new(
        format!("ws://{addr}"),
        DeepstreamClientOptions {
            credentials: serde_json::json!({ "username": "ada" }),
            ..Default::default()
        },
    )
    .unwrap();

    client.connect(None).await.unwrap();
    wait_until_logged_in(&client).await;

    assert!(client.is_connected().await);
    assert_eq!(client.connection_state().await, ConnectionState::Open);

    server.await.unwrap();
    client.close().await.unwrap();
    for _ in 0..100 {
        if client.connection_state().await == ConnectionState::Closed {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(client.connection_state().await, ConnectionState::Closed);
}

#[tokio::test]
async fn test_sends_issued_before_login_are_flushed_in_order() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        ws.send(frame(&["C", "CH"])).await.unwrap();
        let _challenge_response = expect_text(&mut ws).await;
        ws.send(frame(&["C", "A"])).await.unwrap();
        let _auth_request = expect_text(&mut ws).await;
        ws.send(frame(&["A", "A"])).await.unwrap();

        // buffered messages replay in the order they were issued
        let first = expect_text(&mut ws).await;
        assert_eq!(first, format!("E{FS}S{FS}news{MS}"));
        let second = expect_text(&mut ws).await;
        assert_eq!(second, format!("R{FS}CR{FS}user/1{MS}"));
    });

    let client = DeepstreamClient::new(format!("ws://{addr}"), Default::default()).unwrap();

    // issued while closed: buffered, and a connection is triggered
    client
        .send(Topic::Event, Action::Subscribe, vec!["news".to_string()])
        .await
        .unwrap();
    client
        .send(
            Topic::Record,
            Action::CreateOrRead,
            vec!["user/1".to_string()],
        )
        .await
        .unwrap();

    wait_until_logged_in(&client).await;
    server.await.unwrap();

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_open_sends_go_straight_to_the_socket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        ws.send(frame(&["C", "CH"])).await.unwrap();
        let _ = expect_text(&mut ws).await;
        ws.send(frame(&["C", "A"])).await.unwrap();
        let _ = expect_text(&mut ws).await;
        ws.send(frame(&["A", "A"])).await.unwrap();

        let event = expect_text(&mut ws).await;
        assert_eq!(event, format!("E{FS}EVT{FS}news{FS}hello{MS}"));
    });

    let client = DeepstreamClient::new(format!("ws://{addr}"), Default::default()).unwrap();
    client.connect(None).await.unwrap();
    wait_until_logged_in(&client).await;

    client
        .send(
            Topic::Event,
            Action::Event,
            vec!["news".to_string(), "hello".to_string()],
        )
        .await
        .unwrap();

    server.await.unwrap();
    client.close().await.unwrap();
}
