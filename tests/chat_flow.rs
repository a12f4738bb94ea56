//! End-to-end chat exchanges against a loopback WebSocket server.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use storefront_chat::models::{ChatMessage, Role, WireMessage};
use storefront_chat::persist::{FileFlagStore, MemoryFlagStore};
use storefront_chat::session::{ChatSession, SessionConfig};
use storefront_chat::transport::{ConnectConfig, Connection, Outbound};

const WAIT: Duration = Duration::from_secs(5);

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind loopback");
    let url = format!("ws://{}", listener.local_addr().expect("local addr"));
    (listener, url)
}

fn chat_frame(sender: Role, text: &str) -> Message {
    Message::Text(
        WireMessage::Message(ChatMessage::new(sender, text))
            .encode()
            .expect("encode")
            .into(),
    )
}

async fn recv_frame(connection: &mut Connection) -> WireMessage {
    timeout(WAIT, connection.recv())
        .await
        .expect("recv timed out")
        .expect("connection ended early")
}

fn session_over(connection: &Connection, role: Role, url: &str) -> ChatSession {
    let config = SessionConfig { role, endpoint: url.to_string() };
    ChatSession::new(
        config,
        Box::new(connection.outbound()),
        Box::new(MemoryFlagStore::new()),
    )
    .expect("session")
}

#[tokio::test]
async fn remote_delivery_order_is_preserved_across_interleaving() {
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = accept_async(stream).await.expect("handshake");
        for text in ["m1", "m2", "m3"] {
            ws.send(chat_frame(Role::Store, text)).await.expect("send");
        }
        // Hold the socket until the client closes.
        let _ = ws.next().await;
    });

    let mut connection = Connection::open(&url, ConnectConfig::default())
        .await
        .expect("open");
    let mut session = session_over(&connection, Role::Customer, &url);
    session.seed(vec![ChatMessage::new(Role::Store, "환영합니다")]);

    session.append_remote(recv_frame(&mut connection).await);
    session.append_local("사이사이");
    session.append_remote(recv_frame(&mut connection).await);
    session.append_remote(recv_frame(&mut connection).await);

    let texts: Vec<&str> = session.messages().iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["환영합니다", "m1", "사이사이", "m2", "m3"]);

    connection.close().await;
    server.await.expect("server task");
}

#[tokio::test]
async fn local_appends_are_observed_before_transmission_reaches_the_server() {
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = accept_async(stream).await.expect("handshake");
        let mut received = Vec::new();
        while let Some(frame) = ws.next().await {
            match frame.expect("ws error") {
                Message::Text(text) => {
                    received.push(WireMessage::decode(text.as_str()).expect("decode"));
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
        received
    });

    let mut connection = Connection::open(&url, ConnectConfig::default())
        .await
        .expect("open");
    let mut session = session_over(&connection, Role::Customer, &url);

    assert!(session.append_local("첫 번째"));
    assert!(session.append_local("두 번째"));
    // Local echo is synchronous, whatever the socket does afterwards.
    assert_eq!(session.messages().len(), 2);

    connection.close().await;
    let received = timeout(WAIT, server)
        .await
        .expect("server timed out")
        .expect("server task");
    assert_eq!(
        received,
        vec![
            WireMessage::Message(ChatMessage::new(Role::Customer, "첫 번째")),
            WireMessage::Message(ChatMessage::new(Role::Customer, "두 번째")),
        ]
    );
}

#[tokio::test]
async fn malformed_and_unknown_frames_never_reach_the_log() {
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = accept_async(stream).await.expect("handshake");
        ws.send(Message::Text("definitely not json".into()))
            .await
            .expect("send");
        ws.send(Message::Text(r#"{"kind":"presence","user":"x"}"#.into()))
            .await
            .expect("send");
        ws.send(Message::Binary(vec![1, 2, 3].into()))
            .await
            .expect("send");
        ws.send(chat_frame(Role::Store, "정상 메시지")).await.expect("send");
        let _ = ws.next().await;
    });

    let mut connection = Connection::open(&url, ConnectConfig::default())
        .await
        .expect("open");
    let mut session = session_over(&connection, Role::Customer, &url);

    // The first frame that survives decoding is the valid chat message.
    session.append_remote(recv_frame(&mut connection).await);
    assert_eq!(session.messages().len(), 1);
    assert_eq!(session.messages()[0].text, "정상 메시지");

    connection.close().await;
    server.await.expect("server task");
}

#[tokio::test]
async fn close_is_idempotent_and_send_becomes_a_dropped_no_op() {
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = accept_async(stream).await.expect("handshake");
        while let Some(Ok(frame)) = ws.next().await {
            if matches!(frame, Message::Close(_)) {
                break;
            }
        }
    });

    let mut connection = Connection::open(&url, ConnectConfig::default())
        .await
        .expect("open");
    assert!(connection.is_open());
    let outbound = connection.outbound();

    connection.close().await;
    connection.close().await;
    assert!(!connection.is_open());

    assert!(!outbound.transmit(&WireMessage::StrategyRequest { customer_id: None }));
    assert_eq!(timeout(WAIT, connection.recv()).await.expect("recv timed out"), None);

    server.await.expect("server task");
}

#[tokio::test]
async fn session_still_appends_while_the_transport_is_closed() {
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = accept_async(stream).await.expect("handshake");
        let mut texts = 0usize;
        while let Some(Ok(frame)) = ws.next().await {
            match frame {
                Message::Text(_) => texts += 1,
                Message::Close(_) => break,
                _ => {}
            }
        }
        texts
    });

    let mut connection = Connection::open(&url, ConnectConfig::default())
        .await
        .expect("open");
    let mut session = session_over(&connection, Role::Customer, &url);
    session.seed(vec![ChatMessage::new(Role::Store, "greeting")]);

    connection.close().await;
    assert!(session.append_local("hello"));
    assert_eq!(session.messages().len(), 2);

    let texts = timeout(WAIT, server)
        .await
        .expect("server timed out")
        .expect("server task");
    assert_eq!(texts, 0, "no transmission may occur on a closed transport");
}

#[test]
fn ended_chat_survives_reload_through_the_file_store() {
    struct NullOutbound;
    impl Outbound for NullOutbound {
        fn transmit(&self, _frame: &WireMessage) -> bool {
            false
        }
    }

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session.json");
    let config = SessionConfig {
        role: Role::Customer,
        endpoint: "ws://localhost:8000/ws/chat".to_string(),
    };

    let mut session = ChatSession::new(
        config.clone(),
        Box::new(NullOutbound),
        Box::new(FileFlagStore::new(&path)),
    )
    .expect("session");
    assert!(!session.is_ended());
    session.end_session().expect("end");

    // A fresh session over the same file simulates a page reload.
    let reloaded = ChatSession::new(
        config,
        Box::new(NullOutbound),
        Box::new(FileFlagStore::new(&path)),
    )
    .expect("reloaded session");
    assert!(reloaded.is_ended());
}
