use futures_util::SinkExt;
use naval_battle::protocol::{AttackOrder, PeerHealth};
use naval_battle::transport::http::HttpEngine;
use naval_battle::transport::websocket::{subscription_url, WsPushSource};
use naval_battle::{ClientError, EngineApi, FleetPlacement, Position, PushSource, PushStream};
use rand::{rngs::SmallRng, SeedableRng};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

/// A request as seen by the one-shot responder.
struct Captured {
    head: String,
    body: String,
}

/// Serve exactly one HTTP request, answering with `reply_status` and `reply_body`.
async fn respond_once(
    reply_status: &'static str,
    reply_body: &'static str,
) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let head_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client closed before sending headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(i) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break i + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let length = head
            .lines()
            .filter_map(|l| l.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < head_end + length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        let body = String::from_utf8_lossy(&buf[head_end..]).to_string();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            reply_status,
            reply_body.len(),
            reply_body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        Captured { head, body }
    });
    (format!("http://{}", addr), server)
}

/// A port nothing listens on.
async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

#[tokio::test]
async fn defense_status_is_fetched_by_game_id() {
    let (url, server) = respond_once(
        "200 OK",
        r#"{"state":"q1","total_attacks":0,"ships_status":[],"grid":{"A1":"~"}}"#,
    )
    .await;
    let engine = HttpEngine::new(url).unwrap();

    let status = engine.defense_status("player1").await.unwrap();
    assert_eq!(status.state, "q1");

    let seen = server.await.unwrap();
    assert!(
        seen.head.starts_with("GET /api/defense/status?game_id=player1 HTTP/1.1"),
        "{}",
        seen.head
    );
}

#[tokio::test]
async fn fleet_setup_posts_ship_positions() {
    let (url, server) = respond_once("200 OK", r#"{"message":"Fleet placed"}"#).await;
    let engine = HttpEngine::new(format!("{}/", url)).unwrap();
    let mut placement = FleetPlacement::new();
    placement.auto_place(&mut SmallRng::seed_from_u64(3)).unwrap();
    let submission = placement.commit("player7").unwrap();

    engine.setup_fleet(&submission).await.unwrap();

    let seen = server.await.unwrap();
    assert!(seen.head.starts_with("POST /api/defense/setup HTTP/1.1"));
    let body: serde_json::Value = serde_json::from_str(&seen.body).unwrap();
    assert_eq!(body["game_id"], "player7");
    assert_eq!(body["battleship"].as_array().map(Vec::len), Some(3));
    assert_eq!(body["submarine"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["destroyer"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn attack_order_body_matches_the_engine_contract() {
    let (url, server) = respond_once("200 OK", r#"{"position":"C3","response":"hit"}"#).await;
    let engine = HttpEngine::new(url).unwrap();
    let order = AttackOrder {
        position: "C3".parse::<Position>().unwrap(),
        enemy_host: "localhost".to_string(),
        enemy_port: 8000,
        enemy_game_id: "player1".to_string(),
        game_id: "player2".to_string(),
    };

    let receipt = engine.send_attack(&order).await.unwrap();
    assert_eq!(receipt["response"], "hit");

    let seen = server.await.unwrap();
    assert!(seen.head.starts_with("POST /api/attack/send HTTP/1.1"));
    let body: serde_json::Value = serde_json::from_str(&seen.body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "position": "C3",
            "enemy_host": "localhost",
            "enemy_port": 8000,
            "enemy_game_id": "player1",
            "game_id": "player2",
        })
    );
}

#[tokio::test]
async fn error_status_carries_the_response_body() {
    let (url, server) = respond_once("404 Not Found", r#"{"detail":"Game not found"}"#).await;
    let engine = HttpEngine::new(url).unwrap();

    let err = engine.attack_status("nobody").await.unwrap_err();
    assert_eq!(err, ClientError::http(404, r#"{"detail":"Game not found"}"#));
    server.await.unwrap();
}

#[tokio::test]
async fn unexpected_payload_is_a_decode_error() {
    let (url, server) = respond_once("200 OK", r#"{"unexpected":true}"#).await;
    let engine = HttpEngine::new(url).unwrap();

    let err = engine.attack_status("player1").await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)), "{:?}", err);
    server.await.unwrap();
}

#[tokio::test]
async fn refused_connection_is_a_network_error() {
    let port = closed_port().await;
    let engine = HttpEngine::new(format!("http://127.0.0.1:{}", port)).unwrap();
    let err = engine.init_attack("player1").await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)), "{:?}", err);
}

#[tokio::test]
async fn health_check_hits_the_peer_health_endpoint() {
    let (url, server) = respond_once("200 OK", r#"{"status":"healthy"}"#).await;
    let port: u16 = url.rsplit(':').next().unwrap().parse().unwrap();
    let engine = HttpEngine::new("http://127.0.0.1:1").unwrap();

    assert_eq!(engine.probe_peer("127.0.0.1", port).await, PeerHealth::Healthy);
    let seen = server.await.unwrap();
    assert!(seen.head.starts_with("GET /api/health HTTP/1.1"));
}

#[tokio::test]
async fn health_check_reports_error_status_and_unreachable_peers() {
    let (url, server) = respond_once("500 Internal Server Error", "{}").await;
    let port: u16 = url.rsplit(':').next().unwrap().parse().unwrap();
    let engine = HttpEngine::new("http://127.0.0.1:1").unwrap();
    assert_eq!(
        engine.probe_peer("127.0.0.1", port).await,
        PeerHealth::ErrorStatus(500)
    );
    server.await.unwrap();

    let port = closed_port().await;
    assert!(matches!(
        engine.probe_peer("127.0.0.1", port).await,
        PeerHealth::Unreachable(_)
    ));
}

#[tokio::test]
async fn websocket_push_delivers_statuses_until_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut path = String::new();
        let record_path = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            path = req.uri().path().to_string();
            Ok(resp)
        };
        let mut ws = tokio_tungstenite::accept_hdr_async(stream, record_path)
            .await
            .unwrap();
        ws.send(Message::Ping(Vec::new().into())).await.unwrap();
        ws.send(Message::Text(
            r#"{"state":"q2","total_attacks":1,"grid":{"B2":"X"}}"#.into(),
        ))
        .await
        .unwrap();
        ws.send(Message::Text("not json".into())).await.unwrap();
        ws.close(None).await.unwrap();
        path
    });

    let source = WsPushSource::new(format!("ws://{}/", addr));
    let mut stream = source.subscribe("blue fleet").await.unwrap();

    let status = stream.next_status().await.unwrap().unwrap();
    assert_eq!(status.state, "q2");
    assert_eq!(status.total_attacks, 1);
    assert!(matches!(
        stream.next_status().await,
        Some(Err(ClientError::Decode(_)))
    ));
    assert!(stream.next_status().await.is_none());
    assert_eq!(server.await.unwrap(), "/ws/blue%20fleet");
}

#[test]
fn push_url_keeps_the_game_id_in_one_segment() {
    let url = subscription_url("ws://localhost:8000", "team a/b").unwrap();
    assert_eq!(url.as_str(), "ws://localhost:8000/ws/team%20a%2Fb");
    let url = subscription_url("wss://engine.example/base", "player1").unwrap();
    assert_eq!(url.as_str(), "wss://engine.example/base/ws/player1");
    assert!(matches!(
        subscription_url("not a url", "player1"),
        Err(ClientError::Subscription(_))
    ));
}

#[tokio::test]
async fn websocket_refusal_is_a_subscription_error() {
    let port = closed_port().await;
    let source = WsPushSource::new(format!("ws://127.0.0.1:{}", port));
    let err = source.subscribe("player1").await.err();
    assert!(matches!(err, Some(ClientError::Subscription(_))));
}
