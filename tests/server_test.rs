use std::fs;
use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures_util::{SinkExt, StreamExt};
use mdview::config::FileWatchConfig;
use mdview::server::{ServerState, router, start_live_updates};
use mdview::{Broadcaster, ChangeEvent, PathGuard, Settings};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tower::ServiceExt;

const WAIT: Duration = Duration::from_secs(5);

fn state_for(root: &std::path::Path, broadcaster: Broadcaster) -> ServerState {
    ServerState::new(PathGuard::new(root).unwrap(), &Settings::default(), broadcaster)
}

/// Run the full router on an ephemeral port.
async fn spawn_server(state: ServerState) -> SocketAddr {
    let app = router(state, &Settings::default().server);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn wait_for_connections(broadcaster: &Broadcaster, want: usize) {
    timeout(WAIT, async {
        while broadcaster.connection_count() != want {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| {
        panic!(
            "expected {want} connections, have {}",
            broadcaster.connection_count()
        )
    });
}

#[tokio::test]
async fn test_ws_delivers_events_and_unregisters_on_close() {
    let temp = TempDir::new().unwrap();
    let broadcaster = Broadcaster::default();
    let addr = spawn_server(state_for(temp.path(), broadcaster.clone())).await;

    let (mut socket, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    wait_for_connections(&broadcaster, 1).await;

    assert_eq!(broadcaster.publish(&ChangeEvent::added("x.md")), 1);

    let frame = timeout(WAIT, socket.next())
        .await
        .expect("no frame received")
        .expect("socket ended")
        .unwrap();
    let Message::Text(text) = frame else {
        panic!("expected a text frame, got {frame:?}");
    };
    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body, json!({ "type": "file-added", "path": "x.md" }));

    // Inbound messages are ignored
    socket.send(Message::Text("hello".into())).await.unwrap();
    assert_eq!(broadcaster.publish(&ChangeEvent::removed("x.md")), 1);
    let next = timeout(WAIT, socket.next()).await.unwrap().unwrap().unwrap();
    assert!(matches!(next, Message::Text(_)));

    socket.close(None).await.unwrap();
    wait_for_connections(&broadcaster, 0).await;
    assert_eq!(broadcaster.publish(&ChangeEvent::changed("x.md")), 0);
}

#[tokio::test]
async fn test_close_all_ends_ws_connections() {
    let temp = TempDir::new().unwrap();
    let broadcaster = Broadcaster::default();
    let addr = spawn_server(state_for(temp.path(), broadcaster.clone())).await;

    let (mut socket, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    wait_for_connections(&broadcaster, 1).await;

    assert_eq!(broadcaster.close_all(), 1);

    // The server sends a close frame and then the stream ends
    let ended = timeout(WAIT, async {
        loop {
            match socket.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(ended.is_ok(), "socket still open after close_all");
    assert_eq!(broadcaster.connection_count(), 0);
}

#[tokio::test]
async fn test_watcher_failure_keeps_api_serving() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("docs");
    fs::create_dir_all(&root).unwrap();

    let broadcaster = Broadcaster::default();
    let state = state_for(&root, broadcaster.clone());

    // Subscribing to a root that is gone fails
    fs::remove_dir(&root).unwrap();
    let live = start_live_updates(&state, &FileWatchConfig::default()).await;
    assert!(live.is_none());

    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("index.md"), "# Index").unwrap();

    let app = router(state, &Settings::default().server);
    let response = app
        .oneshot(Request::builder().uri("/api/files").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let tree: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(tree["children"][0]["path"], "index.md");
    assert_eq!(broadcaster.connection_count(), 0);
}

#[tokio::test]
async fn test_live_updates_disabled() {
    let temp = TempDir::new().unwrap();
    let state = state_for(temp.path(), Broadcaster::default());
    let config = FileWatchConfig {
        enabled: false,
        ..FileWatchConfig::default()
    };

    assert!(start_live_updates(&state, &config).await.is_none());
}

#[tokio::test]
async fn test_live_updates_start_and_stop() {
    let temp = TempDir::new().unwrap();
    let state = state_for(temp.path(), Broadcaster::default());

    let live = start_live_updates(&state, &FileWatchConfig::default())
        .await
        .expect("watcher should start on an existing root");
    assert!(live.is_running());
    live.stop().await;
}
