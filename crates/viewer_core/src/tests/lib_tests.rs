use super::*;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        Path, WebSocketUpgrade,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use shared::domain::{Category, ChannelState, DeviceId};
use tokio::net::TcpListener;

use crate::test_support::RecordingSurface;

fn labels(ctx: &AppContext, list: Category) -> Vec<String> {
    ctx.presenter()
        .log(list)
        .iter()
        .map(|entry| entry.label().to_string())
        .collect()
}

fn context(settings: Settings) -> (AppContext, RecordingSurface) {
    let surface = RecordingSurface::default();
    let ctx = AppContext::new(settings, Box::new(surface.clone())).expect("context");
    (ctx, surface)
}

#[test]
fn handle_applies_snapshot_status_and_batches() {
    let (mut ctx, surface) = context(Settings::default());

    ctx.handle(ViewerEvent::Snapshot(Snapshot {
        movements: vec![json!({"status_texto": "newest"}), json!({"status_texto": "oldest"})],
        obstacles: vec![json!({"obstaculo_clave": 5})],
        sequences: Vec::new(),
    }));
    ctx.handle(ViewerEvent::Channel(ChannelEvent::Status(ChannelState::Connected)));
    ctx.handle(ViewerEvent::Channel(ChannelEvent::Batch(vec![
        json!({"type": "hello"}),
        json!({}),
        json!({"secuencia_id": 4}),
    ])));

    assert_eq!(
        labels(&ctx, Category::Movement),
        vec!["{}", "newest", "oldest"]
    );
    assert_eq!(labels(&ctx, Category::Obstacle), vec!["Retrocede"]);
    assert_eq!(labels(&ctx, Category::DemoSequence), vec!["Secuencia #4"]);
    assert_eq!(ctx.presenter().status(), ChannelState::Connected);
    assert_eq!(
        *surface.statuses.lock().expect("statuses"),
        vec![ChannelState::Connected]
    );
}

#[test]
fn log_capacity_comes_from_settings() {
    let settings = Settings {
        log_capacity: 2,
        ..Settings::default()
    };
    let (mut ctx, _surface) = context(settings);
    let batch = (1..=5).map(|n| json!({"status_clave": n})).collect();
    ctx.handle(ViewerEvent::Channel(ChannelEvent::Batch(batch)));
    assert_eq!(
        labels(&ctx, Category::Movement),
        vec!["status 5", "status 4"]
    );
}

#[test]
fn socket_io_settings_need_a_valid_url() {
    let settings = Settings {
        transport: TransportKind::SocketIo,
        sio_url: "not a url".into(),
        ..Settings::default()
    };
    assert!(AppContext::new(settings, Box::new(NullSurface)).is_err());
}

async fn movements(Path(_device): Path<i64>) -> Json<Value> {
    Json(json!({"data": [[{"status_texto": "snap-2"}, {"status_texto": "snap-1"}]]}))
}

async fn obstacles(Path(_device): Path<i64>) -> StatusCode {
    StatusCode::SERVICE_UNAVAILABLE
}

async fn sequences(Path(_device): Path<i64>) -> Json<Value> {
    Json(json!({"data": [[{"nombre": "Demo"}]]}))
}

async fn live(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(live_session)
}

async fn live_session(mut socket: WebSocket) {
    let frames = [
        r#"{"type":"hello"}"#,
        r#"{"type":"obstaculo:nuevo","obstaculo_clave":99,"modo":"auto"}"#,
    ];
    for frame in frames {
        let _ = socket.send(WsMessage::Text(frame.to_string())).await;
    }
    while let Some(Ok(_)) = socket.recv().await {}
}

#[tokio::test]
async fn run_combines_snapshot_and_live_channel() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route("/api/movimientos/ultimos10/:device", get(movements))
        .route("/api/obstaculos/ultimos10/:device", get(obstacles))
        .route("/api/secuencias/demo/ultimas20/:device", get(sequences))
        .route("/ws", get(live));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let settings = Settings {
        api_url: format!("http://{addr}/api"),
        ws_url: format!("ws://{addr}/ws"),
        device_id: DeviceId(2),
        ..Settings::default()
    };
    let (mut ctx, surface) = context(settings);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let runner = tokio::spawn(async move {
        ctx.run(async {
            let _ = shutdown_rx.await;
        })
        .await;
        ctx
    });

    let ready = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let lists: Vec<Category> = surface
                .renders
                .lock()
                .expect("renders")
                .iter()
                .map(|(list, _)| *list)
                .collect();
            let connected = surface
                .statuses
                .lock()
                .expect("statuses")
                .contains(&ChannelState::Connected);
            if connected
                && lists.iter().filter(|l| **l == Category::Movement).count() >= 2
                && lists.contains(&Category::Obstacle)
                && lists.contains(&Category::DemoSequence)
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(ready.is_ok(), "viewer never rendered snapshot and live data");

    shutdown_tx.send(()).expect("shutdown");
    let ctx = runner.await.expect("runner");

    assert_eq!(labels(&ctx, Category::Movement), vec!["snap-2", "snap-1"]);
    assert_eq!(labels(&ctx, Category::Obstacle), vec!["Obstáculo 99 (auto)"]);
    assert_eq!(labels(&ctx, Category::DemoSequence), vec!["Demo"]);
    assert_eq!(ctx.presenter().status(), ChannelState::Connected);
}
