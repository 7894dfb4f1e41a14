use super::*;

use std::{
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn no_env(_: &str) -> Option<String> {
    None
}

fn env_from(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
    move |key: &str| {
        pairs
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.to_string())
    }
}

fn temp_config(contents: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("telemetry_viewer_config_test_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("viewer.toml");
    fs::write(&path, contents).expect("write config");
    path
}

#[test]
fn missing_file_and_env_yield_defaults() {
    let settings = load_settings_from(Path::new("/nonexistent/viewer.toml"), no_env);
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.log_capacity, 50);
    assert_eq!(settings.reconnect_delay, Duration::from_millis(2500));
    assert_eq!(settings.heartbeat_interval, Duration::from_secs(25));
    assert_eq!(settings.sio_event, "broadcast");
}

#[test]
fn file_values_apply_and_env_wins() {
    let path = temp_config(
        r#"
api = "http://robot.local/api"
device_id = 3
snapshot_limit = 5
transport = "socketio"
"#,
    );
    let settings = load_settings_from(
        &path,
        env_from(&[("DEVICE_ID", "9"), ("APP__API", "http://override/api"), ("API", "ignored")]),
    );

    assert_eq!(settings.api_url, "http://override/api");
    assert_eq!(settings.device_id, DeviceId(9));
    assert_eq!(settings.snapshot_limit, 5);
    assert_eq!(settings.transport, TransportKind::SocketIo);

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn unparseable_numbers_keep_defaults() {
    let settings = load_settings_from(
        Path::new("/nonexistent/viewer.toml"),
        env_from(&[("DEVICE_ID", "abc"), ("RECONNECT_MS", "-1"), ("TRANSPORT", "carrier-pigeon")]),
    );
    assert_eq!(settings.device_id, DeviceId(1));
    assert_eq!(settings.reconnect_delay, DEFAULT_RECONNECT_DELAY);
    assert_eq!(settings.transport, TransportKind::WebSocket);
}

#[test]
fn obstacle_path_feeds_snapshot_routes() {
    let settings = load_settings_from(
        Path::new("/nonexistent/viewer.toml"),
        env_from(&[("OBSTACLE_PATH", "obstaculo/ultimos10")]),
    );
    let routes = settings.snapshot_routes();
    assert_eq!(routes.obstacles, "obstaculo/ultimos10");
    assert_eq!(routes.movements, "movimientos/ultimos10");
}

#[test]
fn heartbeat_only_on_raw_websocket() {
    let mut settings = Settings::default();
    assert_eq!(
        settings.channel_config().heartbeat_interval,
        Some(DEFAULT_HEARTBEAT_INTERVAL)
    );
    settings.transport = TransportKind::SocketIo;
    assert_eq!(settings.channel_config().heartbeat_interval, None);
    assert_eq!(settings.channel_config().reconnect_delay, DEFAULT_RECONNECT_DELAY);
}

#[test]
fn transport_names() {
    assert_eq!("WebSocket".parse::<TransportKind>(), Ok(TransportKind::WebSocket));
    assert_eq!("socket.io".parse::<TransportKind>(), Ok(TransportKind::SocketIo));
    assert!("smoke".parse::<TransportKind>().is_err());
}
