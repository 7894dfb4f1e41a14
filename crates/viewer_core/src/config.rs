use std::{collections::HashMap, fs, path::Path, str::FromStr, time::Duration};

use shared::domain::DeviceId;

use crate::{
    bounded_log::DEFAULT_LOG_CAPACITY,
    live_channel::{ChannelConfig, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_RECONNECT_DELAY},
    snapshot::{SnapshotRoutes, DEFAULT_SNAPSHOT_LIMIT},
};

pub const DEFAULT_CONFIG_FILE: &str = "viewer.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    WebSocket,
    SocketIo,
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ws" | "websocket" => Ok(Self::WebSocket),
            "sio" | "socketio" | "socket.io" => Ok(Self::SocketIo),
            other => Err(format!("unknown transport '{other}' (expected websocket or socketio)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub ws_url: String,
    pub sio_url: String,
    pub sio_namespace: String,
    pub sio_event: String,
    pub device_id: DeviceId,
    pub transport: TransportKind,
    pub snapshot_limit: usize,
    pub obstacle_path: String,
    pub log_capacity: usize,
    pub heartbeat_interval: Duration,
    pub reconnect_delay: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5500/api".into(),
            ws_url: "ws://localhost:5501/ws".into(),
            sio_url: "http://localhost:5500".into(),
            sio_namespace: "/".into(),
            sio_event: "broadcast".into(),
            device_id: DeviceId(1),
            transport: TransportKind::WebSocket,
            snapshot_limit: DEFAULT_SNAPSHOT_LIMIT,
            obstacle_path: SnapshotRoutes::default().obstacles,
            log_capacity: DEFAULT_LOG_CAPACITY,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

impl Settings {
    pub fn snapshot_routes(&self) -> SnapshotRoutes {
        SnapshotRoutes {
            obstacles: self.obstacle_path.clone(),
            ..SnapshotRoutes::default()
        }
    }

    /// The keep-alive frame only exists on the raw WebSocket transport.
    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            heartbeat_interval: match self.transport {
                TransportKind::WebSocket => Some(self.heartbeat_interval),
                TransportKind::SocketIo => None,
            },
            reconnect_delay: self.reconnect_delay,
        }
    }
}

/// Defaults, then the toml file at `path` (usually `viewer.toml`), then
/// `env`.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            apply(&mut settings, |key| file_cfg.get(key).map(toml_text));
        }
    }

    apply(&mut settings, |key| {
        let upper = key.to_ascii_uppercase();
        env(&format!("APP__{upper}")).or_else(|| env(&upper))
    });

    settings
}

fn toml_text(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Unparseable values leave the current setting untouched.
fn apply(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("api") {
        settings.api_url = v;
    }
    if let Some(v) = lookup("ws") {
        settings.ws_url = v;
    }
    if let Some(v) = lookup("sio") {
        settings.sio_url = v;
    }
    if let Some(v) = lookup("sio_namespace") {
        settings.sio_namespace = v;
    }
    if let Some(v) = lookup("sio_event") {
        settings.sio_event = v;
    }
    if let Some(v) = lookup("obstacle_path") {
        settings.obstacle_path = v;
    }
    if let Some(v) = parsed::<i64>(&lookup, "device_id") {
        settings.device_id = DeviceId(v);
    }
    if let Some(v) = parsed::<TransportKind>(&lookup, "transport") {
        settings.transport = v;
    }
    if let Some(v) = parsed::<usize>(&lookup, "snapshot_limit") {
        settings.snapshot_limit = v;
    }
    if let Some(v) = parsed::<usize>(&lookup, "log_capacity") {
        settings.log_capacity = v;
    }
    if let Some(v) = parsed::<u64>(&lookup, "heartbeat_ms") {
        settings.heartbeat_interval = Duration::from_millis(v);
    }
    if let Some(v) = parsed::<u64>(&lookup, "reconnect_ms") {
        settings.reconnect_delay = Duration::from_millis(v);
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
