//! Text-frame codec for Socket.IO (protocol v5) over the Engine.IO v4
//! WebSocket transport. Binary attachments are not supported.

use serde_json::Value;
use thiserror::Error;
use url::Url;

pub const PONG: &str = "3";

#[derive(Debug, Error)]
pub enum SocketIoError {
    #[error("empty frame")]
    Empty,
    #[error("unknown packet type {0:?}")]
    UnknownType(char),
    #[error("malformed packet: {0}")]
    Malformed(&'static str),
    #[error("invalid packet payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported socket.io url {0}")]
    Url(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open,
    Close,
    Ping,
    Pong,
    Noop,
    Connect { namespace: String },
    Disconnect { namespace: String },
    Event {
        namespace: String,
        name: String,
        args: Vec<Value>,
    },
    ConnectError { namespace: String, message: String },
    /// Acks and binary packets; the viewer never asks for them.
    Ignored,
}

pub fn normalize_namespace(namespace: &str) -> String {
    let trimmed = namespace.trim();
    if trimmed.is_empty() || trimmed == "/" {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Frame that joins `namespace`.
pub fn connect_frame(namespace: &str) -> String {
    match normalize_namespace(namespace).as_str() {
        "/" => "40".to_string(),
        other => format!("40{other},"),
    }
}

/// Turns the configured server address into the WebSocket transport URL.
pub fn transport_url(base: &str) -> Result<Url, SocketIoError> {
    let mut url = Url::parse(base).map_err(|_| SocketIoError::Url(base.to_string()))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        _ => return Err(SocketIoError::Url(base.to_string())),
    };
    url.set_scheme(scheme)
        .map_err(|_| SocketIoError::Url(base.to_string()))?;
    let path = format!("{}/socket.io/", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.set_query(Some("EIO=4&transport=websocket"));
    Ok(url)
}

pub fn decode(frame: &str) -> Result<Packet, SocketIoError> {
    let mut chars = frame.chars();
    let engine_type = chars.next().ok_or(SocketIoError::Empty)?;
    match engine_type {
        '0' => Ok(Packet::Open),
        '1' => Ok(Packet::Close),
        '2' => Ok(Packet::Ping),
        '3' => Ok(Packet::Pong),
        '5' | '6' => Ok(Packet::Noop),
        '4' => decode_message(chars.as_str()),
        other => Err(SocketIoError::UnknownType(other)),
    }
}

fn decode_message(body: &str) -> Result<Packet, SocketIoError> {
    let mut chars = body.chars();
    let packet_type = chars
        .next()
        .ok_or(SocketIoError::Malformed("missing socket.io packet type"))?;
    let rest = chars.as_str();

    let (namespace, rest) = match rest.strip_prefix('/') {
        Some(_) => {
            let end = rest
                .find(',')
                .ok_or(SocketIoError::Malformed("namespace without separator"))?;
            (rest[..end].to_string(), &rest[end + 1..])
        }
        None => ("/".to_string(), rest),
    };
    let payload = rest.trim_start_matches(|c: char| c.is_ascii_digit());

    match packet_type {
        '0' => Ok(Packet::Connect { namespace }),
        '1' => Ok(Packet::Disconnect { namespace }),
        '2' => {
            let Value::Array(mut args) = serde_json::from_str::<Value>(payload)? else {
                return Err(SocketIoError::Malformed("event payload is not an array"));
            };
            if args.is_empty() {
                return Err(SocketIoError::Malformed("event without a name"));
            }
            let Value::String(name) = args.remove(0) else {
                return Err(SocketIoError::Malformed("event name is not a string"));
            };
            Ok(Packet::Event {
                namespace,
                name,
                args,
            })
        }
        '4' => {
            let message = match serde_json::from_str::<Value>(payload) {
                Ok(Value::Object(map)) => map
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("connection refused")
                    .to_string(),
                Ok(Value::String(message)) => message,
                _ => payload.to_string(),
            };
            Ok(Packet::ConnectError { namespace, message })
        }
        '3' | '5' | '6' => Ok(Packet::Ignored),
        other => Err(SocketIoError::UnknownType(other)),
    }
}

#[cfg(test)]
#[path = "tests/socket_io_tests.rs"]
mod tests;
