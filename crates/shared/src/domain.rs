use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(DeviceId);

/// The three telemetry streams a device reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Movement,
    Obstacle,
    DemoSequence,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Movement,
        Category::Obstacle,
        Category::DemoSequence,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelState {
    #[default]
    Idle,
    Connecting,
    Connected,
    Disconnected,
    Error,
}

impl ChannelState {
    /// Text shown by the connection status indicator.
    pub fn label(self) -> &'static str {
        match self {
            ChannelState::Idle => "Inactivo",
            ChannelState::Connecting => "Conectando…",
            ChannelState::Connected => "Conectado",
            ChannelState::Disconnected => "Desconectado",
            ChannelState::Error => "Error",
        }
    }
}
