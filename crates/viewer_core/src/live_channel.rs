//! Persistent push connection: connect, keep alive, decode, reconnect.
//!
//! [`ChannelMachine`] holds every transition and is free of I/O;
//! [`LiveChannel`] executes the actions it emits against a
//! [`PushConnector`].

use std::{collections::VecDeque, sync::Arc, time::Duration};

use serde_json::Value;
use shared::{domain::ChannelState, error::DecodeError};
use tokio::{
    sync::mpsc,
    time::{interval_at, Instant, Interval, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::transport::{PushConnection, PushConnector};

pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    /// `None` disables the client keep-alive frame.
    pub heartbeat_interval: Option<Duration>,
    pub reconnect_delay: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Some(DEFAULT_HEARTBEAT_INTERVAL),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelInput {
    Start,
    Opened,
    Closed,
    TransportError,
    HeartbeatFailed,
    ReconnectDue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelAction {
    Publish(ChannelState),
    Connect,
    StartHeartbeat(Duration),
    StopHeartbeat,
    DropConnection,
    ScheduleReconnect(Duration),
}

#[derive(Debug, Clone)]
pub struct ChannelMachine {
    state: ChannelState,
    config: ChannelConfig,
}

impl ChannelMachine {
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            state: ChannelState::Idle,
            config,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn handle(&mut self, input: ChannelInput) -> Vec<ChannelAction> {
        use ChannelInput as In;
        use ChannelState as S;

        match (self.state, input) {
            (S::Idle, In::Start) | (S::Disconnected, In::ReconnectDue) => {
                self.state = S::Connecting;
                vec![ChannelAction::Publish(S::Connecting), ChannelAction::Connect]
            }
            (S::Connecting, In::Opened) => {
                self.state = S::Connected;
                let mut actions = vec![ChannelAction::Publish(S::Connected)];
                if let Some(interval) = self.config.heartbeat_interval {
                    actions.push(ChannelAction::StartHeartbeat(interval));
                }
                actions
            }
            // Reconnect is driven by the close that always follows.
            (S::Connecting | S::Connected, In::TransportError) => {
                self.state = S::Error;
                vec![ChannelAction::Publish(S::Error)]
            }
            (S::Connecting | S::Connected | S::Error, In::Closed) => {
                self.state = S::Disconnected;
                vec![
                    ChannelAction::StopHeartbeat,
                    ChannelAction::DropConnection,
                    ChannelAction::Publish(S::Disconnected),
                    ChannelAction::ScheduleReconnect(self.config.reconnect_delay),
                ]
            }
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Status(ChannelState),
    /// Decoded payloads of one inbound frame, in frame order.
    Batch(Vec<Value>),
}

/// A JSON array is a batch; any other JSON value is a batch of one.
pub fn decode_frame(text: &str) -> Result<Vec<Value>, DecodeError> {
    Ok(match serde_json::from_str::<Value>(text)? {
        Value::Array(items) => items,
        single => vec![single],
    })
}

pub struct LiveChannel {
    machine: ChannelMachine,
    connector: Arc<dyn PushConnector>,
    events: mpsc::Sender<ChannelEvent>,
}

impl LiveChannel {
    pub fn new(
        config: ChannelConfig,
        connector: Arc<dyn PushConnector>,
        events: mpsc::Sender<ChannelEvent>,
    ) -> Self {
        Self {
            machine: ChannelMachine::new(config),
            connector,
            events,
        }
    }

    /// Runs until the receiving side of the event channel is dropped.
    pub async fn run(mut self) {
        let mut pending = VecDeque::from([ChannelInput::Start]);
        let mut connection: Option<Box<dyn PushConnection>> = None;
        let mut heartbeat: Option<Interval> = None;

        loop {
            let input = match pending.pop_front() {
                Some(input) => input,
                None => {
                    let Some(conn) = connection.as_mut() else {
                        return;
                    };
                    match self.pump(conn.as_mut(), &mut heartbeat).await {
                        Some(inputs) => {
                            pending.extend(inputs);
                            continue;
                        }
                        None => return,
                    }
                }
            };

            for action in self.machine.handle(input) {
                match action {
                    ChannelAction::Publish(state) => {
                        info!(state = ?state, "live channel: {}", state.label());
                        if !self.emit(ChannelEvent::Status(state)).await {
                            return;
                        }
                    }
                    ChannelAction::Connect => match self.connector.connect().await {
                        Ok(conn) => {
                            connection = Some(conn);
                            pending.push_back(ChannelInput::Opened);
                        }
                        Err(err) => {
                            warn!(error = %format!("{err:#}"), "live channel: connect failed");
                            pending.push_back(ChannelInput::TransportError);
                            pending.push_back(ChannelInput::Closed);
                        }
                    },
                    ChannelAction::StartHeartbeat(period) => {
                        let mut ticker = interval_at(Instant::now() + period, period);
                        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                        heartbeat = Some(ticker);
                    }
                    ChannelAction::StopHeartbeat => heartbeat = None,
                    ChannelAction::DropConnection => connection = None,
                    ChannelAction::ScheduleReconnect(delay) => {
                        debug!(delay_ms = delay.as_millis() as u64, "live channel: reconnect scheduled");
                        tokio::select! {
                            _ = tokio::time::sleep(delay) => pending.push_back(ChannelInput::ReconnectDue),
                            _ = self.events.closed() => return,
                        }
                    }
                }
            }
        }
    }

    /// Serves one open connection until it ends. Returns the inputs that
    /// ended it, or `None` when nobody listens any more.
    async fn pump(
        &mut self,
        connection: &mut dyn PushConnection,
        heartbeat: &mut Option<Interval>,
    ) -> Option<Vec<ChannelInput>> {
        loop {
            tokio::select! {
                frame = connection.next_frame() => match frame {
                    Some(Ok(text)) => match decode_frame(&text) {
                        Ok(batch) if batch.is_empty() => {}
                        Ok(batch) => {
                            if !self.emit(ChannelEvent::Batch(batch)).await {
                                return None;
                            }
                        }
                        Err(err) => debug!(%err, "live channel: discarding frame"),
                    },
                    Some(Err(err)) => {
                        warn!(error = %format!("{err:#}"), "live channel: transport error");
                        return Some(vec![ChannelInput::TransportError, ChannelInput::Closed]);
                    }
                    None => return Some(vec![ChannelInput::Closed]),
                },
                _ = next_tick(heartbeat) => {
                    if let Err(err) = connection.send_heartbeat().await {
                        debug!(error = %format!("{err:#}"), "live channel: keep-alive failed");
                        self.machine.handle(ChannelInput::HeartbeatFailed);
                    }
                }
                _ = self.events.closed() => return None,
            }
        }
    }

    async fn emit(&self, event: ChannelEvent) -> bool {
        self.events.send(event).await.is_ok()
    }
}

async fn next_tick(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "tests/live_channel_tests.rs"]
mod tests;
