use std::{future::Future, sync::Arc};

use anyhow::Result;
use tokio::sync::{mpsc, oneshot};
use tracing::info;

pub mod bounded_log;
pub mod config;
pub mod formatter;
pub mod live_channel;
pub mod presenter;
pub mod router;
pub mod snapshot;
pub mod socket_io;
pub mod transport;

pub use bounded_log::{BoundedLog, EntryTag, LogEntry};
pub use config::{load_settings_from, Settings, TransportKind};
pub use live_channel::{ChannelConfig, ChannelEvent, LiveChannel};
pub use presenter::{NullSurface, Presenter, RenderSurface};
pub use snapshot::{Snapshot, SnapshotLoader};

use crate::{
    router::route_batch,
    transport::{PushConnector, SocketIoConnector, WebSocketConnector},
};

const CHANNEL_EVENT_BUFFER: usize = 256;

#[derive(Debug)]
pub enum ViewerEvent {
    Snapshot(Snapshot),
    Channel(ChannelEvent),
}

/// Everything the viewer needs, built once at startup. The presenter is
/// only ever touched from [`AppContext::handle`].
pub struct AppContext {
    settings: Settings,
    presenter: Presenter,
    loader: Arc<SnapshotLoader>,
    connector: Arc<dyn PushConnector>,
}

impl AppContext {
    pub fn new(settings: Settings, surface: Box<dyn RenderSurface>) -> Result<Self> {
        let connector: Arc<dyn PushConnector> = match settings.transport {
            TransportKind::WebSocket => Arc::new(WebSocketConnector::new(settings.ws_url.clone())),
            TransportKind::SocketIo => Arc::new(SocketIoConnector::new(
                &settings.sio_url,
                &settings.sio_namespace,
                settings.sio_event.clone(),
            )?),
        };
        Ok(Self::with_connector(settings, surface, connector))
    }

    pub fn with_connector(
        settings: Settings,
        surface: Box<dyn RenderSurface>,
        connector: Arc<dyn PushConnector>,
    ) -> Self {
        let loader = SnapshotLoader::new(
            settings.api_url.clone(),
            settings.snapshot_routes(),
            settings.snapshot_limit,
        );
        Self {
            presenter: Presenter::new(settings.log_capacity, surface),
            loader: Arc::new(loader),
            connector,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    pub fn handle(&mut self, event: ViewerEvent) {
        match event {
            ViewerEvent::Snapshot(snapshot) => snapshot.replay(&mut self.presenter),
            ViewerEvent::Channel(ChannelEvent::Status(state)) => self.presenter.set_status(state),
            ViewerEvent::Channel(ChannelEvent::Batch(batch)) => {
                route_batch(&mut self.presenter, &batch)
            }
        }
    }

    /// Loads the snapshot and follows the live channel at the same time,
    /// applying whatever arrives in arrival order until `shutdown` resolves.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) {
        info!(
            device_id = %self.settings.device_id,
            api = %self.settings.api_url,
            transport = ?self.settings.transport,
            "viewer: starting"
        );

        let (snapshot_tx, mut snapshot_rx) = oneshot::channel();
        let loader = Arc::clone(&self.loader);
        let device_id = self.settings.device_id;
        let snapshot_task = tokio::spawn(async move {
            let _ = snapshot_tx.send(loader.load_initial(device_id).await);
        });

        let (channel_tx, mut channel_rx) = mpsc::channel(CHANNEL_EVENT_BUFFER);
        let channel = LiveChannel::new(
            self.settings.channel_config(),
            Arc::clone(&self.connector),
            channel_tx,
        );
        let channel_task = tokio::spawn(channel.run());

        tokio::pin!(shutdown);
        let mut snapshot_pending = true;
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                snapshot = &mut snapshot_rx, if snapshot_pending => {
                    snapshot_pending = false;
                    if let Ok(snapshot) = snapshot {
                        self.handle(ViewerEvent::Snapshot(snapshot));
                    }
                }
                event = channel_rx.recv() => match event {
                    Some(event) => self.handle(ViewerEvent::Channel(event)),
                    None => break,
                },
            }
        }

        snapshot_task.abort();
        channel_task.abort();
        info!("viewer: stopped");
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
