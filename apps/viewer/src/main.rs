use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use shared::domain::DeviceId;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use viewer_core::{
    config::{load_settings_from, DEFAULT_CONFIG_FILE},
    AppContext, Settings, TransportKind,
};

mod surface;

use surface::{SurfaceMode, TerminalSurface};

#[derive(Parser, Debug)]
#[command(about = "Live viewer for device movement, obstacle and demo-sequence events")]
struct Args {
    /// Settings file (flat key = value TOML).
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[arg(long)]
    api: Option<String>,
    #[arg(long)]
    ws: Option<String>,
    #[arg(long)]
    sio: Option<String>,
    #[arg(long)]
    device_id: Option<i64>,
    /// websocket | socketio
    #[arg(long)]
    transport: Option<TransportKind>,
    /// Print entries as they arrive instead of redrawing the lists.
    #[arg(long)]
    plain: bool,
    /// Rows shown per list in dashboard mode.
    #[arg(long, default_value_t = 10)]
    rows: usize,
}

impl Args {
    fn apply_to(&self, mut settings: Settings) -> Settings {
        if let Some(v) = &self.api {
            settings.api_url = v.clone();
        }
        if let Some(v) = &self.ws {
            settings.ws_url = v.clone();
        }
        if let Some(v) = &self.sio {
            settings.sio_url = v.clone();
        }
        if let Some(v) = self.device_id {
            settings.device_id = DeviceId(v);
        }
        if let Some(v) = self.transport {
            settings.transport = v;
        }
        settings
    }

    fn surface_mode(&self) -> SurfaceMode {
        if self.plain {
            SurfaceMode::Plain
        } else {
            SurfaceMode::Dashboard {
                visible_rows: self.rows.max(1),
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = args.apply_to(load_settings_from(&args.config, |key| {
        std::env::var(key).ok()
    }));

    let title = format!("Monitor en tiempo real · dispositivo {}", settings.device_id);
    let surface = TerminalSurface::new(std::io::stdout(), args.surface_mode(), title);
    let mut ctx = AppContext::new(settings, Box::new(surface))?;

    ctx.run(async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(%err, "failed to listen for ctrl-c; stopping");
        }
    })
    .await;

    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
