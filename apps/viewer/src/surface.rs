//! Terminal rendering of the three lists and the connection status.

use std::{collections::HashMap, io::Write};

use shared::domain::{Category, ChannelState};
use viewer_core::{BoundedLog, LogEntry, RenderSurface};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceMode {
    /// Redraw every list on each change.
    Dashboard { visible_rows: usize },
    /// Print each new entry once, as it arrives.
    Plain,
}

pub struct TerminalSurface<W: Write + Send> {
    out: W,
    mode: SurfaceMode,
    title: String,
    lists: HashMap<Category, Vec<String>>,
    status: ChannelState,
}

impl<W: Write + Send> TerminalSurface<W> {
    pub fn new(out: W, mode: SurfaceMode, title: impl Into<String>) -> Self {
        Self {
            out,
            mode,
            title: title.into(),
            lists: HashMap::new(),
            status: ChannelState::Idle,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn redraw(&mut self, visible_rows: usize) {
        let mut screen = String::from(CLEAR_SCREEN);
        screen.push_str(&format!("{}  [{}]\n", self.title, self.status.label()));
        for list in Category::ALL {
            screen.push_str(&format!("\n{}\n", list_title(list)));
            let lines = self.lists.get(&list).map(Vec::as_slice).unwrap_or_default();
            if lines.is_empty() {
                screen.push_str("  (sin eventos)\n");
            }
            for line in lines.iter().take(visible_rows) {
                screen.push_str("  ");
                screen.push_str(line);
                screen.push('\n');
            }
        }
        let _ = self.out.write_all(screen.as_bytes());
        let _ = self.out.flush();
    }
}

impl<W: Write + Send> RenderSurface for TerminalSurface<W> {
    fn render_list(&mut self, list: Category, log: &BoundedLog) {
        match self.mode {
            SurfaceMode::Plain => {
                if let Some(entry) = log.head() {
                    let _ = writeln!(self.out, "{}", format_entry(entry));
                    let _ = self.out.flush();
                }
            }
            SurfaceMode::Dashboard { visible_rows } => {
                self.lists
                    .insert(list, log.iter().map(format_entry).collect());
                self.redraw(visible_rows);
            }
        }
    }

    fn render_status(&mut self, state: ChannelState) {
        self.status = state;
        match self.mode {
            SurfaceMode::Plain => {
                let _ = writeln!(self.out, "-- {}", state.label());
                let _ = self.out.flush();
            }
            SurfaceMode::Dashboard { visible_rows } => self.redraw(visible_rows),
        }
    }
}

pub fn list_title(list: Category) -> &'static str {
    match list {
        Category::Movement => "Movimientos",
        Category::Obstacle => "Obstáculos",
        Category::DemoSequence => "Secuencias demo",
    }
}

pub fn format_entry(entry: &LogEntry) -> String {
    format!(
        "[{:<4}] {}  {}",
        entry.tag().badge(),
        entry.label(),
        entry.displayed_at().format("%H:%M:%S")
    )
}

#[cfg(test)]
#[path = "tests/surface_tests.rs"]
mod tests;
