use chrono::Local;
use serde_json::Value;
use shared::domain::{Category, ChannelState};
use tracing::debug;

use crate::{
    bounded_log::{BoundedLog, EntryTag, LogEntry},
    formatter::{label, DemoSequenceEvent, Event, MovementEvent, ObstacleEvent},
};

/// Whatever actually draws the lists and the status indicator.
pub trait RenderSurface: Send {
    fn render_list(&mut self, list: Category, log: &BoundedLog);
    fn render_status(&mut self, state: ChannelState);
}

pub struct NullSurface;

impl RenderSurface for NullSurface {
    fn render_list(&mut self, _list: Category, _log: &BoundedLog) {}

    fn render_status(&mut self, _state: ChannelState) {}
}

/// Sole owner of the three display lists.
pub struct Presenter {
    movements: BoundedLog,
    obstacles: BoundedLog,
    sequences: BoundedLog,
    status: ChannelState,
    surface: Box<dyn RenderSurface>,
}

impl Presenter {
    pub fn new(capacity: usize, surface: Box<dyn RenderSurface>) -> Self {
        Self {
            movements: BoundedLog::new(capacity),
            obstacles: BoundedLog::new(capacity),
            sequences: BoundedLog::new(capacity),
            status: ChannelState::Idle,
            surface,
        }
    }

    pub fn record(&mut self, event: Event) {
        match event {
            Event::Movement(movement) => self.record_movement(movement),
            Event::Obstacle(obstacle) => self.record_obstacle(obstacle),
            Event::DemoSequence(sequence) => self.record_demo_sequence(sequence),
            Event::Unknown { raw } => self.record_unknown(raw),
        }
    }

    pub fn record_movement(&mut self, event: MovementEvent) {
        let text = label(&Event::Movement(event));
        self.push(Category::Movement, EntryTag::Movement, text);
    }

    pub fn record_obstacle(&mut self, event: ObstacleEvent) {
        let text = label(&Event::Obstacle(event));
        self.push(Category::Obstacle, EntryTag::Obstacle, text);
    }

    pub fn record_demo_sequence(&mut self, event: DemoSequenceEvent) {
        let text = label(&Event::DemoSequence(event));
        self.push(Category::DemoSequence, EntryTag::DemoSequence, text);
    }

    /// Unrecognised payloads go to the movement list as a generic entry.
    pub fn record_unknown(&mut self, raw: Value) {
        let text = label(&Event::Unknown { raw });
        self.push(Category::Movement, EntryTag::Generic, text);
    }

    pub fn set_status(&mut self, state: ChannelState) {
        self.status = state;
        self.surface.render_status(state);
    }

    pub fn status(&self) -> ChannelState {
        self.status
    }

    pub fn log(&self, list: Category) -> &BoundedLog {
        match list {
            Category::Movement => &self.movements,
            Category::Obstacle => &self.obstacles,
            Category::DemoSequence => &self.sequences,
        }
    }

    fn push(&mut self, list: Category, tag: EntryTag, text: String) {
        debug!(?list, badge = tag.badge(), label = %text, "presenter: appending entry");
        let log = match list {
            Category::Movement => &mut self.movements,
            Category::Obstacle => &mut self.obstacles,
            Category::DemoSequence => &mut self.sequences,
        };
        log.append(LogEntry::new(tag, text, Local::now()));
        self.surface.render_list(list, log);
    }
}

#[cfg(test)]
#[path = "tests/presenter_tests.rs"]
mod tests;
