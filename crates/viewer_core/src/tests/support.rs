use std::sync::{Arc, Mutex};

use shared::domain::{Category, ChannelState};

use crate::{bounded_log::BoundedLog, presenter::RenderSurface};

/// Surface that remembers every render call; clones share the same record.
#[derive(Clone, Default)]
pub(crate) struct RecordingSurface {
    pub(crate) renders: Arc<Mutex<Vec<(Category, Vec<String>)>>>,
    pub(crate) statuses: Arc<Mutex<Vec<ChannelState>>>,
}

impl RenderSurface for RecordingSurface {
    fn render_list(&mut self, list: Category, log: &BoundedLog) {
        let labels = log.iter().map(|entry| entry.label().to_string()).collect();
        self.renders.lock().expect("renders").push((list, labels));
    }

    fn render_status(&mut self, state: ChannelState) {
        self.statuses.lock().expect("statuses").push(state);
    }
}
