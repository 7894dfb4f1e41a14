use serde_json::Value;
use shared::domain::Category;
use tracing::debug;

use crate::{
    formatter::classify,
    presenter::Presenter,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Recorded(Category),
    /// Recorded as a generic entry in the movement list.
    RecordedUnknown,
    /// Protocol chatter such as hello/ping.
    Discarded,
    /// Not a record at all; dropped without a trace in the UI.
    Rejected,
}

/// Classifies one live payload and hands it to the matching presenter
/// operation.
pub fn route(presenter: &mut Presenter, payload: &Value) -> RouteOutcome {
    let event = match classify(payload) {
        Ok(Some(event)) => event,
        Ok(None) => return RouteOutcome::Discarded,
        Err(err) => {
            debug!(%err, "router: dropping payload");
            return RouteOutcome::Rejected;
        }
    };

    let outcome = match event.category() {
        Some(category) => RouteOutcome::Recorded(category),
        None => RouteOutcome::RecordedUnknown,
    };
    presenter.record(event);
    outcome
}

pub fn route_batch(presenter: &mut Presenter, batch: &[Value]) {
    for payload in batch {
        route(presenter, payload);
    }
}

#[cfg(test)]
#[path = "tests/router_tests.rs"]
mod tests;
