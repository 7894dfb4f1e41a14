//! Initial history pull so the lists are not empty before the first push.

use reqwest::{Client, StatusCode};
use serde_json::Value;
use shared::{
    domain::{Category, DeviceId},
    protocol::ApiPages,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{formatter::normalize, presenter::Presenter};

pub const DEFAULT_SNAPSHOT_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered {status}")]
    Status { url: String, status: StatusCode },
    #[error("malformed body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Path segments under the API base, one per category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRoutes {
    pub movements: String,
    pub obstacles: String,
    pub sequences: String,
}

impl Default for SnapshotRoutes {
    fn default() -> Self {
        Self {
            movements: "movimientos/ultimos10".into(),
            obstacles: "obstaculos/ultimos10".into(),
            sequences: "secuencias/demo/ultimas20".into(),
        }
    }
}

impl SnapshotRoutes {
    fn path(&self, category: Category) -> &str {
        match category {
            Category::Movement => &self.movements,
            Category::Obstacle => &self.obstacles,
            Category::DemoSequence => &self.sequences,
        }
    }
}

/// Records as the API returned them, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub movements: Vec<Value>,
    pub obstacles: Vec<Value>,
    pub sequences: Vec<Value>,
}

impl Snapshot {
    /// Appends every batch oldest first, so after replay the newest record
    /// of each category sits at the head of its list.
    pub fn replay(self, presenter: &mut Presenter) {
        let batches = [
            (Category::Movement, self.movements),
            (Category::Obstacle, self.obstacles),
            (Category::DemoSequence, self.sequences),
        ];
        for (category, records) in batches {
            for record in records.into_iter().rev() {
                match normalize(category, &record) {
                    Ok(event) => presenter.record(event),
                    Err(err) => debug!(?category, %err, "snapshot: skipping record"),
                }
            }
        }
    }
}

pub struct SnapshotLoader {
    http: Client,
    api_base: String,
    routes: SnapshotRoutes,
    limit: usize,
}

impl SnapshotLoader {
    pub fn new(api_base: impl Into<String>, routes: SnapshotRoutes, limit: usize) -> Self {
        Self {
            http: Client::new(),
            api_base: api_base.into(),
            routes,
            limit,
        }
    }

    /// Fetches the three categories concurrently. A failing category comes
    /// back empty and never affects the others.
    pub async fn load_initial(&self, device_id: DeviceId) -> Snapshot {
        let (movements, obstacles, sequences) = tokio::join!(
            self.fetch_or_empty(Category::Movement, device_id),
            self.fetch_or_empty(Category::Obstacle, device_id),
            self.fetch_or_empty(Category::DemoSequence, device_id),
        );
        Snapshot {
            movements,
            obstacles,
            sequences,
        }
    }

    pub async fn fetch_category(
        &self,
        category: Category,
        device_id: DeviceId,
    ) -> Result<Vec<Value>, SnapshotError> {
        let url = self.url_for(category, device_id);
        let res = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| SnapshotError::Request {
                url: url.clone(),
                source,
            })?;
        let status = res.status();
        if !status.is_success() {
            return Err(SnapshotError::Status { url, status });
        }
        let pages: ApiPages = res
            .json()
            .await
            .map_err(|source| SnapshotError::Body { url, source })?;

        let mut records = pages.into_first_page();
        records.truncate(self.limit);
        Ok(records)
    }

    fn url_for(&self, category: Category, device_id: DeviceId) -> String {
        format!(
            "{}/{}/{device_id}",
            self.api_base.trim_end_matches('/'),
            self.routes.path(category).trim_matches('/')
        )
    }

    async fn fetch_or_empty(&self, category: Category, device_id: DeviceId) -> Vec<Value> {
        match self.fetch_category(category, device_id).await {
            Ok(records) => {
                info!(?category, count = records.len(), "snapshot: loaded");
                records
            }
            Err(err) => {
                warn!(?category, %err, "snapshot: using empty history");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/snapshot_tests.rs"]
mod tests;
