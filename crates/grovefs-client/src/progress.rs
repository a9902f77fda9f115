//! Progress publication channel boundary.
//!
//! Indicators surface in an operator-facing cluster-status view. Publication
//! is fire-and-forget and idempotent: the reporter re-publishes the current
//! state every tick and never awaits an acknowledgement.

use async_trait::async_trait;
use parking_lot::Mutex;

/// One published indicator update.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorUpdate {
    pub id: String,
    pub message: String,
    pub fraction: f64,
}

/// Sink for aggregate progress indicators.
#[async_trait]
pub trait ProgressChannel: Send + Sync {
    /// Publish or refresh the indicator `id`. `fraction` is in `[0.0, 1.0]`.
    async fn update(&self, id: &str, message: &str, fraction: f64);

    /// Remove the indicator `id` from the status view.
    async fn complete(&self, id: &str);
}

/// Channel that writes indicator updates to the tracing log.
///
/// Used by the admin tooling, and wherever no status view transport is wired.
#[derive(Debug, Default, Clone)]
pub struct LogProgressChannel;

impl LogProgressChannel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProgressChannel for LogProgressChannel {
    async fn update(&self, id: &str, message: &str, fraction: f64) {
        tracing::info!(
            indicator = id,
            fraction = format_args!("{:.3}", fraction),
            "{}",
            message
        );
    }

    async fn complete(&self, id: &str) {
        tracing::info!(indicator = id, "Progress indicator removed");
    }
}

/// In-memory channel capturing every update, for tests and introspection.
#[derive(Debug, Default)]
pub struct RecordingProgressChannel {
    updates: Mutex<Vec<IndicatorUpdate>>,
    completed: Mutex<Vec<String>>,
}

impl RecordingProgressChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// All updates seen so far, in publication order.
    pub fn updates(&self) -> Vec<IndicatorUpdate> {
        self.updates.lock().clone()
    }

    /// The most recent update per live (not completed) indicator id.
    pub fn live(&self) -> Vec<IndicatorUpdate> {
        let completed = self.completed.lock();
        let mut latest: Vec<IndicatorUpdate> = Vec::new();
        for u in self.updates.lock().iter() {
            if completed.contains(&u.id) {
                continue;
            }
            match latest.iter_mut().find(|l| l.id == u.id) {
                Some(l) => *l = u.clone(),
                None => latest.push(u.clone()),
            }
        }
        latest
    }

    /// Ids that have been completed (retired).
    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().clone()
    }

    /// Distinct indicator ids ever published.
    pub fn indicator_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for u in self.updates.lock().iter() {
            if !ids.contains(&u.id) {
                ids.push(u.id.clone());
            }
        }
        ids
    }
}

#[async_trait]
impl ProgressChannel for RecordingProgressChannel {
    async fn update(&self, id: &str, message: &str, fraction: f64) {
        self.updates.lock().push(IndicatorUpdate {
            id: id.to_string(),
            message: message.to_string(),
            fraction,
        });
    }

    async fn complete(&self, id: &str) {
        self.completed.lock().push(id.to_string());
    }
}
