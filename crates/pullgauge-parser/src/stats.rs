use crate::event::{PRINT_MARKER, StatusEvent, StreamFormat};
use std::collections::HashSet;
use std::sync::mpsc::Receiver;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

/// Capacity of the producer→consumer event queue. Senders block when the
/// consumer falls this far behind.
pub const QUEUE_CAPACITY: usize = 20;

/// Running statistics for one docker pull/push invocation.
///
/// All state lives behind a single lock: the consumer loop is the only
/// mutator, but `set_format` and `render` may be called from the producer
/// side while the loop is mid-update.
#[derive(Debug, Default)]
pub struct ProcessingStats {
    inner: RwLock<StatsInner>,
}

#[derive(Debug, Default)]
struct StatsInner {
    last: StatusEvent,
    format: StreamFormat,

    // Common
    already_exists: Vec<String>,

    // Pull
    pulling_fs_layer: Vec<String>,
    verifying_checksum: Vec<String>,
    download_complete: Vec<String>,
    pull_complete: Vec<String>,

    // Push
    preparing: Vec<String>,
    waiting: Vec<String>,
    pushed: Vec<String>,

    // Membership
    in_progress: HashSet<String>,
    seen: HashSet<String>,
}

impl StatsInner {
    fn add_layer(&mut self, layer: &str) {
        if !self.seen.contains(layer) {
            self.seen.insert(layer.to_string());
        }
    }

    fn add_layer_in_progress(&mut self, layer: &str) {
        self.add_layer(layer);
        if !self.in_progress.contains(layer) {
            self.in_progress.insert(layer.to_string());
        }
    }

    fn remove_layer_in_progress(&mut self, layer: &str) {
        self.in_progress.remove(layer);
    }
}

/// Point-in-time copy of the counters, captured under one lock acquisition
/// so a concurrent mutation can never produce a torn view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub last_layer: String,
    pub last_status: String,
    pub format: StreamFormat,
    pub pulling_fs_layer: usize,
    pub verifying_checksum: usize,
    pub download_complete: usize,
    pub pull_complete: usize,
    pub preparing: usize,
    pub waiting: usize,
    pub pushed: usize,
    pub already_exists: usize,
    pub in_progress: usize,
    pub total: usize,
}

impl StatsSnapshot {
    /// One-line summary in the field order matching the snapshot's format.
    pub fn summary_line(&self) -> String {
        match self.format {
            StreamFormat::Pull => format!(
                "Last:[{}: {}]; Pulling FS Layer:{}; Verifying Complete:{}; Download Complete:{}; Pull Complete:{}; InProgress:{}; Total:{}",
                self.last_layer,
                self.last_status,
                self.pulling_fs_layer,
                self.verifying_checksum,
                self.download_complete,
                self.pull_complete,
                self.in_progress,
                self.total,
            ),
            StreamFormat::Push => format!(
                "Last:[{}: {}]; Preparing:{}; Waiting:{}; Already Exists:{}; Pushed:{}; InProgress:{}; Total:{}",
                self.last_layer,
                self.last_status,
                self.preparing,
                self.waiting,
                self.already_exists,
                self.pushed,
                self.in_progress,
                self.total,
            ),
        }
    }
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch which counter set snapshots report. Push is terminal: once a
    /// stream has been identified as a push, later pull-like lines cannot
    /// switch it back.
    pub fn set_format(&self, format: StreamFormat) {
        let mut inner = self.write();
        if inner.format == StreamFormat::Push {
            return;
        }
        inner.format = format;
    }

    /// Drain the queue until every sender has hung up, rendering one
    /// snapshot per recognized event. Takes the receiver by value: there is
    /// exactly one consumer.
    pub fn run(&self, queue: Receiver<StatusEvent>) {
        for event in queue {
            self.apply(&event);
        }
    }

    fn apply(&self, event: &StatusEvent) {
        let recognized = {
            let mut inner = self.write();

            if !event.layer_name.is_empty() {
                inner.last = event.clone();
            }

            let layer = event.layer_name.as_str();
            match event.status.as_str() {
                // Internal
                PRINT_MARKER => true,
                // Push
                "Preparing" => {
                    inner.preparing.push(layer.to_string());
                    inner.add_layer_in_progress(layer);
                    true
                }
                "Waiting" => {
                    inner.waiting.push(layer.to_string());
                    inner.add_layer(layer);
                    true
                }
                "Pushed" => {
                    inner.pushed.push(layer.to_string());
                    inner.add_layer(layer);
                    inner.remove_layer_in_progress(layer);
                    true
                }
                "Layer already exists" => {
                    inner.already_exists.push(layer.to_string());
                    inner.add_layer(layer);
                    inner.remove_layer_in_progress(layer);
                    true
                }
                // Pull
                "Pulling fs layer" => {
                    inner.pulling_fs_layer.push(layer.to_string());
                    inner.add_layer_in_progress(layer);
                    true
                }
                "Verifying Checksum" => {
                    inner.verifying_checksum.push(layer.to_string());
                    inner.add_layer(layer);
                    true
                }
                "Download complete" => {
                    inner.download_complete.push(layer.to_string());
                    inner.add_layer(layer);
                    true
                }
                "Pull complete" => {
                    inner.pull_complete.push(layer.to_string());
                    inner.add_layer(layer);
                    inner.remove_layer_in_progress(layer);
                    true
                }
                // Common
                "Already Exists" => {
                    inner.already_exists.push(layer.to_string());
                    inner.add_layer(layer);
                    inner.remove_layer_in_progress(layer);
                    true
                }
                _ => false,
            }
        };

        if recognized {
            self.render();
        }
    }

    /// Capture a consistent copy of every reported field.
    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = self.read();

        StatsSnapshot {
            last_layer: inner.last.layer_name.clone(),
            last_status: inner.last.status.clone(),
            format: inner.format,
            pulling_fs_layer: inner.pulling_fs_layer.len(),
            verifying_checksum: inner.verifying_checksum.len(),
            download_complete: inner.download_complete.len(),
            pull_complete: inner.pull_complete.len(),
            preparing: inner.preparing.len(),
            waiting: inner.waiting.len(),
            pushed: inner.pushed.len(),
            already_exists: inner.already_exists.len(),
            in_progress: inner.in_progress.len(),
            total: inner.seen.len(),
        }
    }

    /// Log the current snapshot as a single INFO line.
    pub fn render(&self) {
        let snapshot = self.snapshot();
        info!("{}", snapshot.summary_line());
    }

    fn read(&self) -> RwLockReadGuard<'_, StatsInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StatsInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(stats: &ProcessingStats, layer: &str, status: &str) {
        stats.apply(&StatusEvent::new(layer, status));
    }

    #[test]
    fn test_pull_lifecycle_clears_in_progress() {
        let stats = ProcessingStats::new();

        apply(&stats, "L", "Pulling fs layer");
        assert_eq!(stats.snapshot().in_progress, 1);

        apply(&stats, "L", "Pull complete");

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.pulling_fs_layer, 1);
        assert_eq!(snapshot.pull_complete, 1);
        assert_eq!(snapshot.in_progress, 0);
        assert_eq!(snapshot.total, 1);
    }

    #[test]
    fn test_push_lifecycle() {
        let stats = ProcessingStats::new();

        apply(&stats, "b2", "Preparing");
        assert_eq!(stats.snapshot().in_progress, 1);

        apply(&stats, "b2", "Pushed");

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.preparing, 1);
        assert_eq!(snapshot.pushed, 1);
        assert_eq!(snapshot.in_progress, 0);
        assert_eq!(snapshot.total, 1);
    }

    #[test]
    fn test_waiting_does_not_mark_in_progress() {
        let stats = ProcessingStats::new();

        apply(&stats, "w1", "Waiting");

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.waiting, 1);
        assert_eq!(snapshot.in_progress, 0);
        assert_eq!(snapshot.total, 1);
    }

    #[test]
    fn test_duplicate_status_appends_but_sets_stay_singleton() {
        let stats = ProcessingStats::new();

        apply(&stats, "L", "Pulling fs layer");
        apply(&stats, "L", "Pulling fs layer");

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.pulling_fs_layer, 2);
        assert_eq!(snapshot.in_progress, 1);
        assert_eq!(snapshot.total, 1);

        let inner = stats.read();
        assert_eq!(inner.pulling_fs_layer, vec!["L", "L"]);
        assert_eq!(inner.seen.len(), 1);
    }

    #[test]
    fn test_seen_counts_distinct_layers_across_categories() {
        let stats = ProcessingStats::new();

        apply(&stats, "a", "Pulling fs layer");
        apply(&stats, "b", "Verifying Checksum");
        apply(&stats, "c", "Download complete");
        apply(&stats, "a", "Pull complete");
        apply(&stats, "b", "Already Exists");

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total, 3);
        assert_eq!(snapshot.in_progress, 0);
    }

    #[test]
    fn test_already_exists_variants_share_a_category() {
        let stats = ProcessingStats::new();

        apply(&stats, "a", "Already Exists");
        apply(&stats, "b", "Layer already exists");

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.already_exists, 2);
        assert_eq!(snapshot.total, 2);
    }

    #[test]
    fn test_unrecognized_status_mutates_nothing_but_updates_last() {
        let stats = ProcessingStats::new();

        apply(&stats, "x", "Downloading [====>   ] 12MB/30MB");

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total, 0);
        assert_eq!(snapshot.in_progress, 0);
        assert_eq!(snapshot.last_layer, "x");
        assert_eq!(snapshot.last_status, "Downloading [====>   ] 12MB/30MB");
    }

    #[test]
    fn test_print_marker_leaves_state_and_last_untouched() {
        let stats = ProcessingStats::new();

        apply(&stats, "a", "Pulling fs layer");
        stats.apply(&StatusEvent::print_marker());

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.last_layer, "a");
        assert_eq!(snapshot.last_status, "Pulling fs layer");
        assert_eq!(snapshot.total, 1);
    }

    #[test]
    fn test_format_is_monotonic() {
        let stats = ProcessingStats::new();
        assert_eq!(stats.snapshot().format, StreamFormat::Pull);

        stats.set_format(StreamFormat::Push);
        assert_eq!(stats.snapshot().format, StreamFormat::Push);

        stats.set_format(StreamFormat::Pull);
        assert_eq!(stats.snapshot().format, StreamFormat::Push);
    }

    #[test]
    fn test_pull_summary_line_field_order() {
        let stats = ProcessingStats::new();

        apply(&stats, "a1", "Pulling fs layer");
        apply(&stats, "a1", "Verifying Checksum");

        assert_eq!(
            stats.snapshot().summary_line(),
            "Last:[a1: Verifying Checksum]; Pulling FS Layer:1; Verifying Complete:1; Download Complete:0; Pull Complete:0; InProgress:1; Total:1"
        );
    }

    #[test]
    fn test_push_summary_line_field_order() {
        let stats = ProcessingStats::new();
        stats.set_format(StreamFormat::Push);

        apply(&stats, "b2", "Preparing");
        apply(&stats, "b2", "Pushed");

        assert_eq!(
            stats.snapshot().summary_line(),
            "Last:[b2: Pushed]; Preparing:1; Waiting:0; Already Exists:0; Pushed:1; InProgress:0; Total:1"
        );
    }

    #[test]
    fn test_empty_snapshot_renders_empty_last() {
        let stats = ProcessingStats::new();

        assert_eq!(
            stats.snapshot().summary_line(),
            "Last:[: ]; Pulling FS Layer:0; Verifying Complete:0; Download Complete:0; Pull Complete:0; InProgress:0; Total:0"
        );
    }
}
