//! Watcher-to-broadcaster wiring.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::broadcast::{Broadcaster, spawn_pump};
use crate::config::FileWatchConfig;
use crate::tree::TreeIndexer;
use crate::watcher::{DocumentWatcher, WatchError, WatchHandle};

/// Capacity of the channel between the watcher and the pump.
const EVENT_CAPACITY: usize = 1024;

/// A running watcher and the pump feeding its events to clients.
pub struct LiveUpdates {
    watch: WatchHandle,
    pump: JoinHandle<()>,
}

impl LiveUpdates {
    /// Start watching `indexer`'s root and publish changes on `broadcaster`.
    ///
    /// The indexer root must be canonical.
    pub async fn start(
        indexer: &TreeIndexer,
        broadcaster: &Broadcaster,
        config: &FileWatchConfig,
    ) -> Result<Self, WatchError> {
        let (tx, rx) = mpsc::channel(EVENT_CAPACITY);

        let watch = DocumentWatcher::builder()
            .indexer(indexer.clone())
            .sender(tx)
            .debounce_ms(config.debounce_ms)
            .build()?
            .start()
            .await?;
        let pump = spawn_pump(rx, broadcaster.clone());

        crate::log_event!(
            "watcher",
            "started",
            "debounce: {}ms",
            config.debounce_ms
        );
        Ok(Self { watch, pump })
    }

    pub fn is_running(&self) -> bool {
        self.watch.is_running()
    }

    /// Stop the watcher and wait for the pump to flush what it already received.
    pub async fn stop(self) {
        self.watch.stop().await;
        if let Err(e) = self.pump.await {
            tracing::warn!("[broadcast] pump ended abnormally: {e}");
        }
    }
}
