//! Document watcher: notify subscription plus event loop.

use std::path::PathBuf;

use notify::{Event, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::events::ChangeEvent;
use crate::tree::TreeIndexer;

use super::error::WatchError;
use super::tracker::{ChangeTracker, DiskSnapshot, Step};

/// Capacity of the raw notify event queue.
const RAW_EVENT_CAPACITY: usize = 1024;

/// Watches the document root and sends normalized events to a channel.
///
/// Created through [`DocumentWatcher::builder`]. The OS subscription is
/// established in `build`; [`start`](Self::start) runs the priming scan and
/// hands back a [`WatchHandle`].
pub struct DocumentWatcher {
    indexer: TreeIndexer,
    tracker: ChangeTracker,
    sender: mpsc::Sender<ChangeEvent>,
    event_rx: mpsc::Receiver<notify::Result<Event>>,
    /// The underlying file watcher. Dropping it ends the OS subscription.
    watcher: notify::RecommendedWatcher,
}

impl DocumentWatcher {
    pub fn builder() -> DocumentWatcherBuilder {
        DocumentWatcherBuilder::new()
    }

    /// Prime the known document set and start the event loop.
    ///
    /// Raw events that arrive while the priming scan runs are discarded;
    /// the scan result already reflects them. Emission begins only after
    /// this returns.
    pub async fn start(mut self) -> Result<WatchHandle, WatchError> {
        let files = self
            .indexer
            .list_files_async()
            .await
            .map_err(WatchError::InitialScan)?;
        self.tracker.prime(files);

        let mut discarded = 0usize;
        while self.event_rx.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            crate::debug_event!("watcher", "priming", "discarded {discarded} raw events");
        }

        crate::log_event!(
            "watcher",
            "monitoring",
            "{} documents under {}",
            self.tracker.known_count(),
            self.indexer.root().display()
        );

        let cancel = CancellationToken::new();
        let task = tokio::spawn(self.run(cancel.clone()));

        Ok(WatchHandle {
            cancel,
            task: Some(task),
        })
    }

    async fn run(mut self, cancel: CancellationToken) {
        loop {
            let wake = self.tracker.next_deadline().map(Instant::from_std);

            let result = tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                Some(res) = self.event_rx.recv() => match res {
                    Ok(event) => self.handle_event(event).await,
                    Err(e) => {
                        tracing::error!("[watcher] file watch error: {e}");
                        self.resync().await
                    }
                },

                _ = sleep_until(wake.unwrap_or_else(Instant::now)), if wake.is_some() => {
                    self.release_settled().await
                }
            };

            if let Err(e) = result {
                crate::debug_event!("watcher", "stopping", "{e}");
                break;
            }
        }

        // Unsubscribe before the sender goes away.
        drop(self.watcher);
        crate::log_event!("watcher", "stopped");
    }

    async fn handle_event(&mut self, event: Event) -> Result<(), WatchError> {
        crate::debug_event!("watcher", "raw", "{:?} {:?}", event.kind, event.paths);

        let disk = DiskSnapshot::capture(event.paths.iter().cloned()).await;
        for step in self.tracker.apply(&event, &disk) {
            match step {
                Step::Emit(change) => self.emit(change).await?,
                Step::ScanDir(dir) => self.scan_dir(dir).await?,
                Step::Resync => self.resync().await?,
            }
        }
        Ok(())
    }

    async fn release_settled(&mut self) -> Result<(), WatchError> {
        let settled = self.tracker.take_settled();
        if settled.is_empty() {
            return Ok(());
        }
        let paths: Vec<PathBuf> = settled.iter().map(|r| self.tracker.absolute(r)).collect();
        let disk = DiskSnapshot::capture(paths).await;
        let events = self.tracker.resolve_settled(settled, &disk);
        self.emit_all(events).await
    }

    async fn scan_dir(&mut self, dir: PathBuf) -> Result<(), WatchError> {
        let indexer = self.indexer.clone();
        let files = tokio::task::spawn_blocking(move || indexer.list_files_in(&dir))
            .await?;
        let events = self.tracker.discovered(files);
        self.emit_all(events).await
    }

    /// Rebuild the known set from disk and emit the differences.
    async fn resync(&mut self) -> Result<(), WatchError> {
        crate::log_event!("watcher", "resync");
        match self.indexer.list_files_async().await {
            Ok(files) => {
                let events = self.tracker.resync(files);
                self.emit_all(events).await
            }
            Err(e) => {
                tracing::warn!("[watcher] resync failed: {e}");
                Ok(())
            }
        }
    }

    async fn emit_all(&self, events: Vec<ChangeEvent>) -> Result<(), WatchError> {
        for event in events {
            self.emit(event).await?;
        }
        Ok(())
    }

    async fn emit(&self, event: ChangeEvent) -> Result<(), WatchError> {
        crate::debug_event!("watcher", event.kind(), "{}", event.path());
        self.sender
            .send(event)
            .await
            .map_err(|_| WatchError::Closed)
    }
}

/// Handle to a running watcher.
///
/// Dropping the handle cancels the loop; [`stop`](Self::stop) also waits
/// for it to finish.
pub struct WatchHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl WatchHandle {
    /// Stop watching.
    ///
    /// When this returns the OS subscription has been released and no
    /// further events will be sent.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("[watcher] task ended abnormally: {e}");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Builder for constructing a [`DocumentWatcher`].
pub struct DocumentWatcherBuilder {
    indexer: Option<TreeIndexer>,
    sender: Option<mpsc::Sender<ChangeEvent>>,
    debounce_ms: u64,
}

impl DocumentWatcherBuilder {
    pub fn new() -> Self {
        Self {
            indexer: None,
            sender: None,
            debounce_ms: 100,
        }
    }

    /// Indexer whose root and match rule the watcher follows.
    ///
    /// The root should be canonical so event paths can be made relative.
    pub fn indexer(mut self, indexer: TreeIndexer) -> Self {
        self.indexer = Some(indexer);
        self
    }

    /// Channel receiving normalized events.
    pub fn sender(mut self, sender: mpsc::Sender<ChangeEvent>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Set the debounce duration for change events in milliseconds.
    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Create the OS subscription.
    pub fn build(self) -> Result<DocumentWatcher, WatchError> {
        let indexer = self.indexer.ok_or(WatchError::MissingPart("indexer"))?;
        let sender = self.sender.ok_or(WatchError::MissingPart("sender"))?;

        let (tx, rx) = mpsc::channel(RAW_EVENT_CAPACITY);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.blocking_send(res);
        })?;

        let root = indexer.root().to_path_buf();
        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|source| WatchError::Subscribe {
                root: root.clone(),
                source,
            })?;
        crate::debug_event!("watcher", "watching", "{}", root.display());

        let tracker = ChangeTracker::new(root, indexer.filter().clone(), self.debounce_ms);

        Ok(DocumentWatcher {
            indexer,
            tracker,
            sender,
            event_rx: rx,
            watcher,
        })
    }
}

impl Default for DocumentWatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
