//! Folder watching and registration: one queue, one worker, one known-set.
//!
//! The watcher callback and the bootstrap scan both push plain paths onto an
//! unbounded channel. A single `RegistrationWorker` drains it, owns the
//! known-filenames set, and performs every registration, so duplicate
//! sightings of a file (spurious OS events, scan overlapping a live event)
//! collapse without any locking.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::{EventKind, ModifyKind};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use sqlcourier_core::{CourierError, Result, Task};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::engine::SchedulerCore;

/// File extension a task file must carry (case-sensitive).
pub const TASK_EXTENSION: &str = "sql";

/// Forwards create/rename events for one directory onto the task queue.
///
/// Keep the returned value alive for as long as events are wanted; dropping
/// it unwatches the directory.
pub struct TaskWatcher {
    _inner: RecommendedWatcher,
}

impl TaskWatcher {
    /// Start watching `dir` (non-recursive). Arrival paths land on `queue`.
    pub fn start(dir: &Path, queue: UnboundedSender<PathBuf>) -> Result<Self> {
        let mut inner = notify::recommended_watcher(move |event: notify::Result<Event>| {
            match event {
                Ok(event) if is_arrival(&event.kind) => {
                    for path in event.paths {
                        // A closed receiver means shutdown, nothing to do.
                        let _ = queue.send(path);
                    }
                }
                Ok(_) => {}
                Err(e) => warn!("⚠️ Watch event error: {e}"),
            }
        })
        .map_err(|e| CourierError::Watch(format!("Failed to create watcher: {e}")))?;

        inner
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| CourierError::Watch(format!("Failed to watch {}: {e}", dir.display())))?;
        info!("👀 Watching {} for new task files", dir.display());
        Ok(Self { _inner: inner })
    }
}

/// New files show up as creations or renames into place; data writes and
/// removals are noise here.
fn is_arrival(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(_)))
}

/// Push every existing task file in `dir` onto the queue. Returns how many
/// were found.
pub fn scan_existing(dir: &Path, queue: &UnboundedSender<PathBuf>) -> Result<usize> {
    let mut found = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == TASK_EXTENSION) {
            let _ = queue.send(path);
            found += 1;
        }
    }
    info!("📂 Found {found} task file(s) in {}", dir.display());
    Ok(found)
}

/// Single consumer of the task queue.
pub struct RegistrationWorker {
    core: Arc<SchedulerCore>,
    known: HashSet<OsString>,
}

impl RegistrationWorker {
    pub fn new(core: Arc<SchedulerCore>) -> Self {
        Self {
            core,
            known: HashSet::new(),
        }
    }

    /// Drain the queue until every sender is gone.
    pub async fn run(mut self, mut queue: UnboundedReceiver<PathBuf>) {
        while let Some(path) = queue.recv().await {
            self.handle_path(&path).await;
        }
    }

    /// Process one sighting. Returns true when a registration happened.
    ///
    /// A failed registration (unreadable file, invalid schedule, empty
    /// query) is logged and the file stays ignored; it never stops the
    /// worker or other files.
    pub async fn handle_path(&mut self, path: &Path) -> bool {
        if !path.extension().is_some_and(|ext| ext == TASK_EXTENSION) {
            return false;
        }
        // Rename-away and removal events name files that no longer exist.
        // Skipped without remembering the name, so the file can still
        // register if it shows up later.
        if !path.exists() {
            return false;
        }
        let Some(name) = path.file_name() else {
            return false;
        };
        if self.known.contains(name) {
            debug!("Already known, skipping {}", path.display());
            return false;
        }
        self.known.insert(name.to_os_string());

        match self.register(path).await {
            Ok(()) => true,
            Err(e) => {
                warn!("⚠️ Ignoring {}: {e}", path.display());
                false
            }
        }
    }

    async fn register(&self, path: &Path) -> Result<()> {
        let text = tokio::fs::read_to_string(path).await?;
        let task = Task::parse(path, &text);
        self.core.schedule_task(task)
    }
}
