//! In-memory job registry: at most one armed trigger per source file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sqlcourier_core::Task;
use tokio::task::JoinHandle;

/// Opaque handle to an armed trigger loop. Retiring it stops all future
/// fires; an execution already handed off keeps running to completion.
#[derive(Debug)]
pub struct TriggerHandle {
    timer: JoinHandle<()>,
}

impl TriggerHandle {
    pub fn new(timer: JoinHandle<()>) -> Self {
        Self { timer }
    }

    /// Stop the trigger loop.
    pub fn retire(self) {
        self.timer.abort();
    }

    /// Whether the underlying loop has already exited.
    pub fn is_finished(&self) -> bool {
        self.timer.is_finished()
    }
}

/// The live binding between a task and its armed trigger.
#[derive(Debug)]
pub struct JobRegistration {
    pub task: Task,
    handle: TriggerHandle,
}

/// Tagged registration result. A `Replaced` trigger must be retired by the
/// caller before being discarded, or its timer loop leaks.
#[derive(Debug)]
#[must_use = "a replaced trigger must be retired"]
pub enum RegistrationOutcome {
    Inserted,
    Replaced(TriggerHandle),
}

/// Maps source paths to their single live registration.
///
/// Replacement is one `HashMap::insert` under the lock, so a concurrent
/// reader never observes a half-swapped entry.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<PathBuf, JobRegistration>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or atomically replace the registration for `task.source_id`.
    pub fn register(&self, task: Task, handle: TriggerHandle) -> RegistrationOutcome {
        let source_id = task.source_id.clone();
        let mut jobs = self.jobs.lock().unwrap();
        match jobs.insert(source_id, JobRegistration { task, handle }) {
            None => RegistrationOutcome::Inserted,
            Some(prev) => RegistrationOutcome::Replaced(prev.handle),
        }
    }

    pub fn contains(&self, source_id: &Path) -> bool {
        self.jobs.lock().unwrap().contains_key(source_id)
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the task registered under `source_id`.
    pub fn task(&self, source_id: &Path) -> Option<Task> {
        self.jobs
            .lock()
            .unwrap()
            .get(source_id)
            .map(|reg| reg.task.clone())
    }
}
