//! Scheduler core: validates tasks, arms recurring triggers, owns the
//! registry.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlcourier_core::{CourierError, Result, Task};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cron::CronSchedule;
use crate::registry::{JobRegistry, RegistrationOutcome, TriggerHandle};

/// Executes one trigger fire. Implemented by the execution pipeline; tests
/// substitute counting or failing runners.
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Run the task once. Returns the number of result rows handled.
    async fn run(&self, task: &Task) -> Result<usize>;
}

/// Owns the job registry and arms one timer loop per registered task.
pub struct SchedulerCore {
    registry: Arc<JobRegistry>,
    runner: Arc<dyn JobRunner>,
}

impl SchedulerCore {
    pub fn new(runner: Arc<dyn JobRunner>) -> Self {
        Self {
            registry: Arc::new(JobRegistry::new()),
            runner,
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Validate and register `task`, arming its recurring trigger.
    ///
    /// Replaces any prior registration for the same source file and retires
    /// the replaced trigger, so exactly one trigger per source is ever
    /// armed. Must run inside a tokio runtime.
    pub fn schedule_task(&self, task: Task) -> Result<()> {
        let source = task.source_id.display().to_string();

        let schedule =
            CronSchedule::parse(&task.schedule).map_err(|e| CourierError::InvalidSchedule {
                source_id: source.clone(),
                reason: e.to_string(),
            })?;
        if schedule.next_after(Utc::now()).is_none() {
            // Valid syntax that can never fire, like "0 0 31 2 *".
            return Err(CourierError::InvalidSchedule {
                source_id: source,
                reason: "no satisfiable fire time".into(),
            });
        }
        if task.query.trim().is_empty() {
            return Err(CourierError::EmptyQuery(source));
        }

        let expression = task.schedule.clone();
        let timer = self.arm(schedule, task.clone());
        match self.registry.register(task, TriggerHandle::new(timer)) {
            RegistrationOutcome::Inserted => {
                info!("📅 Scheduled {source} ({expression})");
            }
            RegistrationOutcome::Replaced(old) => {
                old.retire();
                info!("📅 Rescheduled {source} ({expression}), prior trigger retired");
            }
        }
        Ok(())
    }

    /// Spawn the recurring timer loop for one task.
    fn arm(&self, schedule: CronSchedule, task: Task) -> JoinHandle<()> {
        let runner = Arc::clone(&self.runner);
        tokio::spawn(async move {
            loop {
                let now = Utc::now();
                let Some(next) = schedule.next_after(now) else {
                    warn!(
                        "⏰ No further fire times for {}, trigger loop exiting",
                        task.source_id.display()
                    );
                    break;
                };
                let Ok(wait) = (next - now).to_std() else {
                    continue;
                };
                tokio::time::sleep(wait).await;

                debug!("⏰ Trigger fired for {}", task.source_id.display());
                // Detached, so a slow execution never delays the next arm.
                tokio::spawn(fire(Arc::clone(&runner), task.clone()));
            }
        })
    }
}

/// One isolated execution: the outcome is logged here and errors never
/// escape to the timer loop or the process.
pub async fn fire(runner: Arc<dyn JobRunner>, task: Task) {
    match runner.run(&task).await {
        Ok(rows) => info!("✅ {} completed ({rows} rows)", task.source_id.display()),
        Err(e) => warn!(
            "⚠️ {} failed: {e} (query: {})",
            task.source_id.display(),
            truncate(&task.query, 120)
        ),
    }
}

/// Flatten and cap the query text for one-line log output.
fn truncate(text: &str, max_chars: usize) -> String {
    let flat = text.trim().replace('\n', " ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let mut cut: String = flat.chars().take(max_chars).collect();
        cut.push_str("...");
        cut
    }
}
