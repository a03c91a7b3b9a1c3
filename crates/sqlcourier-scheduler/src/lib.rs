//! # SQLCourier Scheduler
//!
//! The job-lifecycle core: cron parsing, the job registry, one trigger loop
//! per task, and the folder watcher that registers new task files live.
//!
//! ## Design Principles
//! - In-memory job table only — jobs are re-derived from the folder at start
//! - Hand-rolled 5-field cron — no cron crate dependency
//! - Tokio timers only — zero overhead while idle
//! - One registration worker — de-duplication without locks
//! - Failures stay inside the fire that caused them
//!
//! ## Architecture
//! ```text
//! BootstrapScan ──┐
//!                 ├─ queue ─ RegistrationWorker ─ SchedulerCore ─ JobRegistry
//! TaskWatcher ────┘                                   │
//!                                                     └─ trigger loop per job
//!                                                          └─ JobRunner (execution pipeline)
//! ```

pub mod cron;
pub mod engine;
pub mod registry;
pub mod watcher;

pub use cron::{CronParseError, CronSchedule};
pub use engine::{JobRunner, SchedulerCore};
pub use registry::{JobRegistration, JobRegistry, RegistrationOutcome, TriggerHandle};
pub use watcher::{RegistrationWorker, TaskWatcher, scan_existing};
