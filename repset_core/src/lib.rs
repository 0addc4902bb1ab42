#![forbid(unsafe_code)]

//! Core domain model and session engine for Repset.
//!
//! This crate provides:
//! - Domain types (prescriptions, exercises, workout plans)
//! - Plan sources (built-in and directory-backed)
//! - The rest timer sub-state-machine
//! - Session state and the session controller
//! - Fire-and-forget completion reporting

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod plan;
pub mod clock;
pub mod timer;
pub mod session;
pub mod controller;
pub mod report;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{Config, SessionSettings};
pub use plan::{get_builtin_plans, BuiltinPlans, DirectoryPlanSource, PlanSource};
pub use clock::{Clock, ManualClock, SystemClock};
pub use timer::{RestSnapshot, RestTimer, TimerEvent};
pub use session::{SessionState, SetKey};
pub use controller::{
    AbandonedSession, ExitRequest, NextOutcome, SessionController, SessionSnapshot,
    ToggleOutcome,
};
pub use report::{
    read_reports, CompletionReport, CompletionReporter, CompletionSink, DispatchHandle,
    JsonlCompletionLog, ReportDispatcher,
};
