//! The install flow: one parameterized plan built from collected options.
//!
//! `options` asks the questions, `rules` holds the concrete edits for the
//! well-known Laravel files, `steps` turns options into an ordered plan, and
//! `run` executes or inspects it.

pub mod options;
pub mod rules;
pub mod run;
pub mod steps;

pub use options::{gather, Database, Flags, InstallOptions, OptionsError};
pub use run::{execute, render_plan, status_report, StatusEntry, StepStatus, Summary};
pub use steps::{plan, Plan, Step};
