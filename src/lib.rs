//! Yui Installer: opinionated Laravel project setup
//!
//! Creates a Laravel project with `composer create-project`, then reshapes it
//! with a fixed set of text patches and optional add-on installs (Breeze,
//! Orion, Spatie Permission, a UI provider's npm stack).
//!
//! # Architecture
//!
//! All file edits go through a single primitive: [`PatchRule`], a marker
//! gate plus a literal text anchor plus a pure edit. Intelligence lives in
//! the rule definitions ([`recipe::rules`]), not in the application logic.
//!
//! # Safety
//!
//! - Idempotent edits: the marker is checked before anything else, so a
//!   second run is a byte-identical no-op
//! - Atomic file writes (tempfile + fsync + rename)
//! - Project boundary enforcement: no edit lands outside the project root
//!   or inside `vendor/` and `node_modules/`
//! - Anchor drift is reported, never guessed around
//!
//! # Example
//!
//! ```no_run
//! use yui_installer::patch::{patch, Anchor, Edit, PatchRule};
//! use std::path::Path;
//!
//! let rule = PatchRule {
//!     label: "env app name",
//!     marker: Anchor::line_start("APP_NAME=YUI"),
//!     anchors: vec![Anchor::line_start("APP_NAME=Laravel")],
//!     edit: Edit::ReplaceLine {
//!         with: "APP_NAME=YUI".to_string(),
//!     },
//!     not_found: "expected the stock APP_NAME=Laravel line".to_string(),
//! };
//!
//! match patch(Path::new("my-app/.env"), &rule) {
//!     Ok(outcome) => println!("{}", outcome),
//!     Err(e) => eprintln!("patch failed: {}", e),
//! }
//! ```

pub mod fsops;
pub mod guard;
pub mod patch;
pub mod process;
pub mod prompt;
pub mod recipe;
pub mod registry;

// Re-exports
pub use guard::{GuardError, ProjectGuard};
pub use patch::{
    append, evaluate, patch, scaffold, Anchor, AppendRule, Decision, Edit, PatchError,
    PatchOutcome, PatchRule, ScaffoldRule, Span,
};
pub use process::{CommandSpec, ProcessError, ProcessRunner, SystemRunner};
pub use recipe::{
    execute, gather, plan, render_plan, status_report, Database, Flags, InstallOptions, Plan,
    Step, Summary,
};
pub use registry::{load, Provider, ProviderRegistry, RegistrySource};
