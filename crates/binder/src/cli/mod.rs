//! # CLI Behavior
//!
//! One possible client for binderapp. The CLI is the only place that knows
//! about terminal I/O, exit codes, and output formatting.
//!
//! For the overall architecture, see the crate-level documentation in [`crate`].
//!
//! ## Naked Execution (`binder`)
//!
//! Running `binder` with no arguments defaults to `binder list`.
//!
//! ## Selecting Binders and Slots
//!
//! Every per-binder command takes the binder first, either as its UUID or as
//! one of your binder names (case-insensitive). Slots are zero-based indices
//! across the whole binder, not per page. `binder show` prints them page by
//! page.
//!
//! ## Output
//!
//! Results go to stdout, logs to stderr. `--json` prints the raw `CmdResult`
//! for scripting; otherwise `render` formats it for a terminal.
//!
//! ## Module Structure
//!
//! - `commands`: startup, dispatch to the API, printing
//! - `logging`: tracing subscriber setup
//! - `render`: terminal formatting (grids, lists, messages)
//! - `setup`: argument parsing via clap, help text

mod commands;
mod logging;
mod render;
pub mod setup;

pub use commands::run;
