//! # Binder CLI Architecture
//!
//! The binary is thin: the CLI lives in `src/cli/`, while this file only
//! invokes `cli::run()` and handles process termination.
//!
//! ## Workspace Structure
//!
//! - `crates/binderapp/`: UI-agnostic library (placement engine, stores, API)
//! - `crates/binder/`: this CLI, depends on `binderapp`
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/binder/src/cli/)                         │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Startup, logging and dispatch (commands.rs, logging.rs)  │
//! │  - Terminal rendering (render.rs)                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (crates/binderapp/src/api.rs)                    │
//! │  - Resolves binder names / UUIDs, parses slots              │
//! │  - Returns structured `CmdResult` values                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (crates/binderapp/src/commands/*)            │
//! │  - Authorize, plan, verify, commit                          │
//! │  - No knowledge of stdout/stderr or process exits           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Exit Codes
//!
//! - `0`: success
//! - `1`: any error
//! - `75` (`EX_TEMPFAIL`): the storage transaction failed and nothing was
//!   written; running the same command again is safe

mod cli;

use binderapp::error::BinderError;

const EXIT_RETRYABLE: i32 = 75;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        let retryable = e
            .downcast_ref::<BinderError>()
            .is_some_and(BinderError::is_retryable);
        std::process::exit(if retryable { EXIT_RETRYABLE } else { 1 });
    }
}
