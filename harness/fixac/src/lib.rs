//! Fixac - the fixa driver
//!
//! Probes a registry against the fixtures on disk, then hands every
//! registered fixture to an [`ExecutionEngine`] and aggregates the results.
//!
//! # Architecture
//!
//! ```text
//! ScopeTree
//!     │
//!     ▼
//! SuiteRunner::run()
//!     ├──► check() ──► ConsistencyReport   (once, before any dispatch)
//!     │
//!     └──► dispatch() per TestEntry ──► ExecutionEngine::execute(path, backend)
//!             │
//!             ▼
//!         SuiteSummary
//! ```
//!
//! Dispatches are independent: no entry's outcome changes another's, and
//! results come back in registry order whether or not they ran in parallel.

pub mod commands;
pub mod dispatch;
pub mod engine;
pub mod result;
pub mod suite;

pub use dispatch::{dispatch, CancelToken, Cancelled};
pub use engine::{CommandEngine, EngineError, ExecutionEngine, ExecutionFailure};
pub use result::{DispatchOutcome, DispatchResult, SuiteSummary};
pub use suite::{ConsistencyPolicy, SuiteConfig, SuiteRunner};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=fixac=debug,fixa_corpus=debug`; set `FIXA_LOG_TREE`
/// as well to render spans as an indented tree.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            let hierarchical = std::env::var_os("FIXA_LOG_TREE").is_some();
            tracing_subscriber::registry()
                .with(hierarchical.then(|| {
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_bracketed_fields(true)
                }))
                .with((!hierarchical).then(|| fmt::layer().with_target(true).with_level(true)))
                .with(filter)
                .init();
        }
    });
}
