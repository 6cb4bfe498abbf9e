//! Applies an XSLT stylesheet to every record of a Windows XML Event Log (EVTX) file.
//!
//! A run reads the records of an `.evtx` file in order, renders each one to XML,
//! transforms it with the stylesheet and appends the result as one line to an output
//! file. Progress and diagnostics go to a separate run log.
//!
//! ```no_run
//! use evtx_transform::{RunConfig, RunController, RunOutcome};
//!
//! let config = RunConfig::new("Security.evtx", "logons.xslt", "logons.txt", "run.log");
//! let report = RunController::new(config).run();
//!
//! if let RunOutcome::Success { processed } = report.outcome {
//!     println!("{} records", processed);
//! }
//! ```

pub mod config;
pub mod controller;
pub mod err;
pub mod event_source;
pub mod pipeline;
pub mod probe;
pub mod sink;
pub mod state;
pub mod xslt;

pub use config::RunConfig;
pub use controller::{RunController, RunFailure, RunOutcome, RunReport};
pub use err::{Access, RunError, SourceError, StylesheetError, TransformError};
pub use event_source::{EventRecord, EventSource, EvtxEventSource};
pub use state::RunState;
