use crate::config::RunConfig;
use crate::err::{Access, RunError, TransformError};
use crate::event_source::{EventSource, EvtxEventSource};
use crate::pipeline::TransformContext;
use crate::probe::{can_read, can_write};
use crate::sink::{LineSink, RunLog};
use crate::state::RunState;
use crate::xslt::Stylesheet;

use log::{debug, error, warn};

/// Why a run ended early.
#[derive(Debug)]
pub struct RunFailure {
    /// The state whose action failed.
    pub stage: RunState,
    /// Records written to the output before the failure.
    pub processed: u64,
    pub error: RunError,
}

#[derive(Debug)]
pub enum RunOutcome {
    Success { processed: u64 },
    Failure(RunFailure),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success { .. })
    }

    pub fn processed(&self) -> u64 {
        match self {
            RunOutcome::Success { processed } => *processed,
            RunOutcome::Failure(failure) => failure.processed,
        }
    }
}

/// The result of [`RunController::run`].
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Every state entered, from `InitializeLogging` to `EndRun`.
    pub visited: Vec<RunState>,
}

/// Drives a single run: check the files, open everything, stream the records.
///
/// Each resource is held in its own `Option` and is released when the controller is
/// dropped, whether or not the others were ever opened.
pub struct RunController<S: EventSource = EvtxEventSource> {
    config: RunConfig,
    state: RunState,
    visited: Vec<RunState>,
    run_log: Option<RunLog>,
    source: Option<S>,
    output: Option<LineSink>,
    context: Option<TransformContext>,
    processed: u64,
    failure: Option<RunFailure>,
}

impl RunController<EvtxEventSource> {
    /// A controller reading `.evtx` files.
    pub fn new(config: RunConfig) -> Self {
        Self::with_event_source(config)
    }
}

impl<S: EventSource> RunController<S> {
    pub fn with_event_source(config: RunConfig) -> Self {
        RunController {
            config,
            state: RunState::InitializeLogging,
            visited: vec![RunState::InitializeLogging],
            run_log: None,
            source: None,
            output: None,
            context: None,
            processed: 0,
            failure: None,
        }
    }

    /// Runs to completion. Resources are released when this returns.
    pub fn run(mut self) -> RunReport {
        while !self.state.is_terminal() {
            let succeeded = match self.state {
                RunState::InitializeLogging => self.initialize_logging(),
                RunState::CheckFiles => self.check_files(),
                RunState::CheckFileError => self.report_check_file_error(),
                RunState::PrepareFiles => self.prepare_files(),
                RunState::ProcessEvents => self.process_events(),
                RunState::EndRun => true,
            };
            self.advance(succeeded);
        }

        let outcome = match self.failure.take() {
            Some(failure) => RunOutcome::Failure(failure),
            None => RunOutcome::Success {
                processed: self.processed,
            },
        };

        RunReport {
            outcome,
            visited: std::mem::take(&mut self.visited),
        }
    }

    fn advance(&mut self, succeeded: bool) {
        let next = self.state.next(succeeded);
        debug_assert!(
            !self.visited.contains(&next),
            "state {next} entered a second time"
        );

        debug!("{} -> {} (succeeded: {})", self.state, next, succeeded);
        self.state = next;
        self.visited.push(next);
    }

    /// Records `error` against the current state, unless an earlier failure already was.
    fn fail(&mut self, error: RunError) {
        if self.failure.is_none() {
            self.failure = Some(RunFailure {
                stage: self.state,
                processed: self.processed,
                error,
            });
        } else {
            debug!("additional failure in {}: {}", self.state, error);
        }
    }

    fn log_line(&mut self, line: impl AsRef<str>) {
        if let Some(run_log) = self.run_log.as_mut() {
            run_log.line(line);
        }
    }

    fn initialize_logging(&mut self) -> bool {
        let path = self.config.run_log();

        match RunLog::create(path) {
            Ok(mut run_log) => {
                run_log.line(format!("Event file: {}", self.config.event_log().display()));
                run_log.line(format!("XSLT file: {}", self.config.stylesheet().display()));
                run_log.line(format!("Log file: {}", self.config.run_log().display()));
                run_log.line(format!("Output file: {}", self.config.output().display()));
                self.run_log = Some(run_log);
                true
            }
            Err(source) => {
                error!("failed to open run log `{}`: {}", path.display(), source);
                let path = path.to_path_buf();
                self.fail(RunError::Configuration { path, source });
                false
            }
        }
    }

    fn check_files(&mut self) -> bool {
        self.log_line("Checking files ...");

        let config = &self.config;
        let inaccessible = if !can_read(config.event_log()) {
            Some((config.event_log(), Access::Read))
        } else if !can_read(config.stylesheet()) {
            Some((config.stylesheet(), Access::Read))
        } else if !can_write(config.output()) {
            Some((config.output(), Access::Write))
        } else {
            None
        };

        match inaccessible {
            None => true,
            Some((path, access)) => {
                let path = path.to_path_buf();
                self.fail(RunError::Inaccessible { path, access });
                false
            }
        }
    }

    fn report_check_file_error(&mut self) -> bool {
        self.log_line(
            "Error checking files. Please check the following files and necessary access.",
        );

        if let Some(detail) = self.failure.as_ref().map(|f| f.error.to_string()) {
            self.log_line(detail);
        }

        true
    }

    /// Loads the stylesheet, opens the event log and the output. All three are
    /// attempted even if an earlier one failed, so every problem ends up in the log.
    fn prepare_files(&mut self) -> bool {
        self.log_line("Preparing files ...");
        let mut ready = true;

        match Stylesheet::load(self.config.stylesheet()) {
            Ok(stylesheet) => self.context = Some(TransformContext::new(stylesheet)),
            Err(e) => {
                self.log_line("Error loading XSLT");
                self.log_line(e.to_string());
                self.fail(RunError::Stylesheet(e));
                ready = false;
            }
        }

        match S::open(self.config.event_log()) {
            Ok(source) => self.source = Some(source),
            Err(e) => {
                self.log_line("Error reading event log file");
                self.log_line(e.to_string());
                self.fail(RunError::EventSource(e));
                ready = false;
            }
        }

        match LineSink::create(self.config.output()) {
            Ok(output) => self.output = Some(output),
            Err(source) => {
                let path = self.config.output().to_path_buf();
                self.log_line("Error opening output file for writing");
                self.log_line(source.to_string());
                self.fail(RunError::Output { path, source });
                ready = false;
            }
        }

        ready
    }

    fn process_events(&mut self) -> bool {
        self.log_line("Reading and processing events ...");

        let result = match (
            self.context.as_mut(),
            self.source.as_mut(),
            self.output.as_mut(),
        ) {
            (Some(context), Some(source), Some(output)) => {
                context.process(source, output, &mut self.processed)
            }
            _ => Err(TransformError::NotPrepared { state: self.state }),
        };

        // The event log is not needed past this point.
        self.source = None;

        match result {
            Ok(()) => {
                self.log_line(format!("Processed {} records", self.processed));
                true
            }
            Err(e) => {
                self.log_line(format!(
                    "Last successfully read record # {}",
                    self.processed
                ));
                self.log_line(e.to_string());
                self.fail(RunError::Transform(e));
                false
            }
        }
    }
}

impl<S: EventSource> Drop for RunController<S> {
    fn drop(&mut self) {
        if self.source.take().is_some() {
            debug!("released event log `{}`", self.config.event_log().display());
        }

        if let Some(output) = self.output.take() {
            self.log_line("Closing output file");
            if let Err(e) = output.close() {
                warn!(
                    "failed to close output file `{}`: {}",
                    self.config.output().display(),
                    e
                );
            }
        }

        if let Some(mut run_log) = self.run_log.take() {
            run_log.line("Closing log file");
            if let Err(e) = run_log.close() {
                warn!(
                    "failed to close run log `{}`: {}",
                    self.config.run_log().display(),
                    e
                );
            }
        }
    }
}
