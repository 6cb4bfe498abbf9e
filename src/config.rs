use std::path::{Path, PathBuf};

/// The four files a run works with. Fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    event_log: PathBuf,
    stylesheet: PathBuf,
    output: PathBuf,
    run_log: PathBuf,
}

impl RunConfig {
    pub fn new(
        event_log: impl Into<PathBuf>,
        stylesheet: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        run_log: impl Into<PathBuf>,
    ) -> Self {
        RunConfig {
            event_log: event_log.into(),
            stylesheet: stylesheet.into(),
            output: output.into(),
            run_log: run_log.into(),
        }
    }

    /// The `.evtx` file records are read from.
    pub fn event_log(&self) -> &Path {
        &self.event_log
    }

    /// The XSLT stylesheet applied to every record.
    pub fn stylesheet(&self) -> &Path {
        &self.stylesheet
    }

    /// Receives one line per transformed record.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Receives the progress and diagnostic trace of the run.
    pub fn run_log(&self) -> &Path {
        &self.run_log
    }
}
