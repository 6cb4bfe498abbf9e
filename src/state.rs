use std::fmt;

/// States of a run, in the order a successful run visits them.
///
/// ```text
/// InitializeLogging -> CheckFiles -> PrepareFiles -> ProcessEvents -> EndRun
///                          |
///                          +-> CheckFileError -> EndRun
/// ```
///
/// Every failure leads straight to `EndRun`, except a failed file check which
/// first passes through `CheckFileError` to write its diagnostic.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RunState {
    InitializeLogging,
    CheckFiles,
    CheckFileError,
    PrepareFiles,
    ProcessEvents,
    EndRun,
}

impl RunState {
    /// The state that follows `self`, given whether the action of `self` succeeded.
    pub fn next(self, succeeded: bool) -> RunState {
        use RunState::*;

        match (self, succeeded) {
            (InitializeLogging, true) => CheckFiles,
            (InitializeLogging, false) => EndRun,
            (CheckFiles, true) => PrepareFiles,
            (CheckFiles, false) => CheckFileError,
            (CheckFileError, _) => EndRun,
            (PrepareFiles, true) => ProcessEvents,
            (PrepareFiles, false) => EndRun,
            (ProcessEvents, _) => EndRun,
            (EndRun, _) => EndRun,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == RunState::EndRun
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::InitializeLogging => "InitializeLogging",
            RunState::CheckFiles => "CheckFiles",
            RunState::CheckFileError => "CheckFileError",
            RunState::PrepareFiles => "PrepareFiles",
            RunState::ProcessEvents => "ProcessEvents",
            RunState::EndRun => "EndRun",
        };
        f.write_str(name)
    }
}
