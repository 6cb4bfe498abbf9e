use crate::err::SourceError;

use evtx::{EvtxParser, ParserSettings};
use log::debug;
use std::fs::File;
use std::path::Path;

/// A single event, already rendered to its XML form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub record_id: u64,
    pub xml: String,
}

/// A sequential reader of event records.
pub trait EventSource {
    /// Opens the log at `path`.
    fn open(path: &Path) -> Result<Self, SourceError>
    where
        Self: Sized;

    /// Streams every record in log order.
    fn records(&mut self) -> Box<dyn Iterator<Item = Result<EventRecord, SourceError>> + '_>;
}

/// Reads records from an `.evtx` file.
pub struct EvtxEventSource {
    parser: EvtxParser<File>,
}

impl EventSource for EvtxEventSource {
    fn open(path: &Path) -> Result<Self, SourceError> {
        let parser = EvtxParser::from_path(path)
            .map_err(|e| SourceError::Open {
                path: path.to_path_buf(),
                source: Box::new(e),
            })?
            // Records are handed out strictly in order, there is nothing to gain from threads.
            .with_configuration(ParserSettings::new().num_threads(1));

        debug!("opened event log `{}`", path.display());

        Ok(EvtxEventSource { parser })
    }

    fn records(&mut self) -> Box<dyn Iterator<Item = Result<EventRecord, SourceError>> + '_> {
        Box::new(self.parser.records().map(|record| {
            record
                .map(|r| EventRecord {
                    record_id: r.event_record_id,
                    xml: r.data,
                })
                .map_err(|e| SourceError::Record {
                    source: Box::new(e),
                })
        }))
    }
}
