use crate::err::TransformError;
use crate::event_source::{EventRecord, EventSource};
use crate::sink::LineSink;
use crate::xslt::{Stylesheet, XmlDocument};

use log::trace;

/// The compiled stylesheet together with the buffer every record is transformed into.
///
/// The buffer is cleared, not reallocated, for each record.
#[derive(Debug)]
pub struct TransformContext {
    stylesheet: Stylesheet,
    buffer: String,
}

impl TransformContext {
    pub fn new(stylesheet: Stylesheet) -> Self {
        TransformContext {
            stylesheet,
            buffer: String::new(),
        }
    }

    /// Transforms one record, returning the output line.
    pub fn transform_record(&mut self, record: &EventRecord) -> Result<&str, TransformError> {
        self.buffer.clear();

        let document =
            XmlDocument::parse(&record.xml).map_err(|diagnostics| TransformError::Parse {
                record_id: record.record_id,
                diagnostics,
            })?;

        self.stylesheet
            .transform_into(&document, &mut self.buffer)
            .map_err(|diagnostics| TransformError::Apply {
                record_id: record.record_id,
                diagnostics,
            })?;

        Ok(&self.buffer)
    }

    /// Streams every record of `source` to `output`, one line per record.
    ///
    /// Stops at the first error. `processed` is incremented after each line is
    /// written, so on error it holds the number of records fully handled before it.
    pub fn process<S: EventSource>(
        &mut self,
        source: &mut S,
        output: &mut LineSink,
        processed: &mut u64,
    ) -> Result<(), TransformError> {
        for record in source.records() {
            let record = record?;
            let line = self.transform_record(&record)?;
            output.write_line(line).map_err(TransformError::Write)?;

            *processed += 1;
            trace!("record {} -> line {}", record.record_id, processed);
        }

        Ok(())
    }
}
