#![allow(dead_code)]
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;

use evtx_transform::{EventRecord, EventSource, RunConfig, SourceError};
use tempfile::{TempDir, tempdir};

static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .is_test(true)
            .init();
    });
}

/// Prints `<EventID>,<Computer>` for every event.
pub const TEXT_STYLESHEET: &str = r#"<xsl:stylesheet version="1.0"
    xmlns:xsl="http://www.w3.org/1999/XSL/Transform"
    xmlns:e="http://schemas.microsoft.com/win/2004/08/events/event">
  <xsl:output method="text"/>
  <xsl:template match="/">
    <xsl:value-of select="e:Event/e:System/e:EventID"/>
    <xsl:text>,</xsl:text>
    <xsl:value-of select="e:Event/e:System/e:Computer"/>
  </xsl:template>
</xsl:stylesheet>"#;

/// Line that makes [`XmlLinesSource`] fail to read that record.
pub const CORRUPT_RECORD: &str = "!corrupt-record";

/// First line that makes [`XmlLinesSource`] refuse to open the log.
pub const CORRUPT_LOG: &str = "!corrupt-log";

pub fn event_xml(event_id: u32, computer: &str) -> String {
    format!(
        r#"<Event xmlns="http://schemas.microsoft.com/win/2004/08/events/event"><System><EventID>{event_id}</EventID><Computer>{computer}</Computer></System></Event>"#
    )
}

/// Event source over a text file holding one rendered XML record per line.
///
/// Record ids are assigned sequentially starting at 1.
pub struct XmlLinesSource {
    lines: std::vec::IntoIter<String>,
    last_id: u64,
}

impl EventSource for XmlLinesSource {
    fn open(path: &Path) -> Result<Self, SourceError> {
        let text = fs::read_to_string(path).map_err(|e| SourceError::Open {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

        if text.starts_with(CORRUPT_LOG) {
            return Err(SourceError::Open {
                path: path.to_path_buf(),
                source: "file header is corrupted".into(),
            });
        }

        let lines: Vec<String> = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_owned)
            .collect();

        Ok(XmlLinesSource {
            lines: lines.into_iter(),
            last_id: 0,
        })
    }

    fn records(&mut self) -> Box<dyn Iterator<Item = Result<EventRecord, SourceError>> + '_> {
        let last_id = &mut self.last_id;

        Box::new(self.lines.by_ref().map(move |line| {
            *last_id += 1;
            if line == CORRUPT_RECORD {
                Err(SourceError::Record {
                    source: format!("record {} is corrupted", last_id).into(),
                })
            } else {
                Ok(EventRecord {
                    record_id: *last_id,
                    xml: line,
                })
            }
        }))
    }
}

/// A scratch directory holding the four files of a run.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Workspace {
            dir: tempdir().unwrap(),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Writes `records` as the input, one per line.
    pub fn write_events(&self, records: &[String]) -> PathBuf {
        self.write("events.xml", &records.join("\n"))
    }

    pub fn write_stylesheet(&self, body: &str) -> PathBuf {
        self.write("transform.xslt", body)
    }

    pub fn config(&self) -> RunConfig {
        RunConfig::new(
            self.path("events.xml"),
            self.path("transform.xslt"),
            self.path("output.txt"),
            self.path("run.log"),
        )
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path(name)).unwrap()
    }

    pub fn lines(&self, name: &str) -> Vec<String> {
        self.read(name).lines().map(str::to_owned).collect()
    }
}
