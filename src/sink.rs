use log::{error, info};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// A text file written one line at a time.
///
/// The file is truncated when created, and every line is flushed as soon as it is
/// written, so an interrupted run loses at most the line being written.
#[derive(Debug)]
pub struct LineSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl LineSink {
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;

        Ok(LineSink {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    pub fn close(mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// The run log: a [`LineSink`] whose lines are mirrored to the `log` facade.
///
/// The run log is the last place diagnostics can go, so write failures are only
/// reported through `log` and otherwise ignored.
#[derive(Debug)]
pub struct RunLog {
    sink: LineSink,
}

impl RunLog {
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(RunLog {
            sink: LineSink::create(path)?,
        })
    }

    pub fn line(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        info!("{}", line);

        if let Err(e) = self.sink.write_line(line) {
            error!(
                "failed to write to run log `{}`: {}",
                self.sink.path().display(),
                e
            );
        }
    }

    pub fn close(self) -> io::Result<()> {
        self.sink.close()
    }
}
