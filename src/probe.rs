//! Readiness checks performed before any run resource is opened.
//!
//! Both checks briefly open the file and close it again. A positive answer is
//! not a guarantee: nothing stops the file from changing before it is opened
//! for real.

use log::debug;
use std::fs::{self, File, OpenOptions};
use std::path::Path;

/// Returns `true` if `path` is an existing, non-empty file that can be opened for reading.
///
/// Empty files are rejected; an empty event log or stylesheet is never usable.
pub fn can_read(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();

    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => {
            debug!("`{}` cannot be inspected: {}", path.display(), e);
            return false;
        }
    };

    if !metadata.is_file() || metadata.len() == 0 {
        debug!("`{}` is not a non-empty file", path.display());
        return false;
    }

    match File::open(path) {
        Ok(_) => true,
        Err(e) => {
            debug!("`{}` cannot be opened for reading: {}", path.display(), e);
            false
        }
    }
}

/// Returns `true` if `path` can be opened for writing, creating the file if needed.
///
/// An existing file is left as is; it is truncated later, when the output is opened.
pub fn can_write(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();

    match OpenOptions::new().write(true).create(true).open(path) {
        Ok(_) => true,
        Err(e) => {
            debug!("`{}` cannot be opened for writing: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_not_readable() {
        let d = tempdir().unwrap();
        assert!(!can_read(d.path().join("missing.evtx")));
    }

    #[test]
    fn test_empty_file_is_not_readable() {
        let d = tempdir().unwrap();
        let f = d.path().join("empty.evtx");
        File::create(&f).unwrap();

        assert!(!can_read(&f));
    }

    #[test]
    fn test_non_empty_file_is_readable() {
        let d = tempdir().unwrap();
        let f = d.path().join("events.evtx");
        File::create(&f).unwrap().write_all(b"ElfFile").unwrap();

        assert!(can_read(&f));
    }

    #[test]
    fn test_directory_is_not_readable() {
        let d = tempdir().unwrap();
        assert!(!can_read(d.path()));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_without_read_permission_is_not_readable() {
        use std::os::unix::fs::PermissionsExt;

        let d = tempdir().unwrap();
        let f = d.path().join("locked.evtx");
        File::create(&f).unwrap().write_all(b"ElfFile").unwrap();
        fs::set_permissions(&f, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users bypass permission bits, nothing to check then.
        if File::open(&f).is_ok() {
            return;
        }

        assert!(!can_read(&f));
    }

    #[test]
    fn test_new_file_is_writable_and_gets_created() {
        let d = tempdir().unwrap();
        let f = d.path().join("out.txt");

        assert!(can_write(&f));
        assert!(f.exists());
    }

    #[test]
    fn test_existing_file_is_writable() {
        let d = tempdir().unwrap();
        let f = d.path().join("out.txt");
        File::create(&f).unwrap().write_all(b"previous run").unwrap();

        assert!(can_write(&f));
    }

    #[test]
    fn test_file_in_missing_directory_is_not_writable() {
        let d = tempdir().unwrap();
        let f = d.path().join("no").join("such").join("dir").join("out.txt");

        assert!(!can_write(&f));
        assert!(!f.exists());
    }

    #[test]
    fn test_directory_is_not_writable() {
        let d = tempdir().unwrap();
        assert!(!can_write(d.path()));
    }
}
