//! Size-rotated log file.
//!
//! `<name>.log` is the active file. When it would grow past `max_bytes` it is
//! renamed to `<name>.1.log`, older files shift up by one, and anything past
//! `keep` is removed.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Rotation limits
#[derive(Debug, Clone, Copy)]
pub struct RollingOptions {
    pub max_bytes: u64,
    pub keep: usize,
}

impl Default for RollingOptions {
    fn default() -> Self {
        Self {
            max_bytes: 1024 * 1024,
            keep: 3,
        }
    }
}

pub struct RollingFile {
    dir: PathBuf,
    name: String,
    options: RollingOptions,
    file: File,
    written: u64,
}

impl RollingFile {
    pub fn open(dir: &Path, name: &str, options: RollingOptions) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.log", name));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            dir: dir.to_path_buf(),
            name: name.to_string(),
            options,
            file,
            written,
        })
    }

    /// Path of the active file
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.name))
    }

    fn rotated_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}.{}.log", self.name, index))
    }

    pub fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        if self.written > 0 && self.written + line.len() as u64 > self.options.max_bytes {
            self.rotate()?;
        }
        self.file.write_all(line)?;
        self.written += line.len() as u64;
        Ok(())
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.options.keep == 0 {
            let _ = fs::remove_file(self.path());
        } else {
            let _ = fs::remove_file(self.rotated_path(self.options.keep));
            for index in (1..self.options.keep).rev() {
                let from = self.rotated_path(index);
                if from.exists() {
                    fs::rename(&from, self.rotated_path(index + 1))?;
                }
            }
            fs::rename(self.path(), self.rotated_path(1))?;
        }

        self.file = OpenOptions::new().create(true).append(true).open(self.path())?;
        self.written = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotates_when_full() {
        let dir = tempfile::tempdir().unwrap();
        let options = RollingOptions { max_bytes: 10, keep: 2 };
        let mut file = RollingFile::open(dir.path(), "app", options).unwrap();

        file.write_line(b"first---\n").unwrap();
        file.write_line(b"second--\n").unwrap();
        file.write_line(b"third---\n").unwrap();

        let active = fs::read_to_string(dir.path().join("app.log")).unwrap();
        let one = fs::read_to_string(dir.path().join("app.1.log")).unwrap();
        let two = fs::read_to_string(dir.path().join("app.2.log")).unwrap();
        assert_eq!(active, "third---\n");
        assert_eq!(one, "second--\n");
        assert_eq!(two, "first---\n");
    }

    #[test]
    fn test_drops_files_past_keep() {
        let dir = tempfile::tempdir().unwrap();
        let options = RollingOptions { max_bytes: 4, keep: 1 };
        let mut file = RollingFile::open(dir.path(), "app", options).unwrap();

        for line in ["aaa\n", "bbb\n", "ccc\n"] {
            file.write_line(line.as_bytes()).unwrap();
        }

        assert!(!dir.path().join("app.2.log").exists());
        assert_eq!(fs::read_to_string(dir.path().join("app.1.log")).unwrap(), "bbb\n");
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "ccc\n");
    }

    #[test]
    fn test_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut file = RollingFile::open(dir.path(), "app", RollingOptions::default()).unwrap();
            file.write_line(b"one\n").unwrap();
        }
        let mut file = RollingFile::open(dir.path(), "app", RollingOptions::default()).unwrap();
        file.write_line(b"two\n").unwrap();
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "one\ntwo\n");
    }
}
