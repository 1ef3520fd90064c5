/// Daily log file persistence
///
/// One file per local calendar day. The date is checked on every write, so a
/// long-running process moves to a new file after midnight.
use chrono::{Local, NaiveDate};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const LOG_FILE_PREFIX: &str = "incident-relay";

static LOG_FILE: OnceCell<Mutex<LogFile>> = OnceCell::new();

struct LogFile {
    dir: PathBuf,
    date: NaiveDate,
    writer: BufWriter<File>,
}

fn file_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}_{}.log", LOG_FILE_PREFIX, date.format("%Y-%m-%d")))
}

fn open_append(path: &Path) -> std::io::Result<BufWriter<File>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(BufWriter::new(file))
}

impl LogFile {
    fn open(dir: &Path, date: NaiveDate) -> std::io::Result<Self> {
        Ok(Self {
            dir: dir.to_path_buf(),
            date,
            writer: open_append(&file_path(dir, date))?,
        })
    }

    /// Switch to the file for `today` when the date has moved on
    fn rotate(&mut self, today: NaiveDate) -> std::io::Result<()> {
        if today == self.date {
            return Ok(());
        }
        let writer = open_append(&file_path(&self.dir, today))?;
        self.writer.flush()?;
        self.writer = writer;
        self.date = today;
        Ok(())
    }

    fn write_line(&mut self, line: &str, today: NaiveDate) {
        // on a failed rotation keep appending to the previous day's file
        let _ = self.rotate(today);
        let _ = writeln!(self.writer, "{}", line);
    }
}

/// Open (append) `<dir>/incident-relay_YYYY-MM-DD.log`.
/// A second call keeps the first directory and returns today's path in it.
pub fn init_file_logging(dir: &Path) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let today = Local::now().date_naive();

    if LOG_FILE.get().is_none() {
        let _ = LOG_FILE.set(Mutex::new(LogFile::open(dir, today)?));
    }

    match LOG_FILE.get() {
        Some(file) => {
            let file = file.lock();
            Ok(file_path(&file.dir, today))
        }
        None => Ok(file_path(dir, today)),
    }
}

pub fn write_to_file(line: &str) {
    if let Some(file) = LOG_FILE.get() {
        file.lock().write_line(line, Local::now().date_naive());
    }
}

pub fn flush_file_logging() {
    if let Some(file) = LOG_FILE.get() {
        let _ = file.lock().writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_write_moves_to_next_day_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = LogFile::open(dir.path(), day(1)).unwrap();

        file.write_line("before midnight", day(1));
        file.write_line("after midnight", day(2));
        file.writer.flush().unwrap();

        let first = fs::read_to_string(file_path(dir.path(), day(1))).unwrap();
        let second = fs::read_to_string(file_path(dir.path(), day(2))).unwrap();
        assert_eq!(first, "before midnight\n");
        assert_eq!(second, "after midnight\n");
        assert_eq!(file.date, day(2));
    }

    #[test]
    fn test_same_day_appends() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = LogFile::open(dir.path(), day(5)).unwrap();

        file.write_line("one", day(5));
        file.write_line("two", day(5));
        file.writer.flush().unwrap();

        let content = fs::read_to_string(file_path(dir.path(), day(5))).unwrap();
        assert_eq!(content, "one\ntwo\n");
        assert!(!file_path(dir.path(), day(6)).exists());
    }

    #[test]
    fn test_file_name_carries_date() {
        let path = file_path(Path::new("logs"), day(9));
        assert_eq!(path, Path::new("logs").join("incident-relay_2026-03-09.log"));
    }
}
