//! File-backed widget values and the polling monitor that keeps them fresh.

use std::{
    fs,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant, SystemTime},
};

use super::settings;

/// How long a monitored file may be missing while it is being rewritten.
const REAPPEAR_TIMEOUT: Duration = Duration::from_millis(500);
const REAPPEAR_STEP: Duration = Duration::from_millis(20);

/// A file that supplies values to a combo or a list.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSource {
    pub path: PathBuf,
    pub sep: String,
    pub monitor: bool,
    pub add_value: String,
}

impl FileSource {
    /// Parses `PATH[@sep=S][@monitor=1][@addValue=V]`.
    pub fn parse(arg: &str) -> Self {
        let (ws, path) = settings::parse(arg);
        Self {
            path: PathBuf::from(path),
            sep: if ws.sep.is_empty() { "\n".to_string() } else { ws.sep },
            monitor: ws.monitor,
            add_value: ws.add_value,
        }
    }

    /// Reads the values. A missing or unreadable file yields no values.
    pub fn read_values(&self) -> Vec<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => split_values(&contents, &self.sep),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "cannot read values: {e}");
                Vec::new()
            }
        }
    }
}

/// Trims `contents`, folds line breaks into `sep` and splits on it.
pub fn split_values(contents: &str, sep: &str) -> Vec<String> {
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut folded = String::with_capacity(trimmed.len());
    let mut in_break = false;
    for c in trimmed.chars() {
        if c == '\r' || c == '\n' {
            if !in_break {
                folded.push_str(sep);
                in_break = true;
            }
        } else {
            folded.push(c);
            in_break = false;
        }
    }

    if sep.is_empty() {
        return vec![folded];
    }
    folded.split(sep).map(str::to_string).collect()
}

/// Reads the value shown in place of a text marker.
///
/// Trailing newlines are dropped. With `var_name`, the file is read as `NAME=value`
/// lines and only the matching value is returned. `None` means the file is unreadable.
pub fn read_marker(path: &Path, var_name: &str) -> Option<String> {
    let raw = fs::read_to_string(path).ok()?;
    let value = raw.trim_end_matches('\n');

    if var_name.is_empty() {
        return Some(value.to_string());
    }

    let found = value
        .split(['\r', '\n'])
        .filter(|line| !line.is_empty())
        .find_map(|line| {
            let (name, rest) = line.split_once('=').unwrap_or((line, ""));
            (name == var_name).then(|| rest.split('=').next().unwrap_or("").to_string())
        });
    Some(found.unwrap_or_default())
}

/// Waits for `path` to exist again, polling every 20 ms for up to 500 ms.
pub fn wait_for_path(path: &Path) -> bool {
    let deadline = Instant::now() + REAPPEAR_TIMEOUT;
    loop {
        if path.exists() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(REAPPEAR_STEP);
    }
}

/// Polls a set of files by modification time.
#[derive(Debug, Default)]
pub struct FileMonitor {
    watched: Vec<Watched>,
}

#[derive(Debug)]
struct Watched {
    path: PathBuf,
    modified: Option<SystemTime>,
}

impl FileMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts watching `path`. Paths already watched are ignored.
    pub fn watch(&mut self, path: &Path) {
        if self.watched.iter().any(|w| w.path == path) {
            return;
        }
        tracing::debug!(path = %path.display(), "monitoring file");
        self.watched.push(Watched {
            path: path.to_path_buf(),
            modified: modified(path),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.watched.is_empty()
    }

    /// Returns the paths whose modification time changed since the last poll.
    /// A file that disappeared is given a short grace period to come back.
    pub fn poll(&mut self) -> Vec<PathBuf> {
        let mut changed = Vec::new();
        for w in &mut self.watched {
            let mut now = modified(&w.path);
            if now.is_none() && w.modified.is_some() && wait_for_path(&w.path) {
                now = modified(&w.path);
            }
            if now != w.modified {
                w.modified = now;
                if now.is_some() {
                    changed.push(w.path.clone());
                }
            }
        }
        changed
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_source_settings() {
        let src = FileSource::parse("/tmp/values.txt@sep=;@monitor=true@addValue=false");
        assert_eq!(src.path, PathBuf::from("/tmp/values.txt"));
        assert_eq!(src.sep, ";");
        assert!(src.monitor);
        assert_eq!(src.add_value, "false");
    }

    #[test]
    fn default_separator_is_newline() {
        let src = FileSource::parse("/tmp/values.txt");
        assert_eq!(src.sep, "\n");
        assert!(!src.monitor);
    }

    #[test]
    fn line_breaks_fold_into_separator() {
        assert_eq!(split_values("a;b\r\n\r\nc;d\n", ";"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_values("\n one \n two\n", "\n"), vec!["one ", " two"]);
        assert!(split_values("  \n", "\n").is_empty());
    }

    #[test]
    fn missing_file_yields_nothing() {
        let src = FileSource::parse("/nonexistent/guid-values");
        assert!(src.read_values().is_empty());
    }
}
