//! Status entries shown below the form.

use std::{collections::VecDeque, fs, path::Path};

use super::menu::MessageKind;

/// Newest entry first, at most `capacity` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Footer {
    entries: VecDeque<String>,
    capacity: usize,
    pub message: Option<(MessageKind, String)>,
}

impl Footer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            message: None,
        }
    }

    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push_front(entry.into());
        self.entries.truncate(self.capacity);
    }

    /// Replaces the entries with the lines of `contents`, first line on top.
    pub fn set_contents(&mut self, contents: &str) {
        self.entries.clear();
        let normalized = contents.trim().replace("\r\n", "\n").replace('\r', "\n");
        let lines: Vec<&str> = normalized.split('\n').filter(|l| !l.is_empty()).collect();
        for line in lines.into_iter().rev() {
            self.push(line);
        }
    }

    /// Loads the entries from `path`. Returns false if it cannot be read.
    pub fn load(&mut self, path: &Path) -> bool {
        match fs::read_to_string(path) {
            Ok(contents) => {
                self.set_contents(&contents);
                true
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "cannot read footer: {e}");
                false
            }
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_on_top_and_capped() {
        let mut footer = Footer::new(2);
        footer.push("one");
        footer.push("two");
        footer.push("three");
        assert_eq!(footer.entries().collect::<Vec<_>>(), vec!["three", "two"]);
    }

    #[test]
    fn contents_keep_file_order() {
        let mut footer = Footer::new(3);
        footer.set_contents("\n first\r\n\r\nsecond\nthird\nfourth\n");
        assert_eq!(footer.entries().collect::<Vec<_>>(), vec!["first", "second", "third"]);
    }

    #[test]
    fn zero_capacity_keeps_one() {
        let mut footer = Footer::new(0);
        footer.push("a");
        footer.push("b");
        assert_eq!(footer.entries().collect::<Vec<_>>(), vec!["b"]);
    }
}
