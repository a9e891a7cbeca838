use chrono::{DateTime, Local};
use std::collections::BTreeMap;

/// Metadata kept for every materialized file.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub bytes: usize,
    pub round: u32,
    pub written_at: DateTime<Local>,
}

/// In-memory record of every file written so far.
///
/// Keys are sanitized paths relative to the output directory. The registry
/// grows monotonically across rounds and only lives for the process lifetime;
/// its summary is fed back into continuation prompts so the model does not
/// duplicate or forget prior work.
#[derive(Debug, Default)]
pub struct FileRegistry {
    entries: BTreeMap<String, FileEntry>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh an entry. Repeated paths replace the old metadata
    /// without growing the registry.
    pub fn record(&mut self, path: &str, bytes: usize, round: u32) {
        self.entries.insert(
            path.to_string(),
            FileEntry {
                bytes,
                round,
                written_at: Local::now(),
            },
        );
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<&FileEntry> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FileEntry)> {
        self.entries.iter()
    }

    /// One line per file, used verbatim in continuation prompts.
    pub fn summary(&self) -> String {
        self.entries
            .iter()
            .map(|(path, entry)| {
                format!("{}: {} bytes (round {})", path, entry.bytes, entry.round)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn record_inserts_and_overwrites() {
        let mut registry = FileRegistry::new();
        registry.record("src/main.py", 12, 1);
        registry.record("README.md", 40, 1);
        assert_eq!(registry.len(), 2);

        registry.record("src/main.py", 99, 2);
        assert_eq!(registry.len(), 2);
        let entry = registry.get("src/main.py").unwrap();
        assert_eq!(entry.bytes, 99);
        assert_eq!(entry.round, 2);
    }

    #[test]
    fn summary_lists_every_file() {
        let mut registry = FileRegistry::new();
        registry.record("src/app.js", 10, 1);
        registry.record("index.html", 20, 2);

        let summary = registry.summary();
        assert!(summary.contains("src/app.js: 10 bytes (round 1)"));
        assert!(summary.contains("index.html: 20 bytes (round 2)"));
        assert_eq!(summary.lines().count(), 2);
    }

    #[test]
    fn empty_registry_has_empty_summary() {
        let registry = FileRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.summary(), "");
    }
}
