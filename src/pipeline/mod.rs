//! Scan pipeline: walk a directory, extract metadata, report per image.
//!
//! Two delivery modes share the walk and extraction logic. Batch
//! collects everything into one vector; streaming pushes events into a
//! sink as items are produced, so a consumer can render progress and
//! abandon a scan halfway through.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use thiserror::Error;

use crate::metadata::MetadataSource;
use crate::scanner;

/// One scanned image with everything the organizer needs to group it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanItem {
    pub path: String,
    pub people: Vec<String>,
    pub tags: Vec<String>,
}

/// Progress events emitted by a streaming scan, tagged for the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScanEvent {
    /// The walk is about to begin.
    Start,
    /// One scanned image; `idx` starts at 1.
    Item {
        idx: usize,
        path: String,
        people: Vec<String>,
        tags: Vec<String>,
    },
    /// The walk finished; `count` is the number of items emitted.
    End { count: usize },
}

/// Preconditions that reject a scan invocation as a whole.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("source directory does not exist: {0}")]
    SourceMissing(String),
    #[error("source path is not a directory: {0}")]
    NotADirectory(String),
    #[error("metadata backend is not available, install exiftool and make sure it is on PATH")]
    BackendUnavailable,
}

/// Checks that a scan can run at all: the source must be an existing
/// directory and the metadata backend must be available.
pub fn check_preconditions(source: &Path, metadata: &dyn MetadataSource) -> Result<(), ScanError> {
    if !source.exists() {
        return Err(ScanError::SourceMissing(source.display().to_string()));
    }
    if !source.is_dir() {
        return Err(ScanError::NotADirectory(source.display().to_string()));
    }
    if !metadata.is_available() {
        return Err(ScanError::BackendUnavailable);
    }
    Ok(())
}

/// Batch scan: walks `source` and returns every supported image with
/// its people and tags, in walk order.
///
/// Images whose extraction fails are logged and skipped; one unreadable
/// file never aborts the scan.
pub fn scan_directory(
    source: &Path,
    metadata: &dyn MetadataSource,
) -> Result<Vec<ScanItem>, ScanError> {
    check_preconditions(source, metadata)?;

    let mut items = Vec::new();
    for path in scanner::walk_images(source) {
        match metadata.extract(&path) {
            Ok(extracted) => items.push(ScanItem {
                path: path.display().to_string(),
                people: extracted.people,
                tags: extracted.tags,
            }),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Skipping image, metadata extraction failed");
            }
        }
    }

    tracing::info!(count = items.len(), source = %source.display(), "Batch scan finished");
    Ok(items)
}

/// Streaming scan: pushes [`ScanEvent`]s into `sink` as images are
/// scanned.
///
/// The sink returns false to signal that the consumer is gone; the walk
/// stops immediately and no further extraction runs. Setting `cancel`
/// has the same effect, checked once per file. A stopped scan does not
/// emit `End`, which is how the consumer tells completion from
/// abandonment. Returns the number of items produced.
pub fn stream_scan(
    source: &Path,
    metadata: &dyn MetadataSource,
    cancel: &AtomicBool,
    mut sink: impl FnMut(ScanEvent) -> bool,
) -> Result<usize, ScanError> {
    check_preconditions(source, metadata)?;

    if !sink(ScanEvent::Start) {
        return Ok(0);
    }

    let mut count = 0usize;
    let mut stopped = false;
    for path in scanner::walk_images(source) {
        if cancel.load(Ordering::Relaxed) {
            tracing::info!(source = %source.display(), produced = count, "Scan cancelled");
            stopped = true;
            break;
        }

        // Streaming favors continuity over completeness: a failed
        // extraction becomes an item with empty lists.
        let extracted = match metadata.extract(&path) {
            Ok(extracted) => extracted,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Metadata extraction failed, emitting empty lists");
                Default::default()
            }
        };

        count += 1;
        let delivered = sink(ScanEvent::Item {
            idx: count,
            path: path.display().to_string(),
            people: extracted.people,
            tags: extracted.tags,
        });
        if !delivered {
            tracing::info!(source = %source.display(), produced = count, "Scan consumer disconnected");
            stopped = true;
            break;
        }
    }

    if !stopped {
        sink(ScanEvent::End { count });
        tracing::info!(count, source = %source.display(), "Streaming scan finished");
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use std::sync::atomic::AtomicUsize;

    use crate::metadata::{MetadataError, PersonTags};

    /// In-memory metadata source keyed by file name.
    struct MockSource {
        available: bool,
        by_name: HashMap<String, PersonTags>,
        failing: Vec<String>,
        calls: AtomicUsize,
    }

    impl MockSource {
        fn new() -> Self {
            Self {
                available: true,
                by_name: HashMap::new(),
                failing: Vec::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn with(mut self, name: &str, people: &[&str], tags: &[&str]) -> Self {
            self.by_name.insert(
                name.to_string(),
                PersonTags {
                    people: people.iter().map(|s| s.to_string()).collect(),
                    tags: tags.iter().map(|s| s.to_string()).collect(),
                },
            );
            self
        }

        fn failing_on(mut self, name: &str) -> Self {
            self.failing.push(name.to_string());
            self
        }

        fn unavailable(mut self) -> Self {
            self.available = false;
            self
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::Relaxed)
        }
    }

    impl MetadataSource for MockSource {
        fn is_available(&self) -> bool {
            self.available
        }

        fn extract(&self, path: &Path) -> Result<PersonTags, MetadataError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if self.failing.contains(&name) {
                return Err(MetadataError::Subprocess {
                    path: name,
                    reason: "boom".to_string(),
                });
            }
            Ok(self.by_name.get(&name).cloned().unwrap_or_default())
        }
    }

    fn image_dir(names: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        dir
    }

    #[test]
    fn batch_scan_reports_people_and_tags_per_image() {
        let dir = image_dir(&["a.jpg", "b.png", "notes.txt"]);
        let source = MockSource::new()
            .with("a.jpg", &["Alice"], &["beach"])
            .with("b.png", &["Bob", "Alice"], &[]);

        let mut items = scan_directory(dir.path(), &source).unwrap();
        items.sort_by(|a, b| a.path.cmp(&b.path));

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].people, vec!["Alice"]);
        assert_eq!(items[0].tags, vec!["beach"]);
        assert_eq!(items[1].people, vec!["Bob", "Alice"]);
    }

    #[test]
    fn batch_scan_skips_images_that_fail_extraction() {
        let dir = image_dir(&["a.jpg", "b.jpg"]);
        let source = MockSource::new()
            .with("b.jpg", &["Bob"], &[])
            .failing_on("a.jpg");

        let items = scan_directory(dir.path(), &source).unwrap();

        assert_eq!(items.len(), 1);
        assert!(items[0].path.ends_with("b.jpg"));
    }

    #[test]
    fn missing_source_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = MockSource::new();
        let result = scan_directory(&dir.path().join("nope"), &source);
        assert!(matches!(result, Err(ScanError::SourceMissing(_))));
    }

    #[test]
    fn file_as_source_is_rejected() {
        let dir = image_dir(&["a.jpg"]);
        let source = MockSource::new();
        let result = scan_directory(&dir.path().join("a.jpg"), &source);
        assert!(matches!(result, Err(ScanError::NotADirectory(_))));
    }

    #[test]
    fn unavailable_backend_is_rejected_before_walking() {
        let dir = image_dir(&["a.jpg"]);
        let source = MockSource::new().unavailable();

        let result = scan_directory(dir.path(), &source);

        assert!(matches!(result, Err(ScanError::BackendUnavailable)));
        assert_eq!(source.call_count(), 0);
    }

    #[test]
    fn stream_emits_start_items_end_in_order() {
        let dir = image_dir(&["a.jpg", "b.jpg", "c.jpg"]);
        let source = MockSource::new().with("a.jpg", &["Alice"], &[]);
        let cancel = AtomicBool::new(false);

        let mut events = Vec::new();
        let produced = stream_scan(dir.path(), &source, &cancel, |event| {
            events.push(event);
            true
        })
        .unwrap();

        assert_eq!(produced, 3);
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], ScanEvent::Start));
        assert!(matches!(events[4], ScanEvent::End { count: 3 }));
        for (position, event) in events[1..4].iter().enumerate() {
            match event {
                ScanEvent::Item { idx, .. } => assert_eq!(*idx, position + 1),
                other => panic!("expected item event, got {:?}", other),
            }
        }
    }

    #[test]
    fn stream_substitutes_empty_lists_on_extraction_failure() {
        let dir = image_dir(&["a.jpg"]);
        let source = MockSource::new().failing_on("a.jpg");
        let cancel = AtomicBool::new(false);

        let mut events = Vec::new();
        stream_scan(dir.path(), &source, &cancel, |event| {
            events.push(event);
            true
        })
        .unwrap();

        assert_eq!(events.len(), 3);
        match &events[1] {
            ScanEvent::Item { people, tags, .. } => {
                assert!(people.is_empty());
                assert!(tags.is_empty());
            }
            other => panic!("expected item event, got {:?}", other),
        }
    }

    #[test]
    fn cancelled_stream_stops_without_end_event() {
        let dir = image_dir(&["a.jpg", "b.jpg"]);
        let source = MockSource::new();
        let cancel = AtomicBool::new(true);

        let mut events = Vec::new();
        let produced = stream_scan(dir.path(), &source, &cancel, |event| {
            events.push(event);
            true
        })
        .unwrap();

        assert_eq!(produced, 0);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ScanEvent::Start));
        assert_eq!(source.call_count(), 0);
    }

    #[test]
    fn disconnected_sink_stops_further_extraction() {
        let dir = image_dir(&["a.jpg", "b.jpg", "c.jpg"]);
        let source = MockSource::new();
        let cancel = AtomicBool::new(false);

        let mut events = Vec::new();
        stream_scan(dir.path(), &source, &cancel, |event| {
            let keep_going = !matches!(event, ScanEvent::Item { .. });
            events.push(event);
            keep_going
        })
        .unwrap();

        // Start plus the one undeliverable item; the walk stops there.
        assert_eq!(events.len(), 2);
        assert_eq!(source.call_count(), 1);
        assert!(!events.iter().any(|e| matches!(e, ScanEvent::End { .. })));
    }
}
