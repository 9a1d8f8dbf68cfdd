//! Scanners that turn compiled classes and Java sources into marker records.

pub mod annotations;
pub mod class_file;
pub mod doc_tags;
pub mod javadoc;
pub mod walk;

use std::collections::HashMap;
use std::path::PathBuf;

use crate::types::MarkerRecord;

pub use annotations::AnnotationScanner;
pub use javadoc::JavadocScanner;
pub use walk::SourceFilter;

/// Input of one scan pass
#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    /// Directories or archives holding the plugin's own units
    pub roots: Vec<PathBuf>,
    /// Archives scanned for ancestors only; their goal markers are ignored
    pub dependencies: Vec<PathBuf>,
    /// Applied to paths relative to each root
    pub filter: SourceFilter,
}

/// Keep candidate units and every ancestor reachable from one
pub fn prune_to_candidates(
    mut all: HashMap<String, MarkerRecord>,
) -> HashMap<String, MarkerRecord> {
    let mut keep: Vec<String> = all
        .values()
        .filter(|record| record.is_candidate())
        .map(|record| record.identity.clone())
        .collect();

    let mut pruned = HashMap::new();
    while let Some(identity) = keep.pop() {
        if pruned.contains_key(&identity) {
            continue;
        }
        if let Some(record) = all.remove(&identity) {
            if let Some(ancestor) = &record.ancestor {
                keep.push(ancestor.clone());
            }
            pruned.insert(identity, record);
        }
    }
    pruned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(identity: &str, ancestor: Option<&str>, goal: bool) -> MarkerRecord {
        let mut record = MarkerRecord::new(identity, format!("{identity}.class"));
        record.ancestor = ancestor.map(str::to_string);
        if goal {
            record
                .class_markers
                .push(crate::types::ClassMarker::Goal(crate::types::GoalMarker::named("g")));
        }
        record
    }

    #[test]
    fn test_prune_survives_cycles() {
        let all = HashMap::from([
            ("A".to_string(), record("A", Some("B"), true)),
            ("B".to_string(), record("B", Some("A"), false)),
            ("C".to_string(), record("C", None, false)),
        ]);
        let pruned = prune_to_candidates(all);
        assert_eq!(pruned.len(), 2);
        assert!(pruned.contains_key("A") && pruned.contains_key("B"));
    }
}
