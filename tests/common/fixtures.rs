//! Corpus fixtures for integration tests
//!
//! Writes small rule corpora to a temp directory and scans them back
//! through the real inventory.

use rulegraph::{RuleDocument, RuleInventory};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// An architecture-heavy rule; pairs with [`ARCHITECTURE_PATTERNS`]
pub const ARCHITECTURE_GUIDE: &str = "\
# Architecture

System architecture guidance: components, modules, and structure of the
rule graph. Keep the architecture layered and the components small.
";

/// A second architecture rule sharing the heading and vocabulary
pub const ARCHITECTURE_PATTERNS: &str = "\
# Architecture

More architecture guidance for the rule graph: structure components into
modules, keep the system layered.
";

/// A testing rule unrelated to the architecture pair
pub const TESTING_STANDARDS: &str = "\
# Testing Standards

Write unit tests before merging. Quality assurance requires verification
and validation of every change; regressions block release.
";

/// Install a test subscriber so skip/degrade warnings show up under
/// `--nocapture`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Write a corpus of (relative path, content) rule files
pub fn write_corpus(dir: &TempDir, files: &[(&str, &str)]) {
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}

/// Scan a corpus directory through the real inventory
pub fn scan(path: &Path) -> Vec<RuleDocument> {
    RuleInventory::new().scan(path).unwrap()
}

/// Write and scan in one step
pub fn corpus(files: &[(&str, &str)]) -> (TempDir, Vec<RuleDocument>) {
    let dir = TempDir::new().unwrap();
    write_corpus(&dir, files);
    let rules = scan(dir.path());
    (dir, rules)
}
