#![allow(dead_code)]

mod writer;

use std::path::PathBuf;

use tempfile::TempDir;

pub use self::writer::Writer;

/// Install a subscriber that writes through the test harness so `tracing`
/// output shows up for failing tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Write each `(file name, contents)` pair into a fresh temporary directory.
pub fn template_dir(files: &[(&str, &str)]) -> (TempDir, Vec<PathBuf>) {
    let dir = tempfile::tempdir().unwrap();
    let paths = files
        .iter()
        .map(|(name, contents)| {
            let path = dir.path().join(name);
            std::fs::write(&path, contents).unwrap();
            path
        })
        .collect();
    (dir, paths)
}
