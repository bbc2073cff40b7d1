//! Shared helpers for the integration tests in `tests/`.

use std::path::PathBuf;

use credence_engine::EngineConfig;

/// A fresh engine config pointing at a unique temp data directory.
/// Callers remove the directory when done.
pub fn temp_engine_config() -> (EngineConfig, PathBuf) {
    let dir = std::env::temp_dir().join(format!("credence-it-{}", rand::random::<u64>()));
    let mut config = EngineConfig::default();
    config.storage.data_dir = dir.clone();
    (config, dir)
}
