//! Test configuration helpers for creating exporters against a mock server

use std::time::Duration;
use tempfile::TempDir;
use weread_export::{BatchConfig, BookExporter, Config, FileCollisionAction, RetryConfig};
use wiremock::MockServer;

/// Configuration pointing at `server`, writing into `output`, with zero-delay retries
pub fn test_config(server: &MockServer, output: &TempDir) -> Config {
    let mut config = Config::default();
    config.api.base_url = server.uri();
    config.api.user_vid = "test-vid".to_string();
    config.api.timeout = Duration::from_secs(5);
    config.retry = RetryConfig::from_millis(&[0, 0]);
    config.batch = BatchConfig {
        concurrency: 2,
        delay: Duration::ZERO,
    };
    config.output.directory = output.path().to_path_buf();
    config.output.file_collision = FileCollisionAction::Rename;
    config
}

/// Exporter plus the temp directory its file sink writes into
pub fn create_test_exporter(server: &MockServer) -> (BookExporter, TempDir) {
    let output = tempfile::tempdir().unwrap_or_else(|e| panic!("Failed to create temp dir: {e}"));
    let exporter = BookExporter::new(test_config(server, &output))
        .unwrap_or_else(|e| panic!("Failed to create exporter: {e}"));
    (exporter, output)
}
