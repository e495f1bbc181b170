//! Loading a config file and building a manager from it.

use pillar_breaker::config::{load_config, ConfigError};
use pillar_breaker::resilience::CircuitState;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

mod common;
use common::{Behavior, ScriptedPillar};

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_load_and_build_manager() {
    let file = write_config(
        r#"
        degraded_threshold = 0.2

        [defaults]
        failure_threshold = 4
        timeout_secs = 0.25
        max_retries = 0

        [[pillars]]
        name = "physics"
        failure_threshold = 1
        recovery_timeout_secs = 2.0
        "#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.degraded_threshold, 0.2);

    let manager = config.build_manager();

    let physics = manager.get_breaker("physics", None);
    assert_eq!(physics.config().failure_threshold, 1);
    assert_eq!(physics.config().recovery_timeout, Duration::from_secs(2));
    assert_eq!(physics.config().timeout, Duration::from_millis(250));

    let audio = manager.get_breaker("audio", None);
    assert_eq!(audio.config().failure_threshold, 4);
    assert_eq!(audio.config().max_retries, 0);

    manager
        .call_through("physics", &ScriptedPillar::new(Behavior::Fail))
        .await
        .unwrap_err();
    assert_eq!(physics.state(), CircuitState::Open);
    assert_eq!(manager.get_open_circuits(), vec!["physics".to_string()]);
}

#[test]
fn test_invalid_file_is_rejected() {
    let file = write_config(
        r#"
        [defaults]
        failure_threshold = 0
        "#,
    );

    match load_config(file.path()) {
        Err(ConfigError::Validation(errors)) => assert!(!errors.is_empty()),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}
