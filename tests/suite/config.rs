//! Config file resolution feeding the polling loop.

use std::fs;
use std::io;
use std::time::Duration;

use settle_config::{ConfigError, SettleConfig};
use settle_core::{ConditionResult, wait_for_named};

#[test]
fn profile_layers_over_wait_section() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
# shared defaults
[wait]
initial_interval_ms = 250
attempts_before_slowing = 10

[profiles."db"]
timeout_ms = 120000

[profiles.fast]
initial_interval_ms = 5
timeout_ms = 50
"#,
    )
    .unwrap();

    let config = SettleConfig::load_from(&path).unwrap();

    let db = config.resolve(Some("db")).unwrap();
    assert_eq!(db.initial_interval(), Duration::from_millis(250));
    assert_eq!(db.attempts_before_slowing(), 10);
    assert_eq!(db.timeout(), Duration::from_secs(120));

    let fast = config.resolve(Some("fast")).unwrap();
    assert_eq!(fast.initial_interval(), Duration::from_millis(5));
    assert_eq!(fast.attempts_before_slowing(), 10);
    assert_eq!(fast.timeout(), Duration::from_millis(50));

    let mut names: Vec<_> = config.profile_names().collect();
    names.sort_unstable();
    assert_eq!(names, ["db", "fast"]);
}

#[test]
fn invalid_profile_value_reports_table() {
    let err = SettleConfig::parse("[profiles.broken]\ninitial_interval_ms = 0\n").unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidValue { ref table, field: "initial_interval_ms", .. } if table == "profiles.broken"
    ));
}

#[tokio::test]
async fn resolved_profile_drives_timeout() {
    let config = SettleConfig::parse("[profiles.fast]\ninitial_interval_ms = 5\ntimeout_ms = 30\n")
        .unwrap()
        .resolve(Some("fast"))
        .unwrap();

    let err = wait_for_named(
        "never",
        || Ok::<_, io::Error>(ConditionResult::<()>::Pending),
        &config,
    )
    .await
    .unwrap_err();

    assert!(err.is_timeout());
    assert!(err.attempts() > 2);
}
