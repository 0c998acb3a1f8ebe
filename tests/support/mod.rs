// ABOUTME: Test support utilities.
// ABOUTME: Provides archive fixtures, fake transports and supervisors, and test configs.

use std::path::Path;
use std::sync::Once;
use stevedore::config::Config;

// Each test binary only uses some of these modules, so allow dead_code.
#[allow(dead_code)]
pub mod fakes;
#[allow(dead_code)]
pub mod fixtures;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("stevedore=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Config rooted in `root`, with marker-file commands and a fast, unreachable health probe.
#[allow(dead_code)]
pub fn test_config(root: &Path) -> Config {
    test_config_with_live_dir(root, &root.join("live"))
}

#[allow(dead_code)]
pub fn test_config_with_live_dir(root: &Path, live_dir: &Path) -> Config {
    let yaml = format!(
        r#"
app_name: demo
live_dir: {live}
backup_dir: {root}/backups
scratch_dir: {root}/scratch
retained_backups: 3
health:
  ports: [1]
  settle_delay: 0s
  probe_timeout: 200ms
commands:
  install: "touch .installed"
  build: "touch .built"
  migrate: "touch .migrated"
  timeout: 30s
supervisor:
  timeout: 10s
"#,
        live = live_dir.display(),
        root = root.display(),
    );
    Config::from_yaml(&yaml).unwrap()
}
