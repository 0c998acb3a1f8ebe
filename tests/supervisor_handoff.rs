// ABOUTME: Supervisor handoff against stand-in pm2, systemctl and sudo executables on PATH.
// ABOUTME: Checks that start goes back to the supervisor that stopped the app.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use stevedore::supervisor::{SupervisorBridge, SupervisorTarget};
use tempfile::TempDir;

/// Writes an executable script that logs its invocation and then runs `body`.
fn fake_binary(bin: &Path, log: &Path, name: &str, body: &str) {
    let script = format!(
        "#!/bin/sh\necho \"{name} $*\" >> \"{}\"\n{body}\n",
        log.display()
    );
    let path = bin.join(name);
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

struct FakeHost {
    _dir: TempDir,
    bin: PathBuf,
    log: PathBuf,
    live: PathBuf,
}

impl FakeHost {
    fn new(pm2_knows_app: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        let live = dir.path().join("live");
        fs::create_dir_all(&bin).unwrap();
        fs::create_dir_all(&live).unwrap();
        let log = dir.path().join("calls.log");
        fs::write(&log, "").unwrap();

        let describe_status = if pm2_knows_app { 0 } else { 1 };
        fake_binary(
            &bin,
            &log,
            "pm2",
            &format!("if [ \"$1\" = describe ]; then exit {describe_status}; fi\nexit 0"),
        );
        fake_binary(&bin, &log, "systemctl", "exit 0");
        fake_binary(
            &bin,
            &log,
            "sudo",
            "if [ \"$1\" = -n ]; then shift; fi\nexec \"$@\"",
        );

        Self {
            _dir: dir,
            bin,
            log,
            live,
        }
    }

    fn target(&self) -> SupervisorTarget {
        SupervisorTarget {
            app_name: "blog".to_string(),
            live_dir: self.live.clone(),
            entrypoint: Some("index.js".to_string()),
            unit: "blog.service".to_string(),
        }
    }

    fn calls(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Stop then start through the default bridge with only the fakes on PATH.
    fn stop_then_start(&self) -> (Option<&'static str>, Option<&'static str>) {
        temp_env::with_var("PATH", Some(&self.bin), || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async {
                let bridge = SupervisorBridge::with_defaults(Duration::from_secs(10));
                let target = self.target();
                let stopped = bridge.stop(&target).await.unwrap();
                let started = bridge.start_or_restart(&target).await.unwrap();
                (stopped, started)
            })
        })
    }
}

#[test]
fn systemd_unit_keeps_the_app_when_pm2_does_not_know_it() {
    let host = FakeHost::new(false);

    let (stopped, started) = host.stop_then_start();

    assert_eq!(stopped, Some("systemd"));
    assert_eq!(started, Some("systemd"));

    let calls = host.calls();
    assert!(
        calls.iter().any(|c| c.ends_with("restart blog.service")),
        "systemd was not restarted: {calls:?}"
    );
    assert!(
        !calls.iter().any(|c| c.starts_with("pm2 start")),
        "pm2 launched a second copy: {calls:?}"
    );
}

#[test]
fn pm2_keeps_the_app_it_already_runs() {
    let host = FakeHost::new(true);

    let (stopped, started) = host.stop_then_start();

    assert_eq!(stopped, Some("pm2"));
    assert_eq!(started, Some("pm2"));

    let calls = host.calls();
    assert!(calls.contains(&"pm2 stop blog".to_string()), "{calls:?}");
    assert!(
        calls.contains(&"pm2 restart blog --update-env".to_string()),
        "{calls:?}"
    );
    assert!(!calls.iter().any(|c| c.starts_with("systemctl restart")));
}
