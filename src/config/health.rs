// ABOUTME: Post-restart health probe configuration.
// ABOUTME: Candidate ports, probe paths, settle delay, and per-probe timeout.

use nonempty::NonEmpty;
use serde::Deserialize;
use std::time::Duration;

use super::deserialize::deserialize_ports;

#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "default_ports", deserialize_with = "deserialize_ports")]
    pub ports: NonEmpty<u16>,

    #[serde(default = "default_paths")]
    pub paths: Vec<String>,

    #[serde(default = "default_settle_delay", with = "humantime_serde")]
    pub settle_delay: Duration,

    #[serde(default = "default_probe_timeout", with = "humantime_serde")]
    pub probe_timeout: Duration,
}

fn default_ports() -> NonEmpty<u16> {
    let mut ports = NonEmpty::new(3000);
    for port in [8080, 4000, 5000] {
        ports.push(port);
    }
    ports
}

fn default_paths() -> Vec<String> {
    vec!["/health".to_string(), "/".to_string()]
}

fn default_settle_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(2)
}

impl Default for HealthConfig {
    fn default() -> Self {
        HealthConfig {
            ports: default_ports(),
            paths: default_paths(),
            settle_delay: default_settle_delay(),
            probe_timeout: default_probe_timeout(),
        }
    }
}
