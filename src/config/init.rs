// ABOUTME: Config scaffolding for new deployments.
// ABOUTME: Creates stevedore.yml template files.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::AppName;

use super::{CONFIG_FILENAME, Config};

pub fn init_config(
    dir: &Path,
    app: Option<&str>,
    live_dir: Option<&Path>,
    force: bool,
) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::template();

    if let Some(a) = app {
        config.app_name = AppName::new(a).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.live_dir = Path::new("/srv").join(config.app_name.as_str());
    }

    if let Some(l) = live_dir {
        config.live_dir = l.to_path_buf();
    }

    let yaml = generate_template_yaml(&config);
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    format!(
        r#"app_name: {}
live_dir: {}
backup_dir: {}
retained_backups: {}

health:
  ports: [3000, 8080, 4000, 5000]
  settle_delay: 5s

# Commands run inside live_dir when package.json is present.
# commands:
#   install: "npm ci --omit=dev"
#   build: "npm run build"
#   migrate: "npm run migrate"
#   timeout: 10m

# install:
#   strategy: mirror
#   exclude: [node_modules, .env, logs, "*.log"]

# log_file: /var/log/stevedore.log
"#,
        config.app_name,
        config.live_dir.display(),
        config.backup_dir.display(),
        config.retained_backups,
    )
}
