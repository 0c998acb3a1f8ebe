// ABOUTME: Minimal package.json reader.
// ABOUTME: Only the fields that decide which release steps run are parsed.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::InstallError;

pub const MANIFEST_FILE: &str = "package.json";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub main: Option<String>,

    #[serde(default)]
    pub scripts: HashMap<String, String>,
}

impl PackageManifest {
    /// Read `package.json` from `dir`. `Ok(None)` when there is none.
    pub fn load(dir: &Path) -> Result<Option<Self>, InstallError> {
        let path = dir.join(MANIFEST_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(InstallError::Manifest(e.to_string())),
        };
        let manifest =
            serde_json::from_str(&content).map_err(|e| InstallError::Manifest(e.to_string()))?;
        Ok(Some(manifest))
    }

    pub fn has_script(&self, name: &str) -> bool {
        self.scripts.contains_key(name)
    }
}
