// ABOUTME: The immutable input of one deployment run.
// ABOUTME: Rejects empty values and URLs without an http(s) scheme before any work starts.

use serde::Serialize;

use super::error::{DeployError, InvalidRequestSnafu};
use snafu::ensure;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentRequest {
    artifact_url: String,
    release_tag: String,
}

impl DeploymentRequest {
    pub fn new(
        artifact_url: impl Into<String>,
        release_tag: impl Into<String>,
    ) -> Result<Self, DeployError> {
        let artifact_url = artifact_url.into().trim().to_string();
        let release_tag = release_tag.into().trim().to_string();

        ensure!(
            !artifact_url.is_empty(),
            InvalidRequestSnafu {
                reason: "artifact URL is empty"
            }
        );
        ensure!(
            artifact_url.starts_with("http://") || artifact_url.starts_with("https://"),
            InvalidRequestSnafu {
                reason: format!("artifact URL must use http or https: {artifact_url}")
            }
        );
        ensure!(
            !release_tag.is_empty(),
            InvalidRequestSnafu {
                reason: "release tag is empty"
            }
        );

        Ok(Self {
            artifact_url,
            release_tag,
        })
    }

    pub fn artifact_url(&self) -> &str {
        &self.artifact_url
    }

    pub fn release_tag(&self) -> &str {
        &self.release_tag
    }
}
