//! Deployment manifest (`version.json`)
//!
//! The deployment pipeline drops a small JSON file next to the binary with
//! the build secret and the build timestamp. The file is optional: a missing
//! manifest means the baseline secret stays in effect. A manifest that exists
//! but cannot be parsed is a fatal startup error, the process must not come
//! up with indeterminate configuration.

use std::path::Path;

use serde::Deserialize;

use crate::config::error::ConfigError;

/// Default manifest location, relative to the working directory
pub const DEFAULT_MANIFEST_PATH: &str = "version.json";

/// Contents of the deployment manifest
///
/// Field names are fixed by the deployment pipeline that writes the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    /// Build-time secret key, replaces the baseline secret
    pub passkey: String,

    /// Build timestamp, recorded as `application.build_date`
    #[serde(rename = "Build_date")]
    pub build_date: String,
}

impl Manifest {
    /// Load the manifest from `path` if it exists
    ///
    /// Returns `Ok(None)` when the file is absent. Returns an error when the
    /// file exists but cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::manifest(path.display().to_string(), e.to_string()))?;

        let manifest: Manifest = serde_json::from_str(&contents)
            .map_err(|e| ConfigError::manifest(path.display().to_string(), e.to_string()))?;

        Ok(Some(manifest))
    }
}
