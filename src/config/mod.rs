//! Configuration management module for webmis-config
//!
//! This module resolves the immutable settings bundle of a deployment
//! profile by layering, from lowest to highest priority:
//!
//! 1. Baseline defaults baked into [`Settings`]
//! 2. The fixed profile table (development, testing, production)
//! 3. `{profile}.toml` and `local.toml` from the configuration directory
//! 4. `WEBMIS_*` environment variables
//! 5. The deployment manifest (`version.json`): secret key and build date
//! 6. `WEBMIS_SECRET_KEY` / `WEBMIS_DATABASE_URL`, which beat the manifest
//!
//! Resolution happens once at process startup; the returned [`Settings`]
//! value is passed explicitly to whoever needs it and never mutated.

pub mod environment;
pub mod error;
pub mod loader;
pub mod manifest;
pub mod settings;
pub mod validation;

// Re-export public types
pub use environment::Profile;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use manifest::Manifest;
pub use settings::Settings;

/// Resolve the fully merged settings bundle for a profile name
///
/// An unknown profile name falls back to the default profile; it is not an
/// error. Everything else that can go wrong during resolution (malformed
/// files, failed validation) is.
pub fn resolve(profile_name: &str) -> Result<Settings, ConfigError> {
    ConfigLoader::new()
        .with_profile(Profile::from_name_or_default(profile_name))
        .load()
}
