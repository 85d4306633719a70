//! Configuration loader for webmis-config
//!
//! This module provides the `ConfigLoader` struct that handles loading
//! configuration from multiple sources with proper precedence.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};

use crate::config::environment::Profile;
use crate::config::error::ConfigError;
use crate::config::manifest::{DEFAULT_MANIFEST_PATH, Manifest};
use crate::config::settings::Settings;

/// Environment variable for the configuration directory
const CONFIG_DIR_ENV: &str = "WEBMIS_CONFIG_DIR";

/// Default configuration directory
const DEFAULT_CONFIG_DIR: &str = "config";

/// Environment variable prefix for configuration overrides
const ENV_PREFIX: &str = "WEBMIS";

/// Separator for nested configuration keys in environment variables
const ENV_SEPARATOR: &str = "__";

/// Well-known override for the secret key
pub const SECRET_KEY_ENV: &str = "WEBMIS_SECRET_KEY";

/// Well-known override for the primary database URL
pub const DATABASE_URL_ENV: &str = "WEBMIS_DATABASE_URL";

/// Configuration loader that handles layered configuration loading
///
/// Sources in order of priority (lowest to highest):
/// 1. Baseline defaults baked into [`Settings`]
/// 2. The fixed per-profile override table
/// 3. `{profile}.toml` from the configuration directory (optional)
/// 4. `local.toml` from the configuration directory (optional)
/// 5. `WEBMIS_*` environment variables
/// 6. The deployment manifest (`version.json`), secret key and build date
/// 7. `WEBMIS_SECRET_KEY` / `WEBMIS_DATABASE_URL`, which beat the manifest
#[derive(Debug)]
pub struct ConfigLoader {
    /// Configuration directory path
    config_dir: PathBuf,
    /// Deployment manifest path
    manifest_path: PathBuf,
    /// Profile being resolved
    profile: Profile,
}

impl ConfigLoader {
    /// Create a new configuration loader
    ///
    /// Reads `WEBMIS_CONFIG_DIR` for the configuration directory and
    /// `WEBMIS_APP_ENV` for the active profile. Neither variable is
    /// required.
    pub fn new() -> Self {
        let config_dir = std::env::var(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_DIR));

        Self {
            config_dir,
            manifest_path: PathBuf::from(DEFAULT_MANIFEST_PATH),
            profile: Profile::from_env(),
        }
    }

    /// Override the profile to resolve
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    /// Override the configuration directory
    pub fn with_config_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config_dir = dir.into();
        self
    }

    /// Override the deployment manifest path
    pub fn with_manifest_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.manifest_path = path.into();
        self
    }

    /// Get the profile this loader resolves
    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Get the configuration directory path
    #[allow(dead_code)]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Load and validate the fully merged settings bundle
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - a configuration file exists but cannot be parsed
    /// - the deployment manifest exists but cannot be parsed
    /// - the merged settings fail validation
    ///
    /// Missing optional files and unset environment variables are not
    /// errors; the lower layers stay in effect.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let config = self.build_config()?;
        let mut settings: Settings = config.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {}", e))
        })?;

        self.apply_manifest(&mut settings)?;
        Self::apply_env_overrides(&mut settings);

        settings.validate(self.profile)?;

        Ok(settings)
    }

    /// Build the config::Config instance from the layered sources
    fn build_config(&self) -> Result<Config, ConfigError> {
        let mut builder = Config::builder();

        // 1. Fixed profile table (distinct database URLs per profile)
        for (key, value) in Self::profile_table(self.profile) {
            builder = builder.set_default(*key, *value)?;
        }

        // 2. {profile}.toml (optional)
        let profile_path = self
            .config_dir
            .join(format!("{}.toml", self.profile.as_str()));
        builder = Self::add_file_source(builder, &profile_path);

        // 3. local.toml (optional, not committed to version control)
        let local_path = self.config_dir.join("local.toml");
        builder = Self::add_file_source(builder, &local_path);

        // 4. WEBMIS_* environment variables
        // WEBMIS_SERVER__PORT -> server.port
        builder = Self::add_env_source(builder);

        builder.build().map_err(ConfigError::from)
    }

    /// Per-profile override table
    ///
    /// These are the values the original deployment distinguished per
    /// profile. Development and testing point at local databases;
    /// production carries no literals at all, its connection strings and
    /// secrets arrive via configuration files or the environment.
    fn profile_table(profile: Profile) -> &'static [(&'static str, &'static str)] {
        match profile {
            Profile::Development => &[
                ("database.url", "postgresql://postgres@localhost:5432/webmis_master"),
                ("aux_databases.log_url", "postgresql://postgres@localhost:5432/webmislog"),
                ("aux_databases.pharmacy_url", "postgresql://postgres@localhost:5432/medaccount"),
                ("aux_databases.egisz_url", "postgresql://postgres@localhost:5432/egisz"),
                ("aux_databases.emdr_url", "postgresql://postgres@localhost:5432/emdr"),
                ("aux_databases.fias_url", "postgresql://postgres@localhost:5433/fias"),
                ("logger.level", "debug"),
            ],
            Profile::Testing => &[
                ("database.url", "postgresql://postgres@localhost:5432/webmis_test"),
            ],
            Profile::Production => &[],
        }
    }

    /// Add an optional file source to the config builder
    fn add_file_source(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        path: &Path,
    ) -> config::ConfigBuilder<config::builder::DefaultState> {
        builder.add_source(
            File::new(path.to_str().unwrap_or_default(), FileFormat::Toml).required(false),
        )
    }

    /// Add environment variable source to the config builder
    ///
    /// Environment variables with prefix `WEBMIS_` are mapped to
    /// configuration keys. Double underscores (`__`) separate nested keys.
    ///
    /// Examples:
    /// - `WEBMIS_SERVER__PORT` -> `server.port`
    /// - `WEBMIS_DATABASE__POOL_SIZE` -> `database.pool_size`
    fn add_env_source(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> config::ConfigBuilder<config::builder::DefaultState> {
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true),
        )
    }

    /// Apply the deployment manifest, when one is present
    ///
    /// The manifest replaces the secret key and records the build date. A
    /// manifest that exists but cannot be parsed aborts the load.
    fn apply_manifest(&self, settings: &mut Settings) -> Result<(), ConfigError> {
        if let Some(manifest) = Manifest::load(&self.manifest_path)? {
            tracing::info!(
                build_date = %manifest.build_date,
                manifest = %self.manifest_path.display(),
                "applying deployment manifest"
            );
            settings.security.secret_key = manifest.passkey;
            settings.application.build_date = Some(manifest.build_date);
        }
        Ok(())
    }

    /// Apply the well-known override variables
    ///
    /// Applied after the manifest so that an operator-set variable wins over
    /// everything else, including the build pipeline.
    fn apply_env_overrides(settings: &mut Settings) {
        if let Ok(value) = std::env::var(SECRET_KEY_ENV) {
            if !value.is_empty() {
                settings.security.secret_key = value;
            }
        }
        if let Ok(value) = std::env::var(DATABASE_URL_ENV) {
            if !value.is_empty() {
                settings.database.url = value;
            }
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::DEV_SECRET_KEY;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Global mutex to ensure tests run sequentially to avoid env var conflicts
    static TEST_MUTEX: Mutex<()> = Mutex::new(());

    /// Helper to create a temporary config directory with files
    fn setup_config_dir(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        for (name, content) in files {
            let path = temp_dir.path().join(name);
            fs::write(&path, content).expect("Failed to write config file");
        }
        temp_dir
    }

    /// A loader that cannot see a stray version.json in the working directory
    fn isolated_loader(temp_dir: &TempDir) -> ConfigLoader {
        ConfigLoader::new()
            .with_config_dir(temp_dir.path())
            .with_manifest_path(temp_dir.path().join("version.json"))
    }

    /// Helper to safely set environment variables for a test
    struct EnvGuard {
        vars_to_restore: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            let mut guard = Self {
                vars_to_restore: Vec::new(),
            };
            // Start every test from a clean WEBMIS environment
            for key in [
                "WEBMIS_CONFIG_DIR",
                "WEBMIS_APP_ENV",
                SECRET_KEY_ENV,
                DATABASE_URL_ENV,
                "WEBMIS_SERVER__PORT",
                "WEBMIS_DATABASE__URL",
            ] {
                guard.remove(key);
            }
            guard
        }

        fn set(&mut self, key: &str, value: &str) {
            let original = std::env::var(key).ok();
            self.vars_to_restore.push((key.to_string(), original));
            unsafe {
                std::env::set_var(key, value);
            }
        }

        fn remove(&mut self, key: &str) {
            let original = std::env::var(key).ok();
            self.vars_to_restore.push((key.to_string(), original));
            unsafe {
                std::env::remove_var(key);
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            // Restore in reverse so the earliest snapshot wins
            for (key, original_value) in self.vars_to_restore.iter().rev() {
                unsafe {
                    match original_value {
                        Some(value) => std::env::set_var(key, value),
                        None => std::env::remove_var(key),
                    }
                }
            }
        }
    }

    #[test]
    fn test_loader_defaults() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let _env = EnvGuard::new();

        let loader = ConfigLoader::new();
        assert_eq!(loader.config_dir, PathBuf::from("config"));
        assert_eq!(loader.manifest_path, PathBuf::from("version.json"));
        assert_eq!(loader.profile(), Profile::Development);
    }

    #[test]
    fn test_loader_reads_profile_and_dir_from_env() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();

        env.set("WEBMIS_CONFIG_DIR", "/etc/webmis");
        env.set("WEBMIS_APP_ENV", "testing");

        let loader = ConfigLoader::new();
        assert_eq!(loader.config_dir, PathBuf::from("/etc/webmis"));
        assert_eq!(loader.profile(), Profile::Testing);
    }

    #[test]
    fn test_all_profiles_resolve_baseline_keys() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[]);

        // Production needs its secret and database injected
        env.set(SECRET_KEY_ENV, "operator-provided-secret");
        env.set(DATABASE_URL_ENV, "postgresql://mis@db-host:5432/webmis");

        for name in ["development", "testing", "production", "default"] {
            let settings = isolated_loader(&temp_dir)
                .with_profile(Profile::from_name_or_default(name))
                .load()
                .unwrap_or_else(|e| panic!("profile '{}' should resolve: {}", name, e));

            // Every baseline key is present in the merged bundle
            assert_eq!(settings.application.name, "webmis");
            assert_eq!(settings.server.port, 5000);
            assert_eq!(settings.database.pool_size, 150);
            assert_eq!(settings.database.max_overflow, 200);
            assert_eq!(settings.paths.filelst_folder, "/PROG_38/TEMP/FILELST_FOLDER/");
            assert!(settings.features.registry);
            assert!(!settings.integration.main_lpu.is_nil());
        }
    }

    #[test]
    fn test_profile_table_sets_distinct_database_urls() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let _env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[]);

        let dev = isolated_loader(&temp_dir)
            .with_profile(Profile::Development)
            .load()
            .expect("development should resolve");
        assert_eq!(dev.database.url, "postgresql://postgres@localhost:5432/webmis_master");
        assert_eq!(dev.aux_databases.log_url, "postgresql://postgres@localhost:5432/webmislog");
        assert_eq!(dev.logger.level, "debug");

        let testing = isolated_loader(&temp_dir)
            .with_profile(Profile::Testing)
            .load()
            .expect("testing should resolve");
        assert_eq!(testing.database.url, "postgresql://postgres@localhost:5432/webmis_test");
        assert_eq!(testing.logger.level, "info");
        assert_eq!(testing.aux_databases.log_url, "");
    }

    #[test]
    fn test_unknown_profile_resolves_like_default() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let _env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[]);

        let unknown = isolated_loader(&temp_dir)
            .with_profile(Profile::from_name_or_default("staging"))
            .load()
            .expect("unknown profile should resolve");
        let default = isolated_loader(&temp_dir)
            .with_profile(Profile::from_name_or_default("default"))
            .load()
            .expect("default profile should resolve");

        assert_eq!(unknown, default);
    }

    #[test]
    fn test_no_manifest_keeps_baseline_secret() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let _env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[]);

        let settings = isolated_loader(&temp_dir)
            .load()
            .expect("Should load settings");
        assert_eq!(settings.security.secret_key, DEV_SECRET_KEY);
        assert!(settings.application.build_date.is_none());
    }

    #[test]
    fn test_manifest_overrides_secret_and_build_date() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let _env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[(
            "version.json",
            r#"{"passkey": "pipeline-secret-91c3", "Build_date": "2025-11-03 14:22:05"}"#,
        )]);

        let settings = isolated_loader(&temp_dir)
            .load()
            .expect("Should load settings");
        assert_eq!(settings.security.secret_key, "pipeline-secret-91c3");
        assert_eq!(
            settings.application.build_date.as_deref(),
            Some("2025-11-03 14:22:05")
        );
    }

    #[test]
    fn test_malformed_manifest_aborts_load() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let _env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[("version.json", "{ definitely not json")]);

        let result = isolated_loader(&temp_dir).load();
        assert!(matches!(result, Err(ConfigError::ManifestError { .. })));
    }

    #[test]
    fn test_secret_key_env_beats_manifest() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[(
            "version.json",
            r#"{"passkey": "pipeline-secret-91c3", "Build_date": "2025-11-03 14:22:05"}"#,
        )]);

        env.set(SECRET_KEY_ENV, "operator-secret-wins");

        let settings = isolated_loader(&temp_dir)
            .load()
            .expect("Should load settings");
        assert_eq!(settings.security.secret_key, "operator-secret-wins");
        // The build date is still recorded
        assert!(settings.application.build_date.is_some());
    }

    #[test]
    fn test_database_url_env_beats_profile_literal() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[]);

        env.set(DATABASE_URL_ENV, "postgresql://mis@db-host:5432/override");

        let settings = isolated_loader(&temp_dir)
            .with_profile(Profile::Development)
            .load()
            .expect("Should load settings");
        assert_eq!(settings.database.url, "postgresql://mis@db-host:5432/override");
    }

    #[test]
    fn test_profile_toml_overrides_table() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let _env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[(
            "development.toml",
            r#"
[server]
port = 8080

[database]
url = "postgresql://postgres@localhost:5432/webmis_branch"
"#,
        )]);

        let settings = isolated_loader(&temp_dir)
            .with_profile(Profile::Development)
            .load()
            .expect("Should load settings");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.database.url, "postgresql://postgres@localhost:5432/webmis_branch");
        // Values not in the file come from lower layers
        assert_eq!(settings.database.pool_size, 150);
    }

    #[test]
    fn test_local_toml_overrides_profile_toml() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let _env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[
            ("development.toml", "[server]\nport = 8080\n"),
            ("local.toml", "[server]\nport = 9999\n"),
        ]);

        let settings = isolated_loader(&temp_dir)
            .load()
            .expect("Should load settings");
        assert_eq!(settings.server.port, 9999);
    }

    #[test]
    fn test_prefixed_env_var_overrides_files() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[("development.toml", "[server]\nport = 8080\n")]);

        env.set("WEBMIS_SERVER__PORT", "4000");

        let settings = isolated_loader(&temp_dir)
            .load()
            .expect("Should load settings");
        assert_eq!(settings.server.port, 4000);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let _env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[
            ("development.toml", "[features]\nauto_niblz = true\n"),
            (
                "version.json",
                r#"{"passkey": "pipeline-secret-91c3", "Build_date": "2025-11-03 14:22:05"}"#,
            ),
        ]);

        let first = isolated_loader(&temp_dir).load().expect("first load");
        let second = isolated_loader(&temp_dir).load().expect("second load");
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_by_profile_name() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let _env = EnvGuard::new();

        // The crate root carries neither a config directory nor a manifest,
        // so this resolves purely from baseline and profile table.
        let settings = crate::config::resolve("development").expect("resolve by name");
        assert_eq!(
            settings.database.url,
            "postgresql://postgres@localhost:5432/webmis_master"
        );

        let fallback = crate::config::resolve("no-such-profile").expect("fallback by name");
        assert_eq!(settings, fallback);
    }

    #[test]
    fn test_production_rejects_placeholder_secret() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[]);

        env.set(DATABASE_URL_ENV, "postgresql://mis@db-host:5432/webmis");

        let result = isolated_loader(&temp_dir)
            .with_profile(Profile::Production)
            .load();
        assert!(matches!(
            result,
            Err(ConfigError::ValidationError { ref field, .. }) if field == "security.secret_key"
        ));
    }

    #[test]
    fn test_production_requires_database_url() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[]);

        env.set(SECRET_KEY_ENV, "operator-provided-secret");

        let result = isolated_loader(&temp_dir)
            .with_profile(Profile::Production)
            .load();
        assert!(matches!(
            result,
            Err(ConfigError::ValidationError { ref field, .. }) if field == "database.url"
        ));
    }
}
