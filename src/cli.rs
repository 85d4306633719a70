use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Profile, Settings};

// Include shadow-rs generated build information
use shadow_rs::shadow;
shadow!(build);

/// Placeholder printed instead of secret material
const REDACTED: &str = "********";

/// Configuration resolver for the webmis backend
#[derive(Parser, Debug)]
#[command(name = "webmis-config")]
#[command(about = "Resolve and inspect webmis deployment configuration")]
#[command(long_about = "
Resolves the configuration bundle of a webmis deployment profile by layering
baseline defaults, the profile table, optional TOML files, the deployment
manifest (version.json) and environment variables.

EXAMPLES:
    # Validate the configuration of the active profile
    webmis-config check

    # Validate the production configuration
    webmis-config --env production check

    # Print the resolved development bundle with secrets redacted
    webmis-config --env development show

    # Resolve against a non-default configuration directory and manifest
    webmis-config --config-dir /etc/webmis --manifest /opt/webmis/version.json check
")]
#[command(version = build::CLAP_LONG_VERSION)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Profile to resolve
    ///
    /// An unknown name falls back to the default profile. When omitted, the
    /// profile is read from the WEBMIS_APP_ENV environment variable.
    #[arg(short, long, value_name = "PROFILE")]
    pub env: Option<String>,

    /// Configuration directory holding {profile}.toml and local.toml
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Path of the deployment manifest
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Enable verbose logging
    ///
    /// Cannot be used with --quiet.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    ///
    /// Cannot be used with --verbose.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve and validate the configuration bundle
    ///
    /// Exits nonzero when resolution fails, so deployments can verify a
    /// profile before starting the application.
    Check,

    /// Resolve the configuration bundle and print it as TOML
    ///
    /// Secret material (secret key, share passwords, integration keys) is
    /// redacted; pass --reveal to print it anyway.
    Show {
        /// Print secret material instead of redacting it
        #[arg(long)]
        reveal: bool,
    },
}

impl Cli {
    /// Effective log level from the --verbose/--quiet flags
    pub fn log_level(&self) -> Option<&'static str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("error")
        } else {
            None
        }
    }

    /// Build a loader from the command-line overrides
    pub fn loader(&self) -> ConfigLoader {
        let mut loader = ConfigLoader::new();

        if let Some(name) = &self.env {
            loader = loader.with_profile(Profile::from_name_or_default(name));
        }
        if let Some(dir) = &self.config_dir {
            loader = loader.with_config_dir(dir);
        }
        if let Some(path) = &self.manifest {
            loader = loader.with_manifest_path(path);
        }

        loader
    }
}

/// Run the `check` subcommand
pub fn run_check(loader: &ConfigLoader) -> Result<(), ConfigError> {
    let profile = loader.profile();
    let settings = loader.load()?;

    tracing::info!(
        profile = %profile,
        database = %display_url(&settings.database.url),
        build_date = settings.application.build_date.as_deref().unwrap_or("-"),
        "configuration is valid"
    );
    println!("configuration OK for profile '{}'", profile);

    Ok(())
}

/// Run the `show` subcommand
pub fn run_show(loader: &ConfigLoader, reveal: bool) -> Result<(), ConfigError> {
    let mut settings = loader.load()?;

    if !reveal {
        redact(&mut settings);
    }

    let rendered = toml::to_string_pretty(&settings)
        .map_err(|e| ConfigError::ParseError(format!("Failed to render settings: {}", e)))?;
    println!("# profile: {}", loader.profile());
    print!("{}", rendered);

    Ok(())
}

/// Blank out secret material before printing
fn redact(settings: &mut Settings) {
    settings.security.secret_key = REDACTED.to_string();

    if !settings.integration.egisz_key.is_empty() {
        settings.integration.egisz_key = REDACTED.to_string();
    }
    if !settings.integration.netrika_key.is_empty() {
        settings.integration.netrika_key = REDACTED.to_string();
    }

    for share in settings.smb.pdf_shares.values_mut() {
        if !share.password.is_empty() {
            share.password = REDACTED.to_string();
        }
    }
    if let Some(share) = settings.smb.emdr.as_mut() {
        if !share.password.is_empty() {
            share.password = REDACTED.to_string();
        }
    }
}

/// Database URL with the userinfo part stripped, for log output
fn display_url(url: &str) -> String {
    if url.is_empty() {
        return "-".to_string();
    }
    match url.split_once("://") {
        Some((scheme, rest)) => match rest.split_once('@') {
            Some((_userinfo, host)) => format!("{}://{}", scheme, host),
            None => url.to_string(),
        },
        None => url.to_string(),
    }
}
