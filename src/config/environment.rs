//! Deployment profile selection

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;

/// Deployment profile
///
/// Selects which override layer is applied on top of the baseline settings.
/// The profile is chosen once at process startup and never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Development profile (also the `default` profile)
    Development,
    /// Testing profile
    Testing,
    /// Production profile
    Production,
}

impl Profile {
    /// Environment variable naming the active profile
    pub const ENV_VAR: &'static str = "WEBMIS_APP_ENV";

    /// Read the profile from the `WEBMIS_APP_ENV` environment variable
    ///
    /// Returns the default profile if the variable is not set or does not
    /// name a known profile.
    pub fn from_env() -> Self {
        match std::env::var(Self::ENV_VAR) {
            Ok(s) => Self::from_name_or_default(&s),
            Err(_) => Self::default(),
        }
    }

    /// Look up a profile by name, falling back to the default profile
    ///
    /// An unknown profile name is not an error: the caller gets the default
    /// profile, matching the fixed profile table where `default` aliases
    /// development. The fallback is logged so misspelled deployments are
    /// visible in startup output.
    pub fn from_name_or_default(name: &str) -> Self {
        match name.parse() {
            Ok(profile) => profile,
            Err(_) => {
                let fallback = Self::default();
                if name != "default" {
                    tracing::warn!(
                        requested = name,
                        fallback = fallback.as_str(),
                        "unknown profile name, using default profile"
                    );
                }
                fallback
            }
        }
    }

    /// Convert the profile to a string slice
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Development => "development",
            Profile::Testing => "testing",
            Profile::Production => "production",
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Profile::Development
    }
}

impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Profile::Development),
            "testing" | "test" => Ok(Profile::Testing),
            "production" | "prod" => Ok(Profile::Production),
            _ => Err(ConfigError::EnvVarError(format!(
                "Invalid profile '{}'. Valid values are: development, testing, production",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
