//! Configuration validation logic
//!
//! Validation runs once, after all layers are merged, so every rule sees the
//! final value of a field regardless of which layer supplied it.

use crate::config::environment::Profile;
use crate::config::error::ConfigError;
use crate::config::settings::{
    AuxDatabasesConfig, DatabaseConfig, DEV_SECRET_KEY, LoggerSettings, SecurityConfig,
    ServerConfig, Settings, SmbConfig, SmbShare,
};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Minimum accepted secret key length
const MIN_SECRET_KEY_LEN: usize = 12;

impl ServerConfig {
    /// Validate server configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        if self.host.trim().is_empty() {
            return Err(ConfigError::validation(
                "server.host",
                "Bind address must not be empty.",
            ));
        }

        if self.websocket_host.trim().is_empty() {
            return Err(ConfigError::validation(
                "server.websocket_host",
                "Websocket host must not be empty.",
            ));
        }

        Ok(())
    }
}

impl SecurityConfig {
    /// Validate security configuration
    ///
    /// # Validation Rules
    /// - Secret key must not be empty and must have a minimum length
    /// - In production the development placeholder is rejected, the secret
    ///   must come from the manifest, a configuration file or the environment
    /// - JWT expiration must be positive
    pub fn validate(&self, profile: Profile) -> Result<(), ConfigError> {
        if self.secret_key.is_empty() {
            return Err(ConfigError::validation(
                "security.secret_key",
                "Secret key cannot be empty",
            ));
        }

        if self.secret_key.len() < MIN_SECRET_KEY_LEN {
            return Err(ConfigError::ValidationError {
                field: "security.secret_key".to_string(),
                message: format!(
                    "Secret key should be at least {} characters",
                    MIN_SECRET_KEY_LEN
                ),
            });
        }

        if profile == Profile::Production && self.secret_key == DEV_SECRET_KEY {
            return Err(ConfigError::validation(
                "security.secret_key",
                "The development secret key is not allowed in production. \
                 Supply one via the deployment manifest or WEBMIS_SECRET_KEY.",
            ));
        }

        if self.jwt_expiration_hours <= 0 {
            return Err(ConfigError::validation(
                "security.jwt_expiration_hours",
                "JWT expiration must be positive",
            ));
        }

        Ok(())
    }
}

impl DatabaseConfig {
    /// Validate the primary database configuration
    ///
    /// # Validation Rules
    /// - In production the URL is required
    /// - A non-empty URL must have a known scheme
    /// - Pool size must be greater than 0
    pub fn validate(&self, profile: Profile) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            if profile == Profile::Production {
                return Err(ConfigError::validation(
                    "database.url",
                    "Database URL is required in production. \
                     Supply one via configuration or WEBMIS_DATABASE_URL.",
                ));
            }
        } else if !is_valid_database_url(&self.url) {
            return Err(ConfigError::validation(
                "database.url",
                "Invalid database URL format. Expected format: scheme://[user@]host[:port]/database",
            ));
        }

        if self.pool_size == 0 {
            return Err(ConfigError::validation(
                "database.pool_size",
                "Pool size must be greater than 0.",
            ));
        }

        Ok(())
    }
}

impl AuxDatabasesConfig {
    /// Validate the satellite database connections
    ///
    /// All connections are optional; only non-empty PostgreSQL URLs are
    /// checked for a valid scheme. The ODBC connection strings have no
    /// scheme to check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let urls = [
            ("aux_databases.log_url", &self.log_url),
            ("aux_databases.pharmacy_url", &self.pharmacy_url),
            ("aux_databases.egisz_url", &self.egisz_url),
            ("aux_databases.emdr_url", &self.emdr_url),
            ("aux_databases.fias_url", &self.fias_url),
        ];

        for (field, url) in urls {
            if !url.is_empty() && !is_valid_database_url(url) {
                return Err(ConfigError::ValidationError {
                    field: field.to_string(),
                    message: format!("Invalid database URL '{}'", url),
                });
            }
        }

        Ok(())
    }
}

impl SmbShare {
    fn validate(&self, field: &str) -> Result<(), ConfigError> {
        if self.server_ip.trim().is_empty() && self.server_name.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: field.to_string(),
                message: "An SMB share needs a server name or a server IP.".to_string(),
            });
        }

        if self.folder.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: format!("{}.folder", field),
                message: "An SMB share needs a target folder.".to_string(),
            });
        }

        Ok(())
    }
}

impl SmbConfig {
    /// Validate configured SMB shares
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (id, share) in &self.pdf_shares {
            share.validate(&format!("smb.pdf_shares.{}", id))?;
        }

        if let Some(share) = &self.emdr {
            share.validate("smb.emdr")?;
        }

        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

impl Settings {
    /// Validate the fully merged settings bundle
    pub fn validate(&self, profile: Profile) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.security.validate(profile)?;
        self.database.validate(profile)?;
        self.aux_databases.validate()?;
        self.smb.validate()?;
        self.logger.validate()?;
        Ok(())
    }
}

/// Check if a database URL has a known scheme
fn is_valid_database_url(url: &str) -> bool {
    let valid_schemes = ["postgres://", "postgresql://", "mysql://", "mssql://"];

    valid_schemes.iter().any(|scheme| url.starts_with(scheme))
}
