//! Configuration settings structures for webmis-config
//!
//! This module defines all configuration structures that can be loaded from
//! the profile table, TOML files, the deployment manifest and environment
//! variables.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Baseline secret key, only acceptable outside production
///
/// Deployments replace it through the manifest (`passkey`) or the
/// `WEBMIS_SECRET_KEY` environment variable.
pub const DEV_SECRET_KEY: &str = "dev-secret-key-change-me";

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "webmis".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_websocket_host() -> String {
    "127.0.0.1".to_string()
}

fn default_secret_key() -> String {
    DEV_SECRET_KEY.to_string()
}

fn default_jwt_expiration() -> i64 {
    24 // 1 day
}

fn default_pool_size() -> u32 {
    150
}

fn default_max_overflow() -> u32 {
    200
}

fn default_base_dir() -> String {
    ".".to_string()
}

fn default_filelst_folder() -> String {
    "/PROG_38/TEMP/FILELST_FOLDER/".to_string()
}

fn default_pdf_temp_dir() -> String {
    "/tmp/webmis/pdf/".to_string()
}

fn default_uno_source_dir() -> String {
    "/usr/lib64/python3.8/site-packages".to_string()
}

fn default_true() -> bool {
    true
}

fn default_netrika_uri() -> String {
    // Test endpoint of the regional terminology service; the production
    // endpoint is deployment-specific and injected via configuration.
    "http://r61-rc.zdrav.netrika.ru/nsi/fhir/term/".to_string()
}

fn default_main_lpu() -> Uuid {
    uuid::uuid!("6bd90610-1553-4851-b067-dffbb52ffa09")
}

fn default_cduser_mo() -> Uuid {
    uuid::uuid!("2c5b1cce-2d9a-4676-99a2-99c8f0f3b54b")
}

fn default_log_level() -> String {
    "info".to_string()
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Application basic information configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Application version
    #[serde(default = "default_app_version")]
    pub version: String,

    /// Build timestamp, set from the deployment manifest when one is present
    #[serde(default)]
    pub build_date: Option<String>,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
            build_date: None,
        }
    }
}

// ============================================================================
// Server Configuration
// ============================================================================

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host of the websocket notification relay
    #[serde(default = "default_websocket_host")]
    pub websocket_host: String,
}

impl ServerConfig {
    /// Get the full server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            websocket_host: default_websocket_host(),
        }
    }
}

// ============================================================================
// Security Configuration
// ============================================================================

/// Session and token signing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Secret key used for session and JWT signing
    ///
    /// The baseline value is a development placeholder. Production
    /// deployments must supply their own through the deployment manifest
    /// or the `WEBMIS_SECRET_KEY` environment variable.
    #[serde(default = "default_secret_key")]
    pub secret_key: String,

    /// JWT expiration time in hours
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_hours: i64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            secret_key: default_secret_key(),
            jwt_expiration_hours: default_jwt_expiration(),
        }
    }
}

// ============================================================================
// Database Configuration
// ============================================================================

/// Primary MIS database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL
    ///
    /// Empty in the baseline; each profile supplies its own, and
    /// `WEBMIS_DATABASE_URL` overrides all of them.
    #[serde(default)]
    pub url: String,

    /// Connection pool size
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Connections allowed beyond the pool size under load
    #[serde(default = "default_max_overflow")]
    pub max_overflow: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            pool_size: default_pool_size(),
            max_overflow: default_max_overflow(),
        }
    }
}

/// Secondary database connections
///
/// The MIS talks to several satellite databases: the audit log, the pharmacy
/// stock system, the federal reporting stores (EGISZ, EMDR), the address
/// registry (FIAS) and two legacy MSSQL sources reached over ODBC. All of
/// them are optional; an empty value disables the corresponding subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AuxDatabasesConfig {
    /// Audit log database URL
    #[serde(default)]
    pub log_url: String,

    /// Pharmacy stock database URL
    #[serde(default)]
    pub pharmacy_url: String,

    /// EGISZ reporting database URL
    #[serde(default)]
    pub egisz_url: String,

    /// EMDR document registry database URL
    #[serde(default)]
    pub emdr_url: String,

    /// FIAS address registry database URL
    #[serde(default)]
    pub fias_url: String,

    /// ODBC connection string of the legacy polyclinic MSSQL source
    #[serde(default)]
    pub lpu_dsn: String,

    /// ODBC connection string of the legacy hospitalization MSSQL source
    #[serde(default)]
    pub hospital_dsn: String,
}

// ============================================================================
// Paths Configuration
// ============================================================================

/// Filesystem locations used by the application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Application base directory
    #[serde(default = "default_base_dir")]
    pub base_dir: String,

    /// Exchange folder for FILELST batch files
    #[serde(default = "default_filelst_folder")]
    pub filelst_folder: String,

    /// Scratch directory for PDF rendering
    #[serde(default = "default_pdf_temp_dir")]
    pub pdf_temp_dir: String,

    /// Directory holding the UNO bridge libraries of the document converter
    #[serde(default = "default_uno_source_dir")]
    pub uno_source_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            filelst_folder: default_filelst_folder(),
            pdf_temp_dir: default_pdf_temp_dir(),
            uno_source_dir: default_uno_source_dir(),
        }
    }
}

// ============================================================================
// Feature Flags
// ============================================================================

/// Feature switches of the MIS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturesConfig {
    /// Patient registry module
    #[serde(default = "default_true")]
    pub registry: bool,

    /// Batch patient import
    #[serde(default)]
    pub import_patient: bool,

    /// RIR integration service
    #[serde(default)]
    pub rir_in_service: bool,

    /// Automatic insurance settlement export
    #[serde(default)]
    pub auto_niblz: bool,

    /// Automatic insurance settlement export after hospitalization
    #[serde(default = "default_true")]
    pub auto_niblz_post_hosp: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            registry: default_true(),
            import_patient: false,
            rir_in_service: false,
            auto_niblz: false,
            auto_niblz_post_hosp: default_true(),
        }
    }
}

// ============================================================================
// Integration Configuration
// ============================================================================

/// Keys and identifiers of federal and regional services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    /// Authorization key of the federal NSI terminology service
    ///
    /// Issued per organization on nsi.rosminzdrav.ru; empty disables
    /// federal dictionary lookups.
    #[serde(default)]
    pub egisz_key: String,

    /// Authorization key of the regional Netrika terminology service
    #[serde(default)]
    pub netrika_key: String,

    /// Base URI of the Netrika terminology service
    #[serde(default = "default_netrika_uri")]
    pub netrika_uri: String,

    /// Identifier of the main medical facility served by this deployment
    #[serde(default = "default_main_lpu")]
    pub main_lpu: Uuid,

    /// Identifier of the service user for document exchange
    #[serde(default = "default_cduser_mo")]
    pub cduser_mo: Uuid,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            egisz_key: String::new(),
            netrika_key: String::new(),
            netrika_uri: default_netrika_uri(),
            main_lpu: default_main_lpu(),
            cduser_mo: default_cduser_mo(),
        }
    }
}

// ============================================================================
// SMB Shares
// ============================================================================

/// A single SMB share the application writes documents to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SmbShare {
    /// Account used to authenticate against the share
    #[serde(default)]
    pub user: String,

    /// Account password; deployments inject it, the baseline is empty
    #[serde(default)]
    pub password: String,

    /// Name this client presents to the server
    #[serde(default)]
    pub client_machine: String,

    /// NetBIOS name of the file server
    #[serde(default)]
    pub server_name: String,

    /// IP address of the file server
    #[serde(default)]
    pub server_ip: String,

    /// Share folder documents are written into
    #[serde(default)]
    pub folder: String,

    /// Optional AD domain of the account
    #[serde(default)]
    pub domain: Option<String>,
}

/// SMB destinations for rendered documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SmbConfig {
    /// PDF print destinations, keyed by printer identifier
    #[serde(default)]
    pub pdf_shares: HashMap<Uuid, SmbShare>,

    /// Destination for signed EMDR documents
    #[serde(default)]
    pub emdr: Option<SmbShare>,
}

// ============================================================================
// Logger Settings
// ============================================================================

/// Console logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to use colored output on a terminal
    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            colored: default_true(),
        }
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete application settings
///
/// The fully merged bundle for one deployment profile. Constructed once at
/// process startup by [`crate::config::ConfigLoader`] and treated as
/// read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Application information
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Secret key and token lifetimes
    #[serde(default)]
    pub security: SecurityConfig,

    /// Primary database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Satellite database connections
    #[serde(default)]
    pub aux_databases: AuxDatabasesConfig,

    /// Filesystem locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Feature switches
    #[serde(default)]
    pub features: FeaturesConfig,

    /// Federal and regional service integration
    #[serde(default)]
    pub integration: IntegrationConfig,

    /// SMB document destinations
    #[serde(default)]
    pub smb: SmbConfig,

    /// Logger configuration
    #[serde(default)]
    pub logger: LoggerSettings,
}
