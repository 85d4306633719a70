//! webmis-config Library
//!
//! Configuration resolution for the webmis backend: profile selection,
//! layered settings loading and validation.

use shadow_rs::shadow;
shadow!(build);

pub mod cli;
pub mod config;
pub mod logger;

pub use crate::config::{ConfigError, ConfigLoader, Profile, Settings, resolve};

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}
