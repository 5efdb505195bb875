//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions (Config, ServerConfig, IdentityConfig, ...)
//! - [`defaults`]: serde default value functions
//! - [`validation`]: startup checks

mod defaults;
mod types;
mod validation;

pub use types::{BotConfig, Config, ConfigError, IdentityConfig, ServerConfig, ServiceConfig, SessionConfig};
pub use validation::{ValidationError, validate};
