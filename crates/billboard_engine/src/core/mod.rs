//! # Core Engine Module
//!
//! Shared configuration for the billboard engine.
//!
//! ## Organization
//!
//! - **Config**: set and engine descriptions loadable from TOML or RON

pub mod config;

pub use config::{BillboardSetConfig, Config, ConfigError, ConfigFormat, EngineConfig};
