//! Configuration types and loaders for shoal.
//!
//! This crate owns the on-disk `shoal.toml` schema so the simulation and the
//! terminal shell read one source of truth.

pub mod config;

pub use config::{
    config_path, DisplayConfig, LoggingConfig, MarkerKind, RigConfig, SchoolConfig, ShoalConfig,
};
