//! Configuration module for jreview
//!
//! Settings come from `~/.config/jreview/config.toml`, then the environment,
//! then command-line flags.

mod user_config;

pub use user_config::{AiSettings, ModelSettings, UserConfig};
