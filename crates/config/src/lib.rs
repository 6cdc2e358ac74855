//! Configuration loading and env substitution.
//!
//! Config files: `chatops.toml`, `chatops.yaml`, or `chatops.json`,
//! searched in `./` then `~/.config/chatops/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{config_dir, discover_and_load, load_config, load_or_discover},
    schema::{ChannelsConfig, ChatopsConfig, MetricsConfig, ServerConfig},
};
