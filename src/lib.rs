//! Hub Chat - Main Library
//!
//! Client-side pieces shared by the `hub_chat` binary.
//!
//! ## Architecture
//!
//! - **hubsockets**: hub connection engine (re-exported from workspace)
//! - **config**: YAML client settings with `.env` overrides
//! - **logging**: tracing initialization
//! - **bin_common**: Common utilities for binary executables (CLI, runners)
//!
//! ## Usage in Binaries
//!
//! ```rust,no_run
//! use hub_chat::bin_common::{load_config_from_env, ConfigType};
//! use hub_chat::config::ClientSettings;
//!
//! let path = load_config_from_env(ConfigType::Client);
//! let settings = ClientSettings::load(&path).unwrap();
//! ```

// Re-export workspace libraries for convenience
pub use hubsockets;

pub mod config;
pub mod logging;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;
    pub mod runner;

    pub use cli::{load_config_from_env, parse_args, ConfigType};
    pub use runner::{BinaryRunner, RunConfig, ShutdownSignal};
}
