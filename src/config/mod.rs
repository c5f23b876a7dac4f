//! Configuration loading and parsing.
//!
//! Guard configuration can be built in code ([`GuardConfigBuilder`]) or
//! loaded from a YAML file ([`load_guard_config`]).

mod builder;
mod error;
mod types;
mod yaml;

pub use builder::GuardConfigBuilder;
pub use error::ConfigError;
pub use types::{GuardConfig, DEFAULT_REALERT_EVERY};
pub use yaml::{load_guard_config, parse_guard_config, GuardConfigFile};
