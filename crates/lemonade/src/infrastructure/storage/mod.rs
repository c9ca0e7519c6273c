//! Storage infrastructure: the optional configuration file.
//!
//! Only reading is needed; lemonade never writes its config file.

pub mod config;

pub use config::{config_file_path, load_config, load_config_from, ConfigError, FileConfig};
