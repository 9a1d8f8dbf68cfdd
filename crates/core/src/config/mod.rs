//! Project configuration for mojo-tools

mod settings;

pub use settings::{CONFIG_FILE_NAMES, Config, PluginSettings};
