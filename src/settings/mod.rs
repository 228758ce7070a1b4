//! Settings module
//!
//! Process configuration read from a YAML or TOML file and held globally.

pub mod file_settings;
pub mod settings_struct;

pub use file_settings::FileSettings;
pub use settings_struct::{
    init_settings, update_settings, update_settings_from_content, Settings, GLOBAL,
};
