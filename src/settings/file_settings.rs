use serde::{Deserialize, Serialize};

use super::settings_struct::{
    default_listen_address, default_listen_port, default_log_level, default_max_concur_threads,
    default_subscription_userinfo, Settings,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub listen: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: default_listen_address(),
            port: default_listen_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonSettings {
    /// Snapshot file the source and group store is loaded from
    pub store_path: String,
    /// Value of the `Subscription-Userinfo` response header
    pub subscription_userinfo: String,
}

impl Default for CommonSettings {
    fn default() -> Self {
        Self {
            store_path: String::new(),
            subscription_userinfo: default_subscription_userinfo(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedSettings {
    pub log_level: String,
    #[serde(alias = "max_concur_threads")]
    pub max_concurrent_threads: usize,
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            max_concurrent_threads: default_max_concur_threads(),
        }
    }
}

/// Layout of a settings file, shared by the YAML and TOML loaders
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    pub server: ServerSettings,
    pub common: CommonSettings,
    pub advanced: AdvancedSettings,
}

impl From<FileSettings> for Settings {
    fn from(file: FileSettings) -> Self {
        let mut settings = Settings {
            listen_address: file.server.listen,
            listen_port: file.server.port,
            store_path: file.common.store_path,
            max_concur_threads: file.advanced.max_concurrent_threads,
            log_level: file.advanced.log_level,
            subscription_userinfo: file.common.subscription_userinfo,
            pref_path: String::new(),
        };

        if settings.listen_address.trim().is_empty() {
            settings.listen_address = default_listen_address();
        }
        if settings.max_concur_threads == 0 {
            settings.max_concur_threads = default_max_concur_threads();
        }
        if settings.log_level.trim().is_empty() {
            settings.log_level = default_log_level();
        }
        settings
    }
}
