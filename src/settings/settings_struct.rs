use std::sync::Arc;
use std::sync::LazyLock;
use std::sync::RwLock;

use log::{info, warn, LevelFilter};

use super::file_settings::FileSettings;

/// Settings structure to hold global configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub pref_path: String,

    // Server
    pub listen_address: String,
    pub listen_port: u16,
    pub max_concur_threads: usize,

    pub store_path: String,
    pub log_level: String,
    pub subscription_userinfo: String,
}

pub fn default_listen_address() -> String {
    "127.0.0.1".to_string()
}

pub fn default_listen_port() -> u16 {
    25500
}

pub fn default_max_concur_threads() -> usize {
    4
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_subscription_userinfo() -> String {
    "upload=0; download=0; total=1073741824000000; expire=0".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            pref_path: String::new(),
            listen_address: default_listen_address(),
            listen_port: default_listen_port(),
            max_concur_threads: default_max_concur_threads(),
            store_path: String::new(),
            log_level: default_log_level(),
            subscription_userinfo: default_subscription_userinfo(),
        }
    }
}

impl Settings {
    /// Create a new settings instance with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the global settings.
    pub fn current() -> Arc<Settings> {
        match GLOBAL.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Parse settings text, trying YAML before TOML.
    pub fn load_from_content(
        content: &str,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        if content.trim().is_empty() {
            return Ok(Settings::new());
        }

        let file: FileSettings = match serde_yaml::from_str(content) {
            Ok(file) => file,
            Err(yaml_err) => match toml::from_str(content) {
                Ok(file) => file,
                Err(toml_err) => {
                    return Err(format!(
                        "settings are neither YAML ({}) nor TOML ({})",
                        yaml_err, toml_err
                    )
                    .into())
                }
            },
        };
        Ok(Settings::from(file))
    }

    /// Load settings from a file path
    pub fn load_from_file(path: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let content = std::fs::read_to_string(path)?;
        let mut settings = Settings::load_from_content(&content)?;
        settings.pref_path = path.to_owned();
        Ok(settings)
    }

    /// Maximum log level named by `log_level`, if it names one.
    pub fn level_filter(&self) -> Option<LevelFilter> {
        self.log_level.trim().parse().ok()
    }

    /// `address:port` to bind, keeping a port already present in the address.
    pub fn bind_address(&self) -> String {
        if self.listen_address.contains(':') {
            self.listen_address.clone()
        } else {
            format!("{}:{}", self.listen_address, self.listen_port)
        }
    }
}

// Global settings instance
pub static GLOBAL: LazyLock<RwLock<Arc<Settings>>> =
    LazyLock::new(|| RwLock::new(Arc::new(Settings::new())));

fn replace_global(settings: Settings) {
    match GLOBAL.write() {
        Ok(mut guard) => *guard = Arc::new(settings),
        Err(poisoned) => *poisoned.into_inner() = Arc::new(settings),
    }
}

/// Initialize the global settings from `path`.
///
/// An empty path, or one that does not exist, leaves the defaults in place.
pub fn init_settings(path: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if path.trim().is_empty() {
        info!("No settings file given, using defaults");
        return Ok(());
    }
    if !std::path::Path::new(path).exists() {
        warn!("Settings file '{}' not found, using defaults", path);
        return Ok(());
    }

    let settings = Settings::load_from_file(path)?;
    info!("Loaded settings from {}", path);
    replace_global(settings);
    Ok(())
}

/// Replace the global settings with ones parsed from `content`.
pub fn update_settings_from_content(
    content: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = Settings::load_from_content(content)?;
    replace_global(settings);
    Ok(())
}

/// Apply a change to the global settings in place.
pub fn update_settings<F>(apply: F)
where
    F: FnOnce(&mut Settings),
{
    let mut settings = (*Settings::current()).clone();
    apply(&mut settings);
    replace_global(settings);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::new();
        assert_eq!(settings.bind_address(), "127.0.0.1:25500");
        assert_eq!(settings.max_concur_threads, 4);
        assert_eq!(settings.log_level, "info");
        assert!(settings.subscription_userinfo.starts_with("upload=0;"));
    }

    #[test]
    fn test_yaml_then_toml() {
        let yaml = "server:\n  listen: 0.0.0.0\n  port: 8080\ncommon:\n  store_path: data.yaml\n";
        let settings = Settings::load_from_content(yaml).unwrap();
        assert_eq!(settings.bind_address(), "0.0.0.0:8080");
        assert_eq!(settings.store_path, "data.yaml");
        assert_eq!(settings.log_level, "info");

        let toml = "[server]\nport = 9090\n\n[advanced]\nlog_level = \"debug\"\nmax_concur_threads = 2\n";
        let settings = Settings::load_from_content(toml).unwrap();
        assert_eq!(settings.listen_port, 9090);
        assert_eq!(settings.listen_address, "127.0.0.1");
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.max_concur_threads, 2);
    }

    #[test]
    fn test_invalid_content() {
        assert!(Settings::load_from_content("server = [").is_err());
        assert_eq!(Settings::load_from_content("  ").unwrap(), Settings::new());
    }

    #[test]
    fn test_level_filter() {
        let mut settings = Settings::new();
        assert_eq!(settings.level_filter(), Some(LevelFilter::Info));
        settings.log_level = " DEBUG ".to_string();
        assert_eq!(settings.level_filter(), Some(LevelFilter::Debug));
        settings.log_level = "loud".to_string();
        assert_eq!(settings.level_filter(), None);
    }

    #[test]
    fn test_address_with_port() {
        let settings = Settings {
            listen_address: "[::1]:7000".to_string(),
            ..Settings::new()
        };
        assert_eq!(settings.bind_address(), "[::1]:7000");
    }
}
