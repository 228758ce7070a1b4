use std::io::Write;

use submerge::settings::{init_settings, update_settings_from_content, Settings};
use tempfile::NamedTempFile;

// All global-state assertions live in one test so they cannot race each other.
#[test]
fn test_global_settings_lifecycle() {
    init_settings("").unwrap();
    assert_eq!(Settings::current().listen_port, 25500);

    init_settings("/definitely/not/here.yaml").unwrap();
    assert_eq!(Settings::current().listen_address, "127.0.0.1");

    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "server:\n  listen: 0.0.0.0\n  port: 8080\ncommon:\n  store_path: store.yaml\n  subscription_userinfo: \"upload=1\"\nadvanced:\n  max_concurrent_threads: 8"
    )
    .unwrap();
    let path = file.path().to_str().unwrap().to_string();
    init_settings(&path).unwrap();

    let current = Settings::current();
    assert_eq!(current.pref_path, path);
    assert_eq!(current.bind_address(), "0.0.0.0:8080");
    assert_eq!(current.store_path, "store.yaml");
    assert_eq!(current.subscription_userinfo, "upload=1");
    assert_eq!(current.max_concur_threads, 8);

    update_settings_from_content("[server]\nport = 9000\n").unwrap();
    let current = Settings::current();
    assert_eq!(current.listen_port, 9000);
    assert_eq!(current.store_path, "");

    assert!(update_settings_from_content("server: [1, 2").is_err());
    assert_eq!(Settings::current().listen_port, 9000);
}

#[test]
fn test_toml_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[server]\nlisten = \"\"\nport = 7000\n\n[advanced]\nlog_level = \"warn\"\nmax_concurrent_threads = 0"
    )
    .unwrap();
    let settings = Settings::load_from_file(file.path().to_str().unwrap()).unwrap();
    assert_eq!(settings.listen_address, "127.0.0.1");
    assert_eq!(settings.listen_port, 7000);
    assert_eq!(settings.log_level, "warn");
    assert_eq!(settings.max_concur_threads, 4);
}
