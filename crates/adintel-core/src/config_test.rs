use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_test() {
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "ADINTEL_ENV"));
}

#[test]
fn build_app_config_uses_defaults_for_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.tuning_path, PathBuf::from("./config/tuning.yaml"));
    assert!(cfg.chromium_path.is_none());
    assert!(cfg.headless);
    assert_eq!(cfg.user_agent, DEFAULT_USER_AGENT);
    assert_eq!(cfg.nav_timeout_secs, 30);
    assert_eq!(cfg.max_contexts, 3);
    assert_eq!(cfg.country, "US");
    assert_eq!(cfg.output_dir, PathBuf::from("./output"));
}

#[test]
fn build_app_config_reads_overrides() {
    let mut map = HashMap::new();
    map.insert("ADINTEL_ENV", "production");
    map.insert("ADINTEL_CHROMIUM_PATH", "/usr/bin/chromium");
    map.insert("ADINTEL_HEADLESS", "false");
    map.insert("ADINTEL_MAX_CONTEXTS", "6");
    map.insert("ADINTEL_COUNTRY", "gb");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Production);
    assert_eq!(cfg.chromium_path, Some(PathBuf::from("/usr/bin/chromium")));
    assert!(!cfg.headless);
    assert_eq!(cfg.max_contexts, 6);
    assert_eq!(cfg.country, "GB");
}

#[test]
fn blank_chromium_path_means_autodetect() {
    let mut map = HashMap::new();
    map.insert("ADINTEL_CHROMIUM_PATH", "  ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.chromium_path.is_none());
}

#[test]
fn invalid_headless_value_fails() {
    let mut map = HashMap::new();
    map.insert("ADINTEL_HEADLESS", "maybe");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ADINTEL_HEADLESS"),
        "expected InvalidEnvVar(ADINTEL_HEADLESS), got: {result:?}"
    );
}

#[test]
fn invalid_nav_timeout_fails() {
    let mut map = HashMap::new();
    map.insert("ADINTEL_NAV_TIMEOUT_SECS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ADINTEL_NAV_TIMEOUT_SECS"),
        "expected InvalidEnvVar(ADINTEL_NAV_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn zero_max_contexts_fails() {
    let mut map = HashMap::new();
    map.insert("ADINTEL_MAX_CONTEXTS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ADINTEL_MAX_CONTEXTS"),
        "expected InvalidEnvVar(ADINTEL_MAX_CONTEXTS), got: {result:?}"
    );
}

#[test]
fn nav_timeout_converts_to_duration() {
    let mut map = HashMap::new();
    map.insert("ADINTEL_NAV_TIMEOUT_SECS", "45");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.nav_timeout(), std::time::Duration::from_secs(45));
}
