//! Tests for settings loading

use super::*;

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_defaults_when_environment_is_empty() {
    let settings = Settings::from_map(&HashMap::new()).expect("defaults should load");

    assert_eq!(settings.port, 8080);
    assert_eq!(settings.readiness_warmup(), Duration::from_secs(1));
    assert_eq!(settings.shutdown_timeout(), Duration::from_secs(10));
    assert_eq!(settings.config_map_env_var, "");
    assert_eq!(settings.pod_name, "local");
    assert_eq!(settings.log_level, "info");
    assert!(settings.data_dir.is_none());
    assert_eq!(settings.postgres.port, 5432);
    assert_eq!(settings.postgres.max_connections, 5);
    assert!(settings.database().is_none(), "no database by default");
}

#[test]
fn test_reads_app_prefixed_variables() {
    let settings = Settings::from_map(&vars(&[
        ("APP_PORT", "9090"),
        ("APP_READINESS_WARMUP_SECONDS", "5"),
        ("APP_SHUTDOWN_TIMEOUT_SECONDS", "30"),
        ("APP_CONFIG_MAP_ENV_VAR", "from-configmap"),
        ("APP_SECRET_USERNAME", "developer"),
        ("APP_SECRET_PASSWORD", "password"),
        ("APP_DATA_DIR", "/data"),
        ("APP_POD_NAME", "web-0"),
    ]))
    .expect("settings should load");

    assert_eq!(settings.port, 9090);
    assert_eq!(settings.readiness_warmup(), Duration::from_secs(5));
    assert_eq!(settings.shutdown_timeout(), Duration::from_secs(30));
    assert_eq!(settings.config_map_env_var, "from-configmap");
    assert_eq!(settings.secret_username, "developer");
    assert_eq!(settings.secret_password, "password");
    assert_eq!(settings.data_dir, Some(PathBuf::from("/data")));
    assert_eq!(settings.pod_name, "web-0");
}

#[test]
fn test_database_configured_with_user_and_name() {
    let settings = Settings::from_map(&vars(&[
        ("APP_POSTGRES_HOST", "db"),
        ("APP_POSTGRES_USER", "app"),
        ("APP_POSTGRES_DB", "demo"),
    ]))
    .expect("settings should load");

    let db = settings.database().expect("database should be configured");
    assert_eq!(db.host, "db");
    assert_eq!(db.password, "", "password may be empty");
    assert!(db.missing_fields().is_empty());
}

#[test]
fn test_database_not_configured_without_name() {
    let settings = Settings::from_map(&vars(&[("APP_POSTGRES_USER", "app")]))
        .expect("settings should load");

    assert!(settings.database().is_none());
    assert_eq!(settings.postgres.missing_fields(), vec!["host", "database"]);
}

#[test]
fn test_invalid_port_is_rejected() {
    let result = Settings::from_map(&vars(&[("APP_PORT", "not-a-port")]));
    assert!(result.is_err(), "non-numeric port must fail");
}

#[test]
fn test_env_secs_duration_parsing() {
    assert_eq!(
        "3".parse::<EnvSecsDuration>(),
        Ok(EnvSecsDuration(Duration::from_secs(3)))
    );
    assert_eq!("-1".parse::<EnvSecsDuration>(), Err(ParseEnvSecsDurationError));
    assert_eq!("1.5".parse::<EnvSecsDuration>(), Err(ParseEnvSecsDurationError));
}
