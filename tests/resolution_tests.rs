//! End-to-end resolution through every tier with the VesselHarbor schema.

use serde_json::json;
use std::fs;
use tempfile::TempDir;
use vesselharbor_config::app;
use vesselharbor_config::config::{
    CliOverrides, ConfigLoader, ConfigPaths, EnvSnapshot, SchemaNode, Settings, coerce,
};
use vesselharbor_config::error::{ConfigError, ExitStatus};

fn loader() -> ConfigLoader {
    let (schema, bindings) = app::build(&app::modules());
    ConfigLoader::new(schema, bindings)
}

fn leaves(node: &SchemaNode, prefix: &str, out: &mut Vec<String>) {
    match node {
        SchemaNode::Leaf(_) => out.push(prefix.to_string()),
        SchemaNode::Section(children) => {
            for (name, child) in children {
                let key = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{prefix}.{name}")
                };
                leaves(child, &key, out);
            }
        }
        SchemaNode::Template(_) => {}
    }
}

#[test]
fn silent_sources_yield_schema_defaults() {
    let settings = loader().load().expect("load");
    let mut keys = Vec::new();
    leaves(settings.schema().root(), "", &mut keys);
    assert!(!keys.is_empty());
    for key in keys {
        let default = settings.schema().resolve_key(&key).unwrap().default_value();
        assert_eq!(settings.get(&key).unwrap(), default, "{key}");
    }
}

#[test]
fn higher_tiers_override_lower_tiers() {
    let tmp = TempDir::new().unwrap();
    let system = tmp.path().join("system.toml");
    let user = tmp.path().join("user.toml");
    fs::write(
        &system,
        "[application]\nip_address = \"10.0.0.1\"\nport = 7000\nuser = \"sys@example.com\"\n",
    )
    .unwrap();
    fs::write(&user, "[application]\nport = 7100\n").unwrap();

    let env = EnvSnapshot::from_pairs([
        ("VESSELHARBOR_PORT", "6000"),
        ("VESSELHARBOR_SOCKET", "/run/env.sock"),
        ("API_KEY", "ignored-without-binding"),
        ("APPLICATION_API_KEY", "from-dotenv-slot"),
    ]);
    let settings = loader()
        .with_paths(ConfigPaths::with_files(Some(system), Some(user)))
        .with_environment(env)
        .with_cli(CliOverrides::new().with("port", &["9999"]))
        .load()
        .unwrap();

    assert_eq!(settings.get("application.port").unwrap(), json!(9999));
    assert_eq!(settings.get("application.ip_address").unwrap(), json!("10.0.0.1"));
    assert_eq!(settings.get("application.user").unwrap(), json!("sys@example.com"));
    assert_eq!(settings.get("application.socket").unwrap(), json!("/run/env.sock"));
    assert_eq!(
        settings.get("application.api_key").unwrap(),
        json!("from-dotenv-slot")
    );
}

#[test]
fn empty_cli_value_overrides_file_value() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("config.toml");
    fs::write(&file, "[application]\nsocket = \"/run/file.sock\"\n").unwrap();
    let settings = loader()
        .with_paths(ConfigPaths::explicit(&file))
        .with_cli(CliOverrides::new().with("socket", &[""]))
        .load()
        .unwrap();
    assert_eq!(settings.get("application.socket").unwrap(), json!(""));
    assert_eq!(app::base_url(&settings).unwrap(), "http://127.0.0.1:8010");
}

#[test]
fn dotenv_file_feeds_unprefixed_names() {
    let tmp = TempDir::new().unwrap();
    let dotenv = tmp.path().join(".env");
    fs::write(&dotenv, "PORT=6100\nVERBOSE=yes\n").unwrap();

    let mut env = EnvSnapshot::from_pairs([("VERBOSE", "no")]);
    let added = env.load_dotenv(&dotenv).unwrap();
    assert_eq!(added, 1);

    let settings = loader().with_environment(env).load().unwrap();
    assert_eq!(settings.get("application.port").unwrap(), json!(6100));
    assert_eq!(settings.get("application.verbose").unwrap(), json!(false));
}

#[test]
fn missing_dotenv_file_is_unavailable() {
    let tmp = TempDir::new().unwrap();
    let mut env = EnvSnapshot::default();
    let err = env.load_dotenv(&tmp.path().join(".env")).unwrap_err();
    assert!(matches!(err, ConfigError::SourceUnavailable { .. }));
}

#[test]
fn template_instance_from_file() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("config.toml");
    fs::write(&file, "[accounts.jane]\ntoken = \"abc\"\n").unwrap();
    let settings = loader()
        .with_paths(ConfigPaths::explicit(&file))
        .load()
        .unwrap();
    assert_eq!(settings.get("accounts.jane.token").unwrap(), json!("abc"));
    assert_eq!(settings.get("accounts.jane.user").unwrap(), json!(""));
    assert_eq!(settings.enumerate("accounts").unwrap(), vec!["jane"]);
}

#[test]
fn template_instance_by_set() {
    let (schema, _) = app::build(&app::modules());
    let mut settings = Settings::new(schema);
    settings.set("accounts.jane.token", "abc").unwrap();
    assert_eq!(settings.get("accounts.jane.token").unwrap(), json!("abc"));
}

#[test]
fn unparsable_file_contributes_nothing() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("config.toml");
    fs::write(&file, "[application\nport = ").unwrap();
    let settings = loader()
        .with_paths(ConfigPaths::explicit(&file))
        .load()
        .unwrap();
    assert!(settings.tree().is_empty());
}

#[test]
fn unknown_file_key_is_ignored_but_bad_value_fails() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("config.toml");
    fs::write(&file, "[application]\ncolour = \"blue\"\n").unwrap();
    let settings = loader()
        .with_paths(ConfigPaths::explicit(&file))
        .load()
        .unwrap();
    assert!(!settings.has("application.port").unwrap());

    fs::write(&file, "[application]\nport = \"eighty\"\n").unwrap();
    let err = loader()
        .with_paths(ConfigPaths::explicit(&file))
        .load()
        .unwrap_err();
    assert!(matches!(err, ConfigError::Coercion { ref path, .. } if path == "application.port"));
    assert_eq!(err.exit_status(), ExitStatus::Validation);
}

#[test]
fn boolean_coercion_examples() {
    assert_eq!(coerce(&json!(true), &json!("yes")).unwrap(), json!(true));
    assert_eq!(coerce(&json!(true), &json!(0)).unwrap(), json!(false));
    assert_eq!(coerce(&json!(true), &json!("maybe")).unwrap(), json!(false));
}

#[test]
fn enumerate_and_delete() {
    let (schema, _) = app::build(&app::modules());
    let mut settings = Settings::new(schema);
    assert!(settings.enumerate("accounts").unwrap().is_empty());
    assert!(matches!(
        settings.enumerate("application.port"),
        Err(ConfigError::UndefinedPath { .. })
    ));
    assert!(matches!(
        settings.enumerate("nothing.here"),
        Err(ConfigError::UndefinedPath { .. })
    ));

    settings.set("application.user", "jane@example.com").unwrap();
    settings.delete("application.user").unwrap();
    assert!(!settings.has("application.user").unwrap());
    assert_eq!(
        settings.get("application.user").unwrap(),
        json!("example@example.com")
    );
}
