//! The process configuration can be installed exactly once.

use serde_json::json;
use vesselharbor_config::app;
use vesselharbor_config::config::Settings;
use vesselharbor_config::error::ConfigError;

#[test]
fn install_once_per_process() {
    let (schema, _) = app::build(&app::modules());
    let mut first = Settings::new(schema.clone());
    first.set("application.port", 9100).unwrap();

    let installed = first.install().unwrap();
    assert_eq!(installed.get("application.port").unwrap(), json!(9100));
    assert!(std::ptr::eq(installed, Settings::installed().unwrap()));

    let err = Settings::new(schema).install().unwrap_err();
    assert!(matches!(err, ConfigError::AlreadyInstalled));
    assert_eq!(
        Settings::installed().unwrap().get("application.port").unwrap(),
        json!(9100)
    );
}
