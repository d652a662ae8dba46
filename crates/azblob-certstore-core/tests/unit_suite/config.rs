//! Configuration tests: YAML, URLs, environment fallback and validation.

use azblob_certstore_core::storage::{
    StorageBackendConfig, ENV_ACCOUNT_KEY, ENV_ACCOUNT_NAME, ENV_CONTAINER_NAME,
};
use azblob_certstore_core::{create_storage, Config, Error, LockScope};
use std::collections::HashMap;
use std::time::Duration;

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn yaml_with_lock_options() {
    let config = Config::from_yaml(
        r#"
storage:
  backend: azure
  account_name: certacct
  account_key: c2VjcmV0
  container_name: certs
lock:
  scope: key
  lease_duration_secs: 30
operation_timeout_secs: 10
"#,
    )
    .unwrap();

    assert_eq!(config.lock.scope, LockScope::Key);
    assert_eq!(config.lock.lease_duration(), Some(Duration::from_secs(30)));
    assert_eq!(config.operation_timeout(), Some(Duration::from_secs(10)));
    config.validate().unwrap();
}

#[test]
fn env_fills_blank_fields_only() {
    let vars = env(&[
        (ENV_ACCOUNT_NAME, "envacct"),
        (ENV_ACCOUNT_KEY, "ZW52a2V5"),
        (ENV_CONTAINER_NAME, "envcerts"),
    ]);
    let resolved = StorageBackendConfig::azure("explicit", "", "")
        .resolve_with(|name| vars.get(name).cloned());

    match resolved {
        StorageBackendConfig::Azure {
            account_name,
            account_key,
            container_name,
            ..
        } => {
            assert_eq!(account_name, "explicit");
            assert_eq!(account_key, "ZW52a2V5");
            assert_eq!(container_name, "envcerts");
        }
        other => panic!("unexpected backend: {:?}", other),
    }
}

#[test]
fn missing_credentials_fail_validation() {
    let config = Config::new(
        StorageBackendConfig::azure("", "", "").resolve_with(|_| None),
    );
    let err = config.validate().unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(create_storage(&config).is_err());
}

#[test]
fn lease_duration_out_of_range_is_rejected() {
    for secs in [5, 61] {
        let mut config = Config::new(StorageBackendConfig::Memory);
        config.lock.lease_duration_secs = Some(secs);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}

#[test]
fn url_forms() {
    let by_user = StorageBackendConfig::from_url("azblob://certs@certacct").unwrap();
    let by_path = StorageBackendConfig::from_url("azblob://certacct/certs").unwrap();
    for config in [by_user, by_path] {
        match config {
            StorageBackendConfig::Azure {
                account_name,
                container_name,
                ..
            } => {
                assert_eq!(account_name, "certacct");
                assert_eq!(container_name, "certs");
            }
            other => panic!("unexpected backend: {:?}", other),
        }
    }

    assert!(matches!(
        StorageBackendConfig::from_url("memory://").unwrap(),
        StorageBackendConfig::Memory
    ));
    assert!(StorageBackendConfig::from_url("s3://bucket").is_err());
}
