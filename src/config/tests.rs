use super::loader::parse_subscriptions;
use super::*;
use std::collections::HashMap;
use std::time::Duration;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_remote_target_with_port() {
    let target: RemoteTarget = "zuul@review.example.org:29418".parse().unwrap();
    assert_eq!(target.username, "zuul");
    assert_eq!(target.host, "review.example.org");
    assert_eq!(target.port, 29418);
    assert_eq!(target.destination(), "zuul@review.example.org");
}

#[test]
fn test_remote_target_default_port() {
    let target: RemoteTarget = "myuser@yourhost".parse().unwrap();
    assert_eq!(target.port, 22);
    assert_eq!(target.to_string(), "myuser@yourhost:22");
}

#[test]
fn test_remote_target_rejects_garbage() {
    assert!(matches!(
        "yourhost".parse::<RemoteTarget>(),
        Err(ConfigError::InvalidRemoteTarget(_))
    ));
    assert!(matches!(
        "@yourhost".parse::<RemoteTarget>(),
        Err(ConfigError::InvalidRemoteTarget(_))
    ));
    assert!(matches!(
        "user@host:port".parse::<RemoteTarget>(),
        Err(ConfigError::InvalidRemoteTarget(_))
    ));
}

#[test]
fn test_remote_target_port_out_of_range() {
    assert!(matches!(
        "user@host:70000".parse::<RemoteTarget>(),
        Err(ConfigError::InvalidPort(_))
    ));
}

#[test]
fn test_missing_remote_target_is_fatal() {
    let result = GatewayConfig::from_lookup(lookup(&[("ARGO_SERVER", "argo")]));
    assert!(matches!(result, Err(ConfigError::MissingRemoteTarget)));
}

#[test]
fn test_full_configuration() {
    let config = GatewayConfig::from_lookup(lookup(&[
        ("GERRIT_SERVER", "bot@gerrit:29418"),
        ("ARGO_SERVER", "argo.example.org"),
        ("ARGO_NAMESPACE", "ci"),
        ("ARGO_TOKEN", "Bearer s3cret"),
        ("GERRIT_SUBSCRIPTIONS", "patchset-created, ,comment-added,"),
        ("RECHECK_CI_PREFIX", " sap-openstack-ci "),
        ("GATEWAY_DISPATCH_INTERVAL_MS", "250"),
    ]))
    .unwrap();

    assert_eq!(config.remote.port, 29418);
    assert_eq!(
        config.sink.endpoint_url(),
        "https://argo.example.org/api/v1/events/ci/gerrit"
    );
    assert_eq!(config.sink.token.as_deref(), Some("Bearer s3cret"));
    assert_eq!(config.subscriptions, vec!["patchset-created", "comment-added"]);
    assert_eq!(config.recheck.ci_prefix.as_deref(), Some("sap-openstack-ci"));
    assert_eq!(config.recheck.pattern, None);
    assert_eq!(config.dispatch_interval, Duration::from_millis(250));
    assert_eq!(config.ssh_program, "ssh");
    assert!(config.private_key.is_none());
}

#[test]
fn test_defaults_without_optional_values() {
    let config = GatewayConfig::from_lookup(lookup(&[("GERRIT_SERVER", "bot@gerrit")])).unwrap();

    assert_eq!(config.subscriptions, vec!["patchset-created", "comment-added"]);
    assert_eq!(config.dispatch_interval, DEFAULT_DISPATCH_INTERVAL);
    assert!(config.sink.token.is_none());
    // Not validated up front; the request fails later instead
    assert_eq!(config.sink.endpoint_url(), "https:///api/v1/events//gerrit");
}

#[test]
fn test_invalid_dispatch_interval() {
    let result = GatewayConfig::from_lookup(lookup(&[
        ("GERRIT_SERVER", "bot@gerrit"),
        ("GATEWAY_DISPATCH_INTERVAL_MS", "soon"),
    ]));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidDispatchInterval(_))
    ));
}

#[test]
fn test_private_key_must_be_readable() {
    let result = GatewayConfig::from_lookup(lookup(&[
        ("GERRIT_SERVER", "bot@gerrit"),
        ("SSH_PRIVATE_KEY_PATH", "/nonexistent/id_ed25519"),
    ]));
    assert!(matches!(result, Err(ConfigError::PrivateKey { .. })));
}

#[test]
fn test_private_key_is_kept() {
    let key = tempfile::NamedTempFile::new().unwrap();
    let path = key.path().to_string_lossy().to_string();
    let config = GatewayConfig::from_lookup(lookup(&[
        ("GERRIT_SERVER", "bot@gerrit"),
        ("SSH_PRIVATE_KEY_PATH", path.as_str()),
    ]))
    .unwrap();
    assert_eq!(config.private_key.as_deref(), Some(key.path()));
}

#[test]
fn test_parse_subscriptions() {
    assert_eq!(parse_subscriptions(""), Vec::<String>::new());
    assert_eq!(
        parse_subscriptions("ref-updated,change-merged"),
        vec!["ref-updated", "change-merged"]
    );
}

#[test]
fn test_ssh_command_with_options() {
    let config = GatewayConfig::from_lookup(lookup(&[
        ("GERRIT_SERVER", "bot@gerrit"),
        ("GERRIT_SSH_COMMAND", "ssh -o 'UserKnownHostsFile=/etc/gerrit hosts'"),
    ]))
    .unwrap();
    assert_eq!(
        split_ssh_command(&config.ssh_program).unwrap(),
        vec!["ssh", "-o", "UserKnownHostsFile=/etc/gerrit hosts"]
    );
}

#[test]
fn test_unbalanced_ssh_command_is_rejected() {
    let result = GatewayConfig::from_lookup(lookup(&[
        ("GERRIT_SERVER", "bot@gerrit"),
        ("GERRIT_SSH_COMMAND", "ssh -o \"oops"),
    ]));
    assert!(matches!(result, Err(ConfigError::InvalidSshCommand(_))));
}
