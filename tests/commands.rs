//! End-to-end command runs against a mock control plane and compute API.
//!
//! Both planes are served by one mock server; the handlers are blocking and
//! run on a blocking thread.

use std::process::Command;

use pcsync::cli::{Commands, ConfigCommands};
use pcsync::commands::execute_command;
use pcsync_api::{CONTROL_AUTH_HEADER, Endpoint, Settings};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

fn settings_for(uri: &str) -> Settings {
    Settings {
        control: Endpoint::with_api(uri).credentials("key-id", "s3cret"),
        compute: Endpoint::with_api(uri).credentials("key-id", "s3cret"),
    }
}

async fn mount_logins(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "control-token"})))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/authenticate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "compute-token"})))
        .mount(server)
        .await;
}

async fn run(
    command: Commands,
    settings: Settings,
    dry_run: bool,
) -> Result<anyhow::Result<String>, tokio::task::JoinError> {
    tokio::task::spawn_blocking(move || execute_command(command, &settings, dry_run)).await
}

fn namespace_command(skip_policy: bool) -> Commands {
    Commands::Namespace {
        collection: "team-a".to_string(),
        namespace: "payments".to_string(),
        skip_policy,
    }
}

#[tokio::test]
async fn test_namespace_creates_collection_and_rule() -> TestResult {
    let server = MockServer::start().await;
    mount_logins(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/collections"))
        .and(header("authorization", "Bearer compute-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "other"}])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/collections"))
        .and(body_partial_json(json!({"name": "team-a", "namespaces": ["payments"]})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/policies/vulnerability/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rules": []})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/policies/vulnerability/images"))
        .and(body_partial_json(json!({"rules": [{"name": "team-a", "effect": "alert"}]})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let summary = run(namespace_command(false), settings_for(&server.uri()), false).await??;
    assert_eq!(summary, "collection 'team-a': created, rule 'team-a': created");
    Ok(())
}

#[tokio::test]
async fn test_namespace_second_run_writes_nothing() -> TestResult {
    let server = MockServer::start().await;
    mount_logins(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/collections"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "{\"name\":\"team-a\",\"namespaces\":[\"billing\",\"payments\"]}\n",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/policies/vulnerability/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rules": [{"name": "team-a", "collections": [{"name": "team-a"}], "effect": "alert"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let summary = run(namespace_command(false), settings_for(&server.uri()), false).await??;
    assert_eq!(summary, "collection 'team-a': unchanged, rule 'team-a': unchanged");
    Ok(())
}

#[tokio::test]
async fn test_namespace_skip_policy_and_dry_run() -> TestResult {
    let server = MockServer::start().await;
    mount_logins(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/collections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "team-a", "namespaces": ["billing"]}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/policies/vulnerability/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rules": []})))
        .expect(0)
        .mount(&server)
        .await;

    let summary = run(namespace_command(true), settings_for(&server.uri()), true).await??;
    assert_eq!(summary, "collection 'team-a': would update");
    Ok(())
}

#[tokio::test]
async fn test_registries_unknown_credential_writes_nothing() -> TestResult {
    let server = MockServer::start().await;
    mount_logins(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "other", "type": "azure"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/settings/registry"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let command = Commands::Registries {
        credential: "acr".to_string(),
    };
    let result = run(command, settings_for(&server.uri()), false).await?;

    let err = result.err().ok_or("expected the run to fail")?;
    let unknown = err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<pcsync_reconciler::Error>(),
            Some(pcsync_reconciler::Error::UnknownCredential { credential_id }) if credential_id == "acr"
        )
    });
    assert!(unknown, "unexpected error: {err:#}");
    Ok(())
}

#[tokio::test]
async fn test_registries_credential_of_other_type_writes_nothing() -> TestResult {
    let server = MockServer::start().await;
    mount_logins(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "acr", "type": "aws"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search/config"))
        .respond_with(ResponseTemplate::new(200).set_body_string("h\nh\nr1,azure,r1.azurecr.io\n"))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/settings/registry"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let command = Commands::Registries {
        credential: "acr".to_string(),
    };
    let result = run(command, settings_for(&server.uri()), false).await?;

    let err = result.err().ok_or("expected the run to fail")?;
    assert!(err.chain().any(|cause| matches!(
        cause.downcast_ref::<pcsync_reconciler::Error>(),
        Some(pcsync_reconciler::Error::UnknownCredential { .. })
    )));
    Ok(())
}

#[tokio::test]
async fn test_binary_exits_one_on_unknown_credential() -> TestResult {
    let server = MockServer::start().await;
    mount_logins(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let uri = server.uri();
    let output = tokio::task::spawn_blocking(move || {
        Command::new(env!("CARGO_BIN_EXE_pcsync"))
            .args(["--control-api", &uri, "--compute-api", &uri])
            .args(["--access-key", "key-id", "--secret", "s3cret"])
            .args(["registries", "--credential", "acr"])
            .output()
    })
    .await??;

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("'acr'"));
    Ok(())
}

#[test]
fn test_binary_exits_one_on_missing_config_file() -> TestResult {
    let output = Command::new(env!("CARGO_BIN_EXE_pcsync"))
        .args(["--config", "does-not-exist.toml", "config", "show"])
        .output()?;

    assert_eq!(output.status.code(), Some(1));
    Ok(())
}

#[tokio::test]
async fn test_registries_adds_only_residual_hosts() -> TestResult {
    let server = MockServer::start().await;
    mount_logins(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "acr", "type": "azure"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search/config"))
        .and(header(CONTROL_AUTH_HEADER, "control-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "name,cloud,loginServer\n---\nr1,azure,r1.azurecr.io\nr2,azure,r2.azurecr.io\nr2b,azure,r2.azurecr.io\n",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/settings/registry"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "specifications": [{"version": "azure", "registry": "r1.azurecr.io", "credentialID": "acr"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/settings/registry"))
        .and(body_partial_json(json!({
            "specifications": [
                {"registry": "r1.azurecr.io"},
                {"registry": "r2.azurecr.io", "credentialID": "acr", "cap": 5, "os": "linux", "scanners": 2}
            ]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let command = Commands::Registries {
        credential: "acr".to_string(),
    };
    let summary = run(command, settings_for(&server.uri()), false).await??;
    assert_eq!(summary, "registry settings: updated (1 new of 3 discovered)");
    Ok(())
}

#[tokio::test]
async fn test_rejected_registry_write_names_hosts() -> TestResult {
    let server = MockServer::start().await;
    mount_logins(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"_id": "acr", "type": "azure"}])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search/config"))
        .respond_with(ResponseTemplate::new(200).set_body_string("h\nh\nr9,azure,r9.azurecr.io\n"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/settings/registry"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"specifications": []})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/settings/registry"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid registry"))
        .mount(&server)
        .await;

    let command = Commands::Registries {
        credential: "acr".to_string(),
    };
    let result = run(command, settings_for(&server.uri()), false).await?;

    let message = format!("{:#}", result.err().ok_or("expected the run to fail")?);
    assert!(message.contains("r9.azurecr.io"), "{message}");
    assert!(message.contains("400"), "{message}");
    Ok(())
}

#[tokio::test]
async fn test_accounts_onboards_missing_only() -> TestResult {
    let server = MockServer::start().await;
    mount_logins(&server).await;

    Mock::given(method("GET"))
        .and(path("/cloud/azure/tenant-1/project"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"accountId": "sub-1", "name": "prod"},
            {"accountId": "sub-2", "name": "dev"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "prod", "type": "azure"},
            {"_id": "dev", "type": "aws"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/credentials"))
        .and(body_partial_json(json!({"_id": "dev", "accountID": "sub-2", "type": "azure"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let command = Commands::Accounts {
        tenant_id: "tenant-1".to_string(),
    };
    let summary = run(command, settings_for(&server.uri()), false).await??;
    assert_eq!(summary, "account credentials: created (1 new of 2 accounts)");
    Ok(())
}

#[tokio::test]
async fn test_login_failure_stops_the_run() -> TestResult {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/authenticate"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = run(namespace_command(false), settings_for(&server.uri()), false).await?;
    let err = result.err().ok_or("expected the run to fail")?;
    assert!(err.chain().any(|cause| matches!(
        cause.downcast_ref::<pcsync_api::Error>(),
        Some(pcsync_api::Error::Auth { .. })
    )));
    Ok(())
}

#[test]
fn test_config_show_masks_secret() -> TestResult {
    let settings = settings_for("https://console.example.io");
    let command = Commands::Config {
        command: ConfigCommands::Show,
    };
    let rendered = execute_command(command, &settings, false)?;
    assert!(rendered.contains("https://console.example.io"));
    assert!(!rendered.contains("s3cret"));
    Ok(())
}
