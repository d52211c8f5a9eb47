//! Step tests with fake `az` and container runtime

use std::sync::Arc;

use edge_deployer::app::options::{CliArgs, Step};
use edge_deployer::app::run::{run, run_step};
use edge_deployer::app::state::AppState;
use edge_deployer::azure::cli::AzCli;
use edge_deployer::errors::DeployError;
use edge_deployer::filesys::dir::Dir;
use edge_deployer::storage::layout::StorageLayout;
use edge_deployer::storage::session::{self, Session};
use edge_deployer::storage::settings::Settings;
use tokio_test::{assert_err, assert_ok};

use crate::common::{container, FakeRunner, FakeRuntime};

const CONNECTION_STRING: &str = r#"{"connectionString": "HostName=hub1.azure-devices.net;DeviceId=edge-01;SharedAccessKey=abc="}"#;

fn args(list: &[&str]) -> CliArgs {
    CliArgs::parse(list.iter().map(|s| s.to_string()))
}

fn settings() -> Settings {
    let mut settings = Settings::default();
    settings.discovery.interval_ms = 1;
    settings.discovery.max_attempts = Some(3);
    settings.readiness.timeout_secs = Some(2);
    settings.readiness.echo = false;
    settings
}

fn full_session() -> Session {
    let mut target = Session::default();
    target.set(session::RESOURCE_GROUP, "rg1");
    target.set(session::LOCATION, "westeurope");
    target.set(session::HUB_NAME, "hub1");
    target.set(session::DEVICE_ID, "edge-01");
    target.set(session::MODULE_NAME, "mymodule");
    target.set(session::IMAGE_NAME, "myregistry.azurecr.io/mymodule:1.0");
    target.set(session::REGISTRY_NAME, "myregistry");
    target
}

struct Harness {
    dir: Dir,
    runner: Arc<FakeRunner>,
    state: AppState,
}

async fn harness(session: Session, cli: CliArgs, runner: FakeRunner, runtime: FakeRuntime) -> Harness {
    let dir = Dir::create_temp_dir("edge-deployer-steps").await.unwrap();
    let layout = StorageLayout::new(dir.path());
    layout.setup().await.unwrap();

    let runner = Arc::new(runner);
    let az = AzCli::new("az", runner.clone());
    let state = AppState::with_backends(layout, settings(), session, cli, az, Arc::new(runtime));
    Harness { dir, runner, state }
}

#[tokio::test]
async fn test_provision_continues_when_resources_exist() {
    let runner = FakeRunner::new().fail(&["iot", "hub", "create"], "IotHub name 'hub1' is not available");
    let mut h = harness(full_session(), args(&["provision"]), runner, FakeRuntime::new()).await;

    assert_ok!(run_step(Step::Provision, &mut h.state).await);
    assert_eq!(h.runner.calls_to(&["group", "create"]).len(), 1);
    assert_eq!(
        h.runner.calls_to(&["iot", "hub", "create"])[0],
        vec!["iot", "hub", "create", "--resource-group", "rg1", "--name", "hub1", "--sku", "S1"]
    );
    assert!(h.runner.calls_to(&["account", "set"]).is_empty());

    h.dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_missing_session_value_names_the_flag() {
    let mut h = harness(Session::default(), args(&["provision"]), FakeRunner::new(), FakeRuntime::new()).await;

    let err = assert_err!(run_step(Step::Provision, &mut h.state).await);
    assert!(err.to_string().contains("--resource-group"));
    assert!(h.runner.calls().is_empty());

    h.dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_register_device_defaults_to_hostname() {
    let mut target = full_session();
    target.device_id = None;
    let runner = FakeRunner::new().reply(&["iot", "hub", "device-identity", "connection-string"], CONNECTION_STRING);
    let mut h = harness(target, args(&["register-device"]), runner, FakeRuntime::new()).await;

    assert_ok!(run_step(Step::RegisterDevice, &mut h.state).await);
    let device_id = h.state.session.device_id.clone().unwrap();
    assert!(!device_id.is_empty());
    let create = &h.runner.calls_to(&["iot", "hub", "device-identity", "create"])[0];
    assert!(create.contains(&device_id));
    assert!(create.contains(&"--edge-enabled".to_string()));

    h.dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_configure_device_writes_connection_string() {
    let runner = FakeRunner::new().reply(&["iot", "hub", "device-identity", "connection-string"], CONNECTION_STRING);
    let dir = Dir::create_temp_dir("edge-deployer-config").await.unwrap();
    let config = dir.file("config.yaml");
    config
        .write_string(
            "provisioning:\n  source: \"manual\"\n  device_connection_string: \"<ADD DEVICE CONNECTION STRING HERE>\"\n\
             connect:\n  management_uri: \"unix:///var/run/iotedge/mgmt.sock\"\n  workload_uri: \"unix:///var/run/iotedge/workload.sock\"\n",
        )
        .await
        .unwrap();

    let config_arg = format!("--config={}", config.path().display());
    let mut h = harness(full_session(), args(&["configure-device", &config_arg]), runner, FakeRuntime::new()).await;

    assert_ok!(run_step(Step::ConfigureDevice, &mut h.state).await);
    let written = config.read_string().await.unwrap();
    assert!(written.contains("SharedAccessKey=abc="));
    assert!(written.contains("http://172.17.0.1:15580"));
    assert!(written.contains("http://172.17.0.1:15581"));

    dir.delete().await.unwrap();
    h.dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_deploy_renders_and_pushes_descriptor() {
    let cli = args(&["deploy", "--registry-username=myregistry", "--registry-password=secret"]);
    let mut h = harness(full_session(), cli, FakeRunner::new(), FakeRuntime::new()).await;

    assert_ok!(run_step(Step::Deploy, &mut h.state).await);

    let descriptor = h.state.layout.deployment_file();
    let doc: serde_json::Value = serde_json::from_str(&descriptor.read_string().await.unwrap()).unwrap();
    assert_eq!(
        doc["modulesContent"]["$edgeAgent"]["properties.desired"]["modules"]["mymodule"]["settings"]["image"],
        "myregistry.azurecr.io/mymodule:1.0"
    );

    let set_modules = &h.runner.calls_to(&["iot", "edge", "set-modules"])[0];
    assert!(set_modules.contains(&descriptor.path().display().to_string()));
    assert!(h.runner.calls_to(&["acr"]).is_empty());

    h.dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_deploy_fails_when_set_modules_fails() {
    let runner = FakeRunner::new()
        .reply(&["acr", "credential", "show"], r#"{"username": "myregistry", "passwords": [{"name": "password", "value": "secret"}]}"#)
        .fail(&["iot", "edge", "set-modules"], "Device 'edge-01' not found");
    let mut h = harness(full_session(), args(&["deploy"]), runner, FakeRuntime::new()).await;

    let err = assert_err!(run_step(Step::Deploy, &mut h.state).await);
    assert!(matches!(err, DeployError::CommandError { .. }));
    assert_eq!(h.runner.calls_to(&["acr", "credential", "show"]).len(), 1);

    h.dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_up_deploys_then_waits_for_marker() {
    let runtime = FakeRuntime::new()
        .listing(vec![container("a1", "edgeAgent")])
        .listing(vec![container("a1", "edgeAgent"), container("b2", "mymodule")])
        .logs("b2", &["Using TensorFlow backend.", "Opened module client connection"])
        .hold_open();
    let cli = args(&["up", "--registry-username=u", "--registry-password=p"]);
    let mut h = harness(full_session(), cli, FakeRunner::new(), runtime).await;

    assert_ok!(run(Step::Up, &mut h.state, std::future::pending()).await);
    assert_eq!(h.runner.calls_to(&["iot", "edge", "set-modules"]).len(), 1);

    let saved = Session::load(&h.state.layout.session_file()).await.unwrap();
    assert_eq!(saved.module_name.as_deref(), Some("mymodule"));

    h.dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_wait_reports_missing_container() {
    let runtime = FakeRuntime::new().listing(vec![container("a1", "edgeAgent")]);
    let mut h = harness(full_session(), args(&["wait"]), FakeRunner::new(), runtime).await;

    let err = assert_err!(run_step(Step::Wait, &mut h.state).await);
    assert!(matches!(err, DeployError::NotReady(_)));

    h.dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_wait_reports_crashed_module() {
    let runtime = FakeRuntime::new()
        .listing(vec![container("b2", "mymodule")])
        .logs("b2", &["Traceback (most recent call last):"]);
    let mut h = harness(full_session(), args(&["wait"]), FakeRunner::new(), runtime).await;

    let err = assert_err!(run_step(Step::Wait, &mut h.state).await);
    assert!(err.to_string().contains("closed its output"));

    h.dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_interrupted_step_keeps_previous_session() {
    let runtime = FakeRuntime::new()
        .listing(vec![container("b2", "mymodule")])
        .logs("b2", &[])
        .hold_open();
    let mut h = harness(full_session(), args(&["wait"]), FakeRunner::new(), runtime).await;
    h.state.settings.readiness.timeout_secs = None;

    let result = run(Step::Wait, &mut h.state, async {}).await;
    assert!(matches!(result, Err(DeployError::Internal(_))));
    assert!(!h.state.layout.session_file().exists().await);

    h.dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_score_requires_text() {
    let mut h = harness(full_session(), args(&["score"]), FakeRunner::new(), FakeRuntime::new()).await;

    let err = assert_err!(run_step(Step::Score, &mut h.state).await);
    assert!(matches!(err, DeployError::ValidationError(_)));

    h.dir.delete().await.unwrap();
}
