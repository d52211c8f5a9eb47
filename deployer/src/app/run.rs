//! Step execution

use std::future::Future;

use secrecy::{ExposeSecret, SecretString};
use tracing::{error, info};

use crate::app::options::Step;
use crate::app::state::AppState;
use crate::device::config::{update_config_file, DeviceConfigUpdate};
use crate::errors::DeployError;
use crate::filesys::file::File;
use crate::manifest::descriptor::{load_template, write_descriptor, DeploymentParams};
use crate::readiness::poll::{discover_container, PollOptions, PollOutcome};
use crate::readiness::wait::{wait_until_ready, ReadinessOutcome};
use crate::scoring::client::ScoringClient;
use crate::storage::session;
use crate::utils::default_device_id;

/// Run one step, stopping early if `shutdown_signal` fires.
///
/// The session is persisted only when the step succeeds, so a failed or
/// interrupted step leaves the previous session file untouched.
pub async fn run(
    step: Step,
    state: &mut AppState,
    shutdown_signal: impl Future<Output = ()>,
) -> Result<(), DeployError> {
    info!("Running step: {}", step.name());

    let result = tokio::select! {
        result = run_step(step, state) => result,
        _ = shutdown_signal => {
            info!("Shutdown signal received, abandoning step {}", step.name());
            Err(DeployError::Internal(format!("step {} interrupted", step.name())))
        }
    };

    if result.is_ok() {
        if let Err(e) = state.session.save(&state.layout.session_file()).await {
            error!("Failed to save session: {}", e);
            return Err(e);
        }
    }
    result
}

/// Run one step to completion
pub async fn run_step(step: Step, state: &mut AppState) -> Result<(), DeployError> {
    match step {
        Step::Provision => provision(state).await,
        Step::RegisterDevice => register_device(state).await,
        Step::ConfigureDevice => configure_device(state).await,
        Step::Render => render(state).await.map(|_| ()),
        Step::Deploy => deploy(state).await,
        Step::Wait => wait(state).await.map(|_| ()),
        Step::Score => score(state).await,
        Step::Up => {
            deploy(state).await?;
            wait(state).await.map(|_| ())
        }
    }
}

// =============================== PROVISIONING ================================== //

async fn provision(state: &mut AppState) -> Result<(), DeployError> {
    if let Some(subscription_id) = state.session.subscription_id.clone() {
        state.az.set_subscription(&subscription_id).await?;
    }

    let resource_group = state.session.require(session::RESOURCE_GROUP)?.to_string();
    let location = state.session.require(session::LOCATION)?.to_string();
    let hub_name = state.session.require(session::HUB_NAME)?.to_string();

    state.az.create_resource_group(&resource_group, &location).await?;
    state
        .az
        .create_iot_hub(&resource_group, &hub_name, &state.settings.hub_sku)
        .await?;

    println!("IoT Hub '{}' provisioned in resource group '{}'", hub_name, resource_group);
    Ok(())
}

async fn register_device(state: &mut AppState) -> Result<(), DeployError> {
    let hub_name = state.session.require(session::HUB_NAME)?.to_string();
    let device_id = match state.session.device_id.clone() {
        Some(id) if !id.is_empty() => id,
        _ => {
            let id = default_device_id();
            info!("No device id given, using '{}'", id);
            state.session.set(session::DEVICE_ID, id.clone());
            id
        }
    };

    state.az.create_edge_device(&hub_name, &device_id).await?;
    let connection_string = state.az.device_connection_string(&hub_name, &device_id).await?;

    println!("Edge device '{}' registered with hub '{}'", device_id, hub_name);
    if state.args.flag("print_connection_string") {
        println!("{}", connection_string.expose_secret());
    } else {
        println!("Run `edge-deployer configure-device` on the edge host to install its connection string");
    }
    Ok(())
}

async fn configure_device(state: &mut AppState) -> Result<(), DeployError> {
    let hub_name = state.session.require(session::HUB_NAME)?.to_string();
    let device_id = state.session.require(session::DEVICE_ID)?.to_string();
    let config_path = state
        .args
        .get("config")
        .unwrap_or(state.settings.device_config.path.as_str())
        .to_string();

    let connection_string = state.az.device_connection_string(&hub_name, &device_id).await?;
    let update = DeviceConfigUpdate {
        connection_string,
        management_uri: state.settings.device_config.management_uri.clone(),
        workload_uri: state.settings.device_config.workload_uri.clone(),
    };
    update_config_file(&File::new(&config_path), &update).await?;

    println!("Updated {}; restart the edge runtime to apply it", config_path);
    Ok(())
}

// =============================== DEPLOYMENT ================================== //

async fn render(state: &mut AppState) -> Result<File, DeployError> {
    let module_name = state.session.require(session::MODULE_NAME)?.to_string();
    let registry_name = state.session.require(session::REGISTRY_NAME)?.to_string();
    let image_location = state.session.require(session::IMAGE_NAME)?.to_string();

    let (registry_username, registry_password) = match (
        state.args.get("registry_username"),
        state.args.get("registry_password"),
    ) {
        (Some(username), Some(password)) => {
            (username.to_string(), SecretString::from(password.to_string()))
        }
        _ => {
            info!("Fetching credentials for registry {}", registry_name);
            let creds = state.az.registry_credentials(&registry_name).await?;
            (creds.username, creds.password)
        }
    };

    let params = DeploymentParams {
        module_name,
        registry_name,
        registry_username,
        registry_password,
        image_location,
    };

    let template = load_template(&state.layout.template_file()).await?;
    let output = state.layout.deployment_file();
    let rendered = write_descriptor(&template, &params, state.settings.strict_templates, &output).await?;
    for key in &rendered.unused {
        println!("warning: placeholder {} not found in template", key);
    }

    println!("Deployment descriptor written to {}", output.path().display());
    Ok(output)
}

async fn deploy(state: &mut AppState) -> Result<(), DeployError> {
    let descriptor = render(state).await?;
    let hub_name = state.session.require(session::HUB_NAME)?.to_string();
    let device_id = state.session.require(session::DEVICE_ID)?.to_string();

    state
        .az
        .set_modules(&hub_name, &device_id, descriptor.path())
        .await?;

    println!("Deployment pushed to device '{}'", device_id);
    Ok(())
}

// =============================== VERIFICATION ================================== //

async fn wait(state: &mut AppState) -> Result<ReadinessOutcome, DeployError> {
    let module_name = state.session.require(session::MODULE_NAME)?.to_string();
    let options = PollOptions::from(&state.settings.discovery);

    let container_id = match discover_container(
        state.runtime.as_ref(),
        &module_name,
        &options,
        tokio::time::sleep,
    )
    .await
    {
        PollOutcome::Success { value, .. } => value,
        PollOutcome::Timeout { attempts } => {
            return Err(DeployError::NotReady(format!(
                "no container named like '{}' after timeout ({} listings)",
                module_name, attempts
            )))
        }
        PollOutcome::Exhausted { attempts } => {
            return Err(DeployError::NotReady(format!(
                "no container named like '{}' after {} listings",
                module_name, attempts
            )))
        }
    };

    let readiness = &state.settings.readiness;
    let outcome = wait_until_ready(
        state.runtime.as_ref(),
        &container_id,
        &readiness.marker,
        readiness.timeout(),
        readiness.echo,
    )
    .await?;

    match &outcome {
        ReadinessOutcome::Ready { .. } => {
            println!("Module '{}' is up (container {})", module_name, container_id);
            Ok(outcome)
        }
        ReadinessOutcome::TimedOut { lines_consumed } => Err(DeployError::NotReady(format!(
            "'{}' not seen within the timeout ({} log lines read)",
            readiness.marker, lines_consumed
        ))),
        ReadinessOutcome::StreamClosed { lines_consumed } => Err(DeployError::NotReady(format!(
            "container {} closed its output after {} lines without '{}'",
            container_id, lines_consumed, readiness.marker
        ))),
    }
}

async fn score(state: &mut AppState) -> Result<(), DeployError> {
    let text = state
        .args
        .get("text")
        .filter(|t| !t.is_empty())
        .ok_or_else(|| DeployError::ValidationError("score needs --text=<question>".to_string()))?
        .to_string();

    let client = ScoringClient::new(&state.settings.scoring)?;
    let triples = client.score(&text).await?;

    println!("{} result(s) from {}", triples.len(), client.endpoint());
    for (rank, triple) in triples.iter().enumerate() {
        println!("{:>3}. {}  {}  {:.4}", rank + 1, triple.id_a, triple.id_b, triple.score);
    }
    Ok(())
}
