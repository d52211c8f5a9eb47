//! Azure CLI wrapper
//!
//! Resource creation commands log failures and return the raw output, since
//! re-running a step against existing resources is the common case. Commands
//! whose output later steps depend on fail hard.

use std::path::Path;
use std::sync::Arc;

use secrecy::SecretString;
use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::DeployError;
use crate::process::runner::{args, CommandOutput, CommandRunner};

/// Container registry login
#[derive(Debug, Clone)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: SecretString,
}

/// `az` invocations used by the deployment steps
#[derive(Clone)]
pub struct AzCli {
    program: String,
    runner: Arc<dyn CommandRunner>,
}

impl AzCli {
    pub fn new(program: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }

    async fn az(&self, list: &[&str]) -> Result<CommandOutput, DeployError> {
        self.runner.run(&self.program, &args(list)).await
    }

    fn describe(list: &[&str]) -> String {
        format!("az {}", list.iter().take(4).copied().collect::<Vec<_>>().join(" "))
    }

    /// Select the subscription used by later commands
    pub async fn set_subscription(&self, subscription_id: &str) -> Result<(), DeployError> {
        let list = ["account", "set", "--subscription", subscription_id];
        self.az(&list).await?.into_result(&Self::describe(&list))?;
        info!("Using subscription {}", subscription_id);
        Ok(())
    }

    pub async fn create_resource_group(&self, name: &str, location: &str) -> Result<CommandOutput, DeployError> {
        let list = ["group", "create", "--name", name, "--location", location];
        let output = self.az(&list).await?;
        output.log_failure(&Self::describe(&list));
        Ok(output)
    }

    pub async fn create_iot_hub(&self, resource_group: &str, hub_name: &str, sku: &str) -> Result<CommandOutput, DeployError> {
        let list = [
            "iot", "hub", "create",
            "--resource-group", resource_group,
            "--name", hub_name,
            "--sku", sku,
        ];
        let output = self.az(&list).await?;
        output.log_failure(&Self::describe(&list));
        Ok(output)
    }

    /// Register an edge-enabled device identity
    pub async fn create_edge_device(&self, hub_name: &str, device_id: &str) -> Result<CommandOutput, DeployError> {
        let list = [
            "iot", "hub", "device-identity", "create",
            "--hub-name", hub_name,
            "--device-id", device_id,
            "--edge-enabled",
        ];
        let output = self.az(&list).await?;
        output.log_failure(&Self::describe(&list));
        Ok(output)
    }

    pub async fn device_connection_string(&self, hub_name: &str, device_id: &str) -> Result<SecretString, DeployError> {
        let list = [
            "iot", "hub", "device-identity", "connection-string", "show",
            "--hub-name", hub_name,
            "--device-id", device_id,
            "--output", "json",
        ];
        let output = self.az(&list).await?.into_result(&Self::describe(&list))?;
        parse_connection_string(&output.stdout)
    }

    pub async fn registry_credentials(&self, registry_name: &str) -> Result<RegistryCredentials, DeployError> {
        let list = ["acr", "credential", "show", "--name", registry_name, "--output", "json"];
        let output = self.az(&list).await?.into_result(&Self::describe(&list))?;
        parse_registry_credentials(&output.stdout)
    }

    /// Push a deployment descriptor to the device
    pub async fn set_modules(&self, hub_name: &str, device_id: &str, content: &Path) -> Result<CommandOutput, DeployError> {
        let content = content.to_string_lossy().into_owned();
        let list: [&str; 9] = [
            "iot", "edge", "set-modules",
            "--hub-name", hub_name,
            "--device-id", device_id,
            "--content", content.as_str(),
        ];
        let output = self.az(&list).await?.into_result(&Self::describe(&list))?;
        debug!("set-modules output: {}", output.stdout.trim());
        Ok(output)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionStringResponse {
    connection_string: String,
}

fn parse_connection_string(stdout: &str) -> Result<SecretString, DeployError> {
    let response: ConnectionStringResponse = serde_json::from_str(stdout)?;
    if response.connection_string.is_empty() {
        return Err(DeployError::NotFound("device connection string".to_string()));
    }
    Ok(SecretString::from(response.connection_string))
}

#[derive(Deserialize)]
struct AcrCredentialResponse {
    username: String,
    #[serde(default)]
    passwords: Vec<AcrPassword>,
}

#[derive(Deserialize)]
struct AcrPassword {
    value: String,
}

fn parse_registry_credentials(stdout: &str) -> Result<RegistryCredentials, DeployError> {
    let response: AcrCredentialResponse = serde_json::from_str(stdout)?;
    let password = response
        .passwords
        .into_iter()
        .map(|p| p.value)
        .find(|v| !v.is_empty())
        .ok_or_else(|| DeployError::NotFound("registry password (is the admin user enabled?)".to_string()))?;
    Ok(RegistryCredentials {
        username: response.username,
        password: SecretString::from(password),
    })
}
