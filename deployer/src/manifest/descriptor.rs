//! Deployment descriptor for a single model module

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::errors::{DeployError, TemplateError};
use crate::filesys::file::File;
use crate::manifest::template::{render, Placeholders, Rendered};

pub const MODULE_NAME: &str = "__MODULE_NAME";
pub const REGISTRY_NAME: &str = "__REGISTRY_NAME";
pub const REGISTRY_USER_NAME: &str = "__REGISTRY_USER_NAME";
pub const REGISTRY_PASSWORD: &str = "__REGISTRY_PASSWORD";
pub const REGISTRY_IMAGE_LOCATION: &str = "__REGISTRY_IMAGE_LOCATION";

/// Built-in IoT Edge deployment skeleton
pub const DEFAULT_TEMPLATE: &str = include_str!("../../templates/deployment.template.json");

/// Values substituted into the deployment skeleton
#[derive(Debug, Clone)]
pub struct DeploymentParams {
    pub module_name: String,
    pub registry_name: String,
    pub registry_username: String,
    pub registry_password: SecretString,
    pub image_location: String,
}

impl DeploymentParams {
    /// Placeholder mapping with values escaped for a JSON string context
    pub fn placeholders(&self) -> Placeholders {
        [
            (MODULE_NAME, self.module_name.as_str()),
            (REGISTRY_NAME, self.registry_name.as_str()),
            (REGISTRY_USER_NAME, self.registry_username.as_str()),
            (REGISTRY_PASSWORD, self.registry_password.expose_secret()),
            (REGISTRY_IMAGE_LOCATION, self.image_location.as_str()),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), escape_json_fragment(value)))
        .collect()
    }
}

/// Read the template override, or fall back to the built-in skeleton
pub async fn load_template(template_file: &File) -> Result<String, DeployError> {
    if template_file.exists().await {
        debug!("Using deployment template {:?}", template_file.path());
        template_file.read_string().await
    } else {
        Ok(DEFAULT_TEMPLATE.to_string())
    }
}

/// Render the descriptor and check the result is a JSON document
pub fn render_descriptor(
    template: &str,
    params: &DeploymentParams,
    strict: bool,
) -> Result<Rendered, TemplateError> {
    let rendered = render(template, &params.placeholders(), strict)?;
    serde_json::from_str::<serde_json::Value>(&rendered.document)
        .map_err(|e| TemplateError::InvalidDocument(e.to_string()))?;
    Ok(rendered)
}

/// Render the descriptor and write it to `output`, overwriting it
pub async fn write_descriptor(
    template: &str,
    params: &DeploymentParams,
    strict: bool,
    output: &File,
) -> Result<Rendered, DeployError> {
    let rendered = render_descriptor(template, params, strict)?;
    output.write_string(&rendered.document).await?;
    info!(
        "Deployment descriptor for module {} written to {:?}",
        params.module_name,
        output.path()
    );
    Ok(rendered)
}

fn escape_json_fragment(value: &str) -> String {
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}
