//! Deployment descriptor templating tests

use edge_deployer::errors::{DeployError, TemplateError};
use edge_deployer::filesys::dir::Dir;
use edge_deployer::manifest::descriptor::{
    load_template, render_descriptor, write_descriptor, DeploymentParams, DEFAULT_TEMPLATE,
};
use edge_deployer::manifest::template::{render, Placeholders};
use secrecy::SecretString;

fn params() -> DeploymentParams {
    DeploymentParams {
        module_name: "mymodule".to_string(),
        registry_name: "myregistry".to_string(),
        registry_username: "myregistry".to_string(),
        registry_password: SecretString::from("p@ss\"word".to_string()),
        image_location: "myregistry.azurecr.io/mymodule:1.0".to_string(),
    }
}

fn mapping(pairs: &[(&str, &str)]) -> Placeholders {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_render_module_name() {
    let rendered = render(
        r#"{"name":"__MODULE_NAME"}"#,
        &mapping(&[("__MODULE_NAME", "mymodule")]),
        false,
    )
    .unwrap();
    assert_eq!(rendered.document, r#"{"name":"mymodule"}"#);
    assert!(rendered.unused.is_empty());
}

#[test]
fn test_stale_placeholder_warns_or_fails() {
    let template = r#"{"name":"__MODULE_NAME"}"#;
    let values = mapping(&[("__MODULE_NAME", "mymodule"), ("__REGISTRY_NAME", "myregistry")]);

    let rendered = render(template, &values, false).unwrap();
    assert_eq!(rendered.unused, vec!["__REGISTRY_NAME".to_string()]);

    assert_eq!(
        render(template, &values, true),
        Err(TemplateError::UnusedPlaceholder("__REGISTRY_NAME".to_string()))
    );
}

#[test]
fn test_unmapped_token_is_rejected() {
    let result = render(
        r#"{"name":"__MODULE_NAME","tag":"__IMAGE_TAG"}"#,
        &mapping(&[("__MODULE_NAME", "mymodule")]),
        false,
    );
    assert_eq!(result, Err(TemplateError::UnresolvedToken("__IMAGE_TAG".to_string())));
}

#[test]
fn test_default_template_renders_to_valid_descriptor() {
    let rendered = render_descriptor(DEFAULT_TEMPLATE, &params(), true).unwrap();
    assert!(!rendered.document.contains("__"));

    let doc: serde_json::Value = serde_json::from_str(&rendered.document).unwrap();
    let desired = &doc["modulesContent"]["$edgeAgent"]["properties.desired"];
    let creds = &desired["runtime"]["settings"]["registryCredentials"]["myregistry"];
    assert_eq!(creds["address"], "myregistry.azurecr.io");
    assert_eq!(creds["password"], "p@ss\"word");
    assert_eq!(
        desired["modules"]["mymodule"]["settings"]["image"],
        "myregistry.azurecr.io/mymodule:1.0"
    );
}

#[tokio::test]
async fn test_write_descriptor_overwrites_previous_output() {
    let dir = Dir::create_temp_dir("edge-deployer-templating").await.unwrap();
    let output = dir.file("deployment.json");
    output.write_string("stale").await.unwrap();

    let template = load_template(&dir.file("missing.template.json")).await.unwrap();
    assert_eq!(template, DEFAULT_TEMPLATE);

    write_descriptor(&template, &params(), false, &output).await.unwrap();
    let written = output.read_string().await.unwrap();
    assert!(written.contains("\"mymodule\""));
    assert!(!written.contains("stale"));

    dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_template_that_is_not_json_is_rejected() {
    let dir = Dir::create_temp_dir("edge-deployer-templating").await.unwrap();
    let template = "modules: __MODULE_NAME __REGISTRY_NAME __REGISTRY_USER_NAME __REGISTRY_PASSWORD __REGISTRY_IMAGE_LOCATION";

    let result = write_descriptor(template, &params(), true, &dir.file("deployment.json")).await;
    assert!(matches!(
        result,
        Err(DeployError::TemplateError(TemplateError::InvalidDocument(_)))
    ));
    assert!(!dir.file("deployment.json").exists().await);

    dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_password_holding_a_placeholder_is_not_written() {
    let dir = Dir::create_temp_dir("edge-deployer-templating").await.unwrap();
    let output = dir.file("deployment.json");
    let mut values = params();
    values.registry_password = SecretString::from("ab__MODULE_NAMEcd".to_string());

    assert_eq!(
        render_descriptor(DEFAULT_TEMPLATE, &values, false).err(),
        Some(TemplateError::TokenInValue("__REGISTRY_PASSWORD".to_string()))
    );
    let result = write_descriptor(DEFAULT_TEMPLATE, &values, false, &output).await;
    assert!(matches!(
        result,
        Err(DeployError::TemplateError(TemplateError::TokenInValue(_)))
    ));
    assert!(!output.exists().await);

    dir.delete().await.unwrap();
}
