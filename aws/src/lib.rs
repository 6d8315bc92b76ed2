pub mod api;
pub mod config;
pub mod provider_data;
pub mod resources;

pub use provider_data::AwsProviderData;

use api::CognitoGroups;
use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tfplug::context::Context;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, Provider, ProviderSchemaRequest,
    ProviderSchemaResponse, ResourceFactory,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::validator::{NumberRangeValidator, WholeNumberValidator};

pub struct AwsProvider {
    /// Preset group API; configure skips endpoint resolution when set
    cognito: Option<Arc<dyn CognitoGroups>>,
    provider_data: Option<AwsProviderData>,
}

impl Default for AwsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AwsProvider {
    pub fn new() -> Self {
        Self {
            cognito: None,
            provider_data: None,
        }
    }

    pub fn with_client(cognito: Arc<dyn CognitoGroups>) -> Self {
        Self {
            cognito: Some(cognito),
            provider_data: None,
        }
    }

    /// Data handed to resources by the last successful configure
    pub fn provider_data(&self) -> Option<&AwsProviderData> {
        self.provider_data.as_ref()
    }

    pub fn schema_static() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                SchemaBuilder::new()
                    .version(0)
                    .description("AWS provider for Cognito user pool groups")
                    .attribute(
                        AttributeBuilder::new("region", AttributeType::String)
                            .description(
                                "AWS region (or set AWS_REGION / AWS_DEFAULT_REGION env var)",
                            )
                            .optional()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("endpoint", AttributeType::String)
                            .description(
                                "Custom Cognito endpoint URL (or set \
                                 AWS_ENDPOINT_URL_COGNITO_IDENTITY_PROVIDER env var)",
                            )
                            .optional()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("insecure", AttributeType::Bool)
                            .description(
                                "Skip TLS certificate verification (or set AWS_INSECURE env var)",
                            )
                            .optional()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("timeout_seconds", AttributeType::Number)
                            .description("Per-request timeout in seconds (default 30)")
                            .optional()
                            .validator(WholeNumberValidator)
                            .validator(NumberRangeValidator {
                                min: Some(1.0),
                                max: None,
                            })
                            .build(),
                    )
                    .build()
            })
            .clone()
    }
}

#[async_trait]
impl Provider for AwsProvider {
    fn type_name(&self) -> &str {
        "aws"
    }

    async fn schema(&self, _ctx: Context, _request: ProviderSchemaRequest) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: Self::schema_static(),
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        tracing::debug!(
            "Configuring AWS provider for Terraform {}",
            request.terraform_version
        );

        let mut diagnostics = Self::schema_static().validate(&request.config);
        if tfplug::types::has_errors(&diagnostics) {
            return ConfigureProviderResponse {
                diagnostics,
                provider_data: None,
            };
        }

        let provider_data = match &self.cognito {
            Some(cognito) => AwsProviderData::with_cognito(cognito.clone()),
            None => {
                let client = config::ProviderSettings::from_config(&request.config)
                    .and_then(|settings| settings.build_client());
                match client {
                    Ok(client) => {
                        tracing::debug!("Using Cognito endpoint {}", client.endpoint());
                        AwsProviderData::new(client)
                    }
                    Err(diag) => {
                        diagnostics.push(diag);
                        return ConfigureProviderResponse {
                            diagnostics,
                            provider_data: None,
                        };
                    }
                }
            }
        };

        self.provider_data = Some(provider_data.clone());
        ConfigureProviderResponse {
            diagnostics,
            provider_data: Some(Arc::new(provider_data) as Arc<dyn Any + Send + Sync>),
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut factories: HashMap<String, ResourceFactory> = HashMap::new();
        factories.insert(
            resources::cognito::resource_group::TYPE_NAME.to_string(),
            resources::new_group_resource,
        );
        factories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tfplug::provider::instantiate_resource;
    use tfplug::resource::Resource;
    use tfplug::types::{AttributePath, DynamicValue};

    const ENV_VARS: [&str; 4] = [
        config::ENV_REGION,
        config::ENV_DEFAULT_REGION,
        config::ENV_ENDPOINT,
        config::ENV_INSECURE,
    ];

    fn clear_env() {
        for key in ENV_VARS {
            std::env::remove_var(key);
        }
    }

    fn configure_request(config: DynamicValue) -> ConfigureProviderRequest {
        ConfigureProviderRequest {
            terraform_version: "1.9.0".to_string(),
            config,
        }
    }

    #[tokio::test]
    #[serial]
    async fn provider_configures_successfully_with_env_vars() {
        clear_env();
        std::env::set_var(config::ENV_REGION, "us-east-1");
        std::env::set_var(config::ENV_INSECURE, "true");

        let mut provider = AwsProvider::new();
        let response = provider
            .configure(Context::new(), configure_request(DynamicValue::null()))
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert!(response.provider_data.is_some());
        assert!(provider.provider_data().is_some());

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn provider_configure_requires_region_or_endpoint() {
        clear_env();

        let mut provider = AwsProvider::new();
        let response = provider
            .configure(Context::new(), configure_request(DynamicValue::object()))
            .await;

        assert!(!response.diagnostics.is_empty());
        assert!(response.diagnostics[0].summary.contains("region is required"));
        assert!(response.provider_data.is_none());
    }

    #[tokio::test]
    #[serial]
    async fn provider_configure_accepts_endpoint_from_config() {
        clear_env();

        let mut config = DynamicValue::object();
        config
            .set_string(&AttributePath::new("endpoint"), "http://localhost:9229")
            .unwrap();
        let mut provider = AwsProvider::new();
        let response = provider
            .configure(Context::new(), configure_request(config))
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    }

    #[tokio::test]
    async fn provider_rejects_invalid_timeout() {
        let mut config = DynamicValue::object();
        config
            .set_string(&AttributePath::new("region"), "us-east-1")
            .unwrap();
        config
            .set_number(&AttributePath::new("timeout_seconds"), 0.0)
            .unwrap();

        let mut provider = AwsProvider::new();
        let response = provider
            .configure(Context::new(), configure_request(config))
            .await;

        assert!(tfplug::types::has_errors(&response.diagnostics));
        assert!(response.provider_data.is_none());
    }

    #[tokio::test]
    #[serial]
    async fn provider_creates_resources_after_configuration() {
        clear_env();
        std::env::set_var(config::ENV_REGION, "us-east-1");

        let mut provider = AwsProvider::new();
        let response = provider
            .configure(Context::new(), configure_request(DynamicValue::null()))
            .await;

        let resource =
            instantiate_resource(&provider, "aws_cognito_group", response.provider_data.clone())
                .await;
        assert!(resource.is_ok());
        assert_eq!(resource.unwrap().type_name(), "aws_cognito_group");

        let unknown = instantiate_resource(&provider, "aws_unknown", response.provider_data).await;
        assert!(unknown.is_err());

        clear_env();
    }

    #[tokio::test]
    async fn provider_fails_to_create_resources_before_configuration() {
        let provider = AwsProvider::new();
        let resource = instantiate_resource(&provider, "aws_cognito_group", None).await;
        assert!(resource.is_err());
        assert!(resource
            .err()
            .unwrap()
            .to_string()
            .contains("No provider data"));
    }

    #[test]
    fn provider_schema_is_cached_and_lists_settings() {
        let first = AwsProvider::schema_static();
        let second = AwsProvider::schema_static();
        assert_eq!(first.attributes.len(), second.attributes.len());
        for name in ["region", "endpoint", "insecure", "timeout_seconds"] {
            assert!(first.attribute(name).is_some(), "missing {}", name);
        }
    }
}
