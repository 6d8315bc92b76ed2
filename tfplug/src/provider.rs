//! Provider trait and related types
//!
//! A provider owns configuration and hands per-resource factories to the
//! framework. Resources are created on demand for each request and receive
//! the provider data produced by `configure`.

use crate::context::Context;
use crate::error::{Result, TfplugError};
use crate::resource::{ConfigureResourceRequest, ResourceWithConfigure};
use crate::schema::Schema;
use crate::types::{has_errors, Diagnostic, DynamicValue};
use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Factory producing a fresh, unconfigured resource instance
pub type ResourceFactory = fn() -> Box<dyn ResourceWithConfigure>;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name, the prefix of every resource type (e.g., "aws")
    fn type_name(&self) -> &str;

    /// Schema of the provider configuration block
    async fn schema(&self, ctx: Context, request: ProviderSchemaRequest) -> ProviderSchemaResponse;

    /// Called once with the provider block; returns data shared with resources
    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse;

    /// Resource factories keyed by resource type name
    fn resources(&self) -> HashMap<String, ResourceFactory>;
}

pub struct ProviderSchemaRequest;

pub struct ProviderSchemaResponse {
    pub schema: Schema,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ConfigureProviderRequest {
    pub terraform_version: String,
    pub config: DynamicValue,
}

pub struct ConfigureProviderResponse {
    pub diagnostics: Vec<Diagnostic>,
    /// Passed to every resource's configure; downcast on the other side
    pub provider_data: Option<Arc<dyn Any + Send + Sync>>,
}

/// Builds a resource from its factory and configures it with provider data,
/// the same sequence the plugin server runs before every resource call
pub async fn instantiate_resource(
    provider: &dyn Provider,
    type_name: &str,
    provider_data: Option<Arc<dyn Any + Send + Sync>>,
) -> Result<Box<dyn ResourceWithConfigure>> {
    let factory = provider
        .resources()
        .get(type_name)
        .copied()
        .ok_or_else(|| TfplugError::ResourceNotFound(type_name.to_string()))?;

    let mut resource = factory();
    let response = resource
        .configure(
            Context::for_operation(type_name, "configure"),
            ConfigureResourceRequest { provider_data },
        )
        .await;

    if has_errors(&response.diagnostics) {
        let summaries: Vec<_> = response
            .diagnostics
            .iter()
            .map(|d| d.summary.as_str())
            .collect();
        return Err(TfplugError::Custom(format!(
            "failed to configure {}: {}",
            type_name,
            summaries.join("; ")
        )));
    }

    Ok(resource)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::*;
    use crate::schema::SchemaBuilder;

    #[derive(Default)]
    struct Widget {
        configured: bool,
    }

    #[async_trait]
    impl Resource for Widget {
        fn type_name(&self) -> &str {
            "test_widget"
        }

        async fn schema(&self, _ctx: Context, _request: ResourceSchemaRequest) -> ResourceSchemaResponse {
            ResourceSchemaResponse {
                schema: SchemaBuilder::new().build(),
                diagnostics: vec![],
            }
        }

        async fn validate(
            &self,
            _ctx: Context,
            _request: ValidateResourceConfigRequest,
        ) -> ValidateResourceConfigResponse {
            ValidateResourceConfigResponse {
                diagnostics: vec![],
            }
        }

        async fn create(&self, _ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
            CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![],
            }
        }

        async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
            ReadResourceResponse {
                new_state: self.configured.then_some(request.current_state),
                diagnostics: vec![],
            }
        }

        async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
            UpdateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![],
            }
        }

        async fn delete(&self, _ctx: Context, _request: DeleteResourceRequest) -> DeleteResourceResponse {
            DeleteResourceResponse {
                diagnostics: vec![],
            }
        }
    }

    #[async_trait]
    impl ResourceWithConfigure for Widget {
        async fn configure(
            &mut self,
            _ctx: Context,
            request: ConfigureResourceRequest,
        ) -> ConfigureResourceResponse {
            let mut diagnostics = vec![];
            match request.provider_data {
                Some(data) if data.downcast_ref::<u32>().is_some() => self.configured = true,
                _ => diagnostics.push(Diagnostic::error("No provider data", "expected u32")),
            }
            ConfigureResourceResponse { diagnostics }
        }
    }

    struct WidgetProvider;

    #[async_trait]
    impl Provider for WidgetProvider {
        fn type_name(&self) -> &str {
            "test"
        }

        async fn schema(&self, _ctx: Context, _request: ProviderSchemaRequest) -> ProviderSchemaResponse {
            ProviderSchemaResponse {
                schema: SchemaBuilder::new().build(),
                diagnostics: vec![],
            }
        }

        async fn configure(
            &mut self,
            _ctx: Context,
            _request: ConfigureProviderRequest,
        ) -> ConfigureProviderResponse {
            ConfigureProviderResponse {
                diagnostics: vec![],
                provider_data: Some(Arc::new(7u32) as Arc<dyn Any + Send + Sync>),
            }
        }

        fn resources(&self) -> HashMap<String, ResourceFactory> {
            let mut factories: HashMap<String, ResourceFactory> = HashMap::new();
            factories.insert("test_widget".to_string(), || {
                Box::new(Widget::default()) as Box<dyn ResourceWithConfigure>
            });
            factories
        }
    }

    #[test]
    fn instantiates_and_configures_known_resources() {
        tokio_test::block_on(async {
            let mut provider = WidgetProvider;
            let configured = provider
                .configure(
                    Context::new(),
                    ConfigureProviderRequest {
                        terraform_version: "1.9.0".to_string(),
                        config: DynamicValue::null(),
                    },
                )
                .await;

            let resource = instantiate_resource(&provider, "test_widget", configured.provider_data)
                .await
                .unwrap();
            let response = resource
                .read(
                    Context::new(),
                    ReadResourceRequest {
                        type_name: "test_widget".to_string(),
                        current_state: DynamicValue::object(),
                    },
                )
                .await;
            assert!(response.new_state.is_some());
        });
    }

    #[test]
    fn unknown_type_is_resource_not_found() {
        let result = tokio_test::block_on(instantiate_resource(&WidgetProvider, "test_gadget", None));
        assert!(matches!(result, Err(TfplugError::ResourceNotFound(name)) if name == "test_gadget"));
    }

    #[test]
    fn configure_failures_are_reported_with_summaries() {
        let result = tokio_test::block_on(instantiate_resource(&WidgetProvider, "test_widget", None));
        let err = result.err().unwrap();
        assert_eq!(
            err.to_string(),
            "failed to configure test_widget: No provider data"
        );
    }
}
