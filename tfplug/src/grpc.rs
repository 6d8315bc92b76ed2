//! tfplugin6 gRPC service backed by a `Provider`
//!
//! Resource RPCs build a fresh resource from the provider's factory and the
//! data returned by the last successful ConfigureProvider call. Values cross
//! the wire as msgpack in both directions.

use crate::context::Context;
use crate::error::TfplugError;
use crate::proto::{self, attribute_path, diagnostic, provider_server::Provider as ProtoProvider};
use crate::provider::{
    instantiate_resource, ConfigureProviderRequest, Provider, ProviderSchemaRequest,
    ResourceFactory,
};
use crate::resource::{
    CreateResourceRequest, DeleteResourceRequest, ImportResourceStateRequest, ReadResourceRequest,
    Resource, ResourceSchemaRequest, ResourceWithConfigure, ResourceWithImportState,
    UpdateResourceRequest, ValidateResourceConfigRequest,
};
use crate::schema::{AttributeType, Schema};
use crate::types::{has_errors, AttributePath, Diagnostic, DiagnosticSeverity, Dynamic, DynamicValue};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tonic::{Request, Response, Status};

type ProviderData = Option<Arc<dyn Any + Send + Sync>>;

pub struct GrpcProviderServer<P: Provider> {
    provider: RwLock<P>,
    provider_data: RwLock<ProviderData>,
}

impl<P: Provider + 'static> GrpcProviderServer<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider: RwLock::new(provider),
            provider_data: RwLock::new(None),
        }
    }

    async fn factory(&self, type_name: &str) -> Result<ResourceFactory, Status> {
        self.provider
            .read()
            .await
            .resources()
            .get(type_name)
            .copied()
            .ok_or_else(|| to_status(TfplugError::ResourceNotFound(type_name.to_string())))
    }

    async fn resource_schema(&self, type_name: &str) -> Result<Schema, Status> {
        let factory = self.factory(type_name).await?;
        let response = factory()
            .schema(
                Context::for_operation(type_name, "schema"),
                ResourceSchemaRequest,
            )
            .await;
        Ok(response.schema)
    }

    async fn configured_resource(
        &self,
        type_name: &str,
    ) -> Result<Box<dyn ResourceWithConfigure>, Status> {
        let provider = self.provider.read().await;
        let provider_data = self.provider_data.read().await.clone();
        instantiate_resource(&*provider, type_name, provider_data)
            .await
            .map_err(to_status)
    }
}

#[tonic::async_trait]
impl<P: Provider + 'static> ProtoProvider for GrpcProviderServer<P> {
    async fn get_metadata(
        &self,
        _request: Request<proto::get_metadata::Request>,
    ) -> Result<Response<proto::get_metadata::Response>, Status> {
        let mut resources: Vec<_> = self
            .provider
            .read()
            .await
            .resources()
            .into_keys()
            .map(|type_name| proto::get_metadata::ResourceMetadata { type_name })
            .collect();
        resources.sort_by(|a, b| a.type_name.cmp(&b.type_name));

        Ok(Response::new(proto::get_metadata::Response {
            server_capabilities: Some(server_capabilities()),
            diagnostics: vec![],
            resources,
        }))
    }

    async fn get_provider_schema(
        &self,
        _request: Request<proto::get_provider_schema::Request>,
    ) -> Result<Response<proto::get_provider_schema::Response>, Status> {
        let provider = self.provider.read().await;
        let provider_schema = provider.schema(Context::new(), ProviderSchemaRequest).await;
        let mut diagnostics = provider_schema.diagnostics;

        let mut resource_schemas = HashMap::new();
        for (type_name, factory) in provider.resources() {
            let response = factory()
                .schema(
                    Context::for_operation(&type_name, "schema"),
                    ResourceSchemaRequest,
                )
                .await;
            diagnostics.extend(response.diagnostics);
            resource_schemas.insert(type_name, schema_to_proto(&response.schema));
        }

        Ok(Response::new(proto::get_provider_schema::Response {
            provider: Some(schema_to_proto(&provider_schema.schema)),
            resource_schemas,
            data_source_schemas: HashMap::new(),
            diagnostics: diagnostics_to_proto(diagnostics),
            server_capabilities: Some(server_capabilities()),
        }))
    }

    async fn validate_provider_config(
        &self,
        request: Request<proto::validate_provider_config::Request>,
    ) -> Result<Response<proto::validate_provider_config::Response>, Status> {
        let req = request.into_inner();
        let config = decode_value(req.config.as_ref())?;

        let schema = self
            .provider
            .read()
            .await
            .schema(Context::new(), ProviderSchemaRequest)
            .await
            .schema;

        Ok(Response::new(proto::validate_provider_config::Response {
            diagnostics: diagnostics_to_proto(schema.validate(&config)),
        }))
    }

    async fn validate_resource_config(
        &self,
        request: Request<proto::validate_resource_config::Request>,
    ) -> Result<Response<proto::validate_resource_config::Response>, Status> {
        let req = request.into_inner();
        let config = decode_value(req.config.as_ref())?;
        let factory = self.factory(&req.type_name).await?;

        let response = factory()
            .validate(
                Context::for_operation(&req.type_name, "validate"),
                ValidateResourceConfigRequest {
                    type_name: req.type_name.clone(),
                    config,
                },
            )
            .await;

        Ok(Response::new(proto::validate_resource_config::Response {
            diagnostics: diagnostics_to_proto(response.diagnostics),
        }))
    }

    async fn upgrade_resource_state(
        &self,
        request: Request<proto::upgrade_resource_state::Request>,
    ) -> Result<Response<proto::upgrade_resource_state::Response>, Status> {
        let req = request.into_inner();
        let schema = self.resource_schema(&req.type_name).await?;
        let raw = req.raw_state.unwrap_or_default();

        let state = if raw.json.is_empty() {
            DynamicValue::null()
        } else {
            DynamicValue::decode_json(&raw.json).map_err(|e| Status::invalid_argument(e.to_string()))?
        };

        if req.version > schema.version {
            let diagnostics = vec![Diagnostic::error(
                "Unsupported state version",
                format!(
                    "State for {} has schema version {}, newer than this provider's {}",
                    req.type_name, req.version, schema.version
                ),
            )];
            return Ok(Response::new(proto::upgrade_resource_state::Response {
                upgraded_state: None,
                diagnostics: diagnostics_to_proto(diagnostics),
            }));
        }

        Ok(Response::new(proto::upgrade_resource_state::Response {
            upgraded_state: Some(encode_value(&conform_to_schema(&schema, state))?),
            diagnostics: vec![],
        }))
    }

    async fn configure_provider(
        &self,
        request: Request<proto::configure_provider::Request>,
    ) -> Result<Response<proto::configure_provider::Response>, Status> {
        let req = request.into_inner();
        let config = decode_value(req.config.as_ref())?;
        tracing::debug!("ConfigureProvider from Terraform {}", req.terraform_version);

        let response = self
            .provider
            .write()
            .await
            .configure(
                Context::new(),
                ConfigureProviderRequest {
                    terraform_version: req.terraform_version,
                    config,
                },
            )
            .await;

        if !has_errors(&response.diagnostics) {
            *self.provider_data.write().await = response.provider_data;
        }

        Ok(Response::new(proto::configure_provider::Response {
            diagnostics: diagnostics_to_proto(response.diagnostics),
        }))
    }

    async fn read_resource(
        &self,
        request: Request<proto::read_resource::Request>,
    ) -> Result<Response<proto::read_resource::Response>, Status> {
        let req = request.into_inner();
        let current_state = decode_value(req.current_state.as_ref())?;
        let resource = self.configured_resource(&req.type_name).await?;

        let response = resource
            .read(
                Context::for_operation(&req.type_name, "read"),
                ReadResourceRequest {
                    type_name: req.type_name.clone(),
                    current_state,
                },
            )
            .await;
        let new_state = response.new_state.unwrap_or_else(DynamicValue::null);

        Ok(Response::new(proto::read_resource::Response {
            new_state: Some(encode_value(&new_state)?),
            diagnostics: diagnostics_to_proto(response.diagnostics),
            private: req.private,
        }))
    }

    async fn plan_resource_change(
        &self,
        request: Request<proto::plan_resource_change::Request>,
    ) -> Result<Response<proto::plan_resource_change::Response>, Status> {
        let req = request.into_inner();
        let schema = self.resource_schema(&req.type_name).await?;
        let prior_state = decode_value(req.prior_state.as_ref())?;
        let proposed_state = decode_value(req.proposed_new_state.as_ref())?;
        let config = decode_value(req.config.as_ref())?;

        let plan = schema.plan_change(&prior_state, &proposed_state, &config);
        tracing::debug!(
            "Planned {} with {} attribute(s) forcing replacement",
            req.type_name,
            plan.requires_replace.len()
        );

        Ok(Response::new(proto::plan_resource_change::Response {
            planned_state: Some(encode_value(&plan.planned_state)?),
            requires_replace: plan.requires_replace.iter().map(path_to_proto).collect(),
            planned_private: req.prior_private,
            diagnostics: diagnostics_to_proto(plan.diagnostics),
            legacy_type_system: false,
        }))
    }

    async fn apply_resource_change(
        &self,
        request: Request<proto::apply_resource_change::Request>,
    ) -> Result<Response<proto::apply_resource_change::Response>, Status> {
        let req = request.into_inner();
        let prior_state = decode_value(req.prior_state.as_ref())?;
        let planned_state = decode_value(req.planned_state.as_ref())?;
        let config = decode_value(req.config.as_ref())?;
        let resource = self.configured_resource(&req.type_name).await?;
        let type_name = req.type_name.clone();

        let (new_state, diagnostics) = if planned_state.is_null() {
            let response = resource
                .delete(
                    Context::for_operation(&type_name, "delete"),
                    DeleteResourceRequest {
                        type_name,
                        prior_state: prior_state.clone(),
                    },
                )
                .await;
            // A failed delete leaves the object in state
            let new_state = if has_errors(&response.diagnostics) {
                prior_state
            } else {
                DynamicValue::null()
            };
            (new_state, response.diagnostics)
        } else if prior_state.is_null() {
            let response = resource
                .create(
                    Context::for_operation(&type_name, "create"),
                    CreateResourceRequest {
                        type_name,
                        planned_state,
                        config,
                    },
                )
                .await;
            (response.new_state, response.diagnostics)
        } else {
            let response = resource
                .update(
                    Context::for_operation(&type_name, "update"),
                    UpdateResourceRequest {
                        type_name,
                        prior_state,
                        planned_state,
                        config,
                    },
                )
                .await;
            (response.new_state, response.diagnostics)
        };

        Ok(Response::new(proto::apply_resource_change::Response {
            new_state: Some(encode_value(&new_state)?),
            private: req.planned_private,
            diagnostics: diagnostics_to_proto(diagnostics),
            legacy_type_system: false,
        }))
    }

    async fn import_resource_state(
        &self,
        request: Request<proto::import_resource_state::Request>,
    ) -> Result<Response<proto::import_resource_state::Response>, Status> {
        let req = request.into_inner();
        let resource = self.configured_resource(&req.type_name).await?;

        let Some(importer) = resource.as_import_state() else {
            let diagnostics = vec![Diagnostic::error(
                "Resource Import Not Implemented",
                format!("{} does not support import", req.type_name),
            )];
            return Ok(Response::new(proto::import_resource_state::Response {
                imported_resources: vec![],
                diagnostics: diagnostics_to_proto(diagnostics),
            }));
        };

        let response = importer
            .import_state(
                Context::for_operation(&req.type_name, "import"),
                ImportResourceStateRequest {
                    type_name: req.type_name.clone(),
                    id: req.id,
                },
            )
            .await;

        let imported_resources = response
            .imported_resources
            .iter()
            .map(|imported| {
                Ok(proto::import_resource_state::ImportedResource {
                    type_name: imported.type_name.clone(),
                    state: Some(encode_value(&imported.state)?),
                    private: vec![],
                })
            })
            .collect::<Result<Vec<_>, Status>>()?;

        Ok(Response::new(proto::import_resource_state::Response {
            imported_resources,
            diagnostics: diagnostics_to_proto(response.diagnostics),
        }))
    }

    async fn stop_provider(
        &self,
        _request: Request<proto::stop_provider::Request>,
    ) -> Result<Response<proto::stop_provider::Response>, Status> {
        Ok(Response::new(proto::stop_provider::Response {
            error: String::new(),
        }))
    }
}

fn server_capabilities() -> proto::ServerCapabilities {
    proto::ServerCapabilities {
        plan_destroy: false,
        get_provider_schema_optional: false,
        move_resource_state: false,
    }
}

fn to_status(err: TfplugError) -> Status {
    match err {
        TfplugError::ResourceNotFound(_) => Status::not_found(err.to_string()),
        other => Status::failed_precondition(other.to_string()),
    }
}

#[allow(clippy::result_large_err)]
fn decode_value(value: Option<&proto::DynamicValue>) -> Result<DynamicValue, Status> {
    let Some(value) = value else {
        return Ok(DynamicValue::null());
    };

    let decoded = if !value.msgpack.is_empty() {
        DynamicValue::decode_msgpack(&value.msgpack)
    } else if !value.json.is_empty() {
        DynamicValue::decode_json(&value.json)
    } else {
        Ok(DynamicValue::null())
    };
    decoded.map_err(|e| Status::invalid_argument(e.to_string()))
}

#[allow(clippy::result_large_err)]
fn encode_value(value: &DynamicValue) -> Result<proto::DynamicValue, Status> {
    let msgpack = value
        .encode_msgpack()
        .map_err(|e| Status::internal(e.to_string()))?;
    Ok(proto::DynamicValue {
        msgpack,
        json: vec![],
    })
}

/// Every schema attribute present, null when missing; anything else dropped
fn conform_to_schema(schema: &Schema, state: DynamicValue) -> DynamicValue {
    match state.value {
        Dynamic::Map(mut entries) => {
            let conformed = schema
                .attributes
                .iter()
                .map(|attr| {
                    let value = entries.remove(&attr.name).unwrap_or(Dynamic::Null);
                    (attr.name.clone(), value)
                })
                .collect();
            DynamicValue::new(Dynamic::Map(conformed))
        }
        other => DynamicValue::new(other),
    }
}

fn attribute_type_to_bytes(attr_type: AttributeType) -> Vec<u8> {
    format!("\"{}\"", attr_type.name()).into_bytes()
}

fn schema_to_proto(schema: &Schema) -> proto::Schema {
    let attributes = schema
        .attributes
        .iter()
        .map(|attr| proto::schema::Attribute {
            name: attr.name.clone(),
            r#type: attribute_type_to_bytes(attr.r#type),
            description: attr.description.clone(),
            required: attr.required,
            optional: attr.optional,
            computed: attr.computed,
            sensitive: attr.sensitive,
            description_kind: proto::StringKind::Plain as i32,
            deprecated: false,
        })
        .collect();

    proto::Schema {
        version: schema.version,
        block: Some(proto::schema::Block {
            version: schema.version,
            attributes,
            description: schema.description.clone(),
            description_kind: proto::StringKind::Plain as i32,
            deprecated: false,
        }),
    }
}

fn path_to_proto(path: &AttributePath) -> proto::AttributePath {
    proto::AttributePath {
        steps: path
            .steps()
            .iter()
            .map(|name| attribute_path::Step {
                selector: Some(attribute_path::step::Selector::AttributeName(
                    name.clone(),
                )),
            })
            .collect(),
    }
}

fn diagnostics_to_proto(diagnostics: Vec<Diagnostic>) -> Vec<proto::Diagnostic> {
    diagnostics
        .into_iter()
        .map(|diag| {
            let severity = match diag.severity {
                DiagnosticSeverity::Error => diagnostic::Severity::Error,
                DiagnosticSeverity::Warning => diagnostic::Severity::Warning,
            };
            proto::Diagnostic {
                severity: severity as i32,
                summary: diag.summary,
                detail: diag.detail,
                attribute: diag.attribute.as_ref().map(path_to_proto),
            }
        })
        .collect()
}
