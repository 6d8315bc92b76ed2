//! Cognito user pool group resource implementation

use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tfplug::context::Context;
use tfplug::plan_modifier::{RequiresReplaceIfChanged, UseStateForUnknown};
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceSchemaRequest, ResourceSchemaResponse,
    ResourceWithConfigure, ResourceWithImportState, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{has_errors, AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::{
    NumberRangeValidator, StringLengthValidator, StringPatternValidator, WholeNumberValidator,
};
use tracing::Instrument;

use super::group_model::{
    ChangedFields, GroupModel, DESCRIPTION, GROUP_NAME, ID, PRECEDENCE, ROLE_ARN, USER_POOL_ID,
};
use crate::api::CognitoGroups;
use crate::AwsProviderData;

pub const TYPE_NAME: &str = "aws_cognito_group";

const GROUP_NAME_PATTERN: &str = r"^[\p{L}\p{M}\p{S}\p{N}\p{P}]+$";
const ROLE_ARN_PATTERN: &str = r"^arn:[\w+=/,.@-]+:[\w+=/,.@-]+:([\w+=/,.@-]*)?:[0-9]+:[\w+=/,.@-]+(:[\w+=/,.@-]+)?(:[\w+=/,.@-]+)?$";

#[derive(Default)]
pub struct GroupResource {
    provider_data: Option<AwsProviderData>,
}

impl GroupResource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A resource already wired to a group API, bypassing provider configure
    pub fn with_client(cognito: Arc<dyn CognitoGroups>) -> Self {
        Self {
            provider_data: Some(AwsProviderData::with_cognito(cognito)),
        }
    }

    pub fn schema_static() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(build_schema).clone()
    }

    fn cognito(&self) -> Result<&Arc<dyn CognitoGroups>, Diagnostic> {
        self.provider_data
            .as_ref()
            .map(|data| &data.cognito)
            .ok_or_else(|| {
                Diagnostic::error(
                    "Provider not configured",
                    "Provider data was not properly configured",
                )
            })
    }

    /// Looks the group up by name and builds its state
    ///
    /// Ok(None) means the group no longer exists remotely. Optionals unset in
    /// `model` stay unset when the service echoes back their zero value.
    async fn read_group(
        &self,
        ctx: &Context,
        cognito: &Arc<dyn CognitoGroups>,
        model: &GroupModel,
    ) -> Result<Option<GroupModel>, Diagnostic> {
        let id = model.tracked_id().to_string();
        tracing::debug!("Reading Cognito Group: {}", id);

        match cognito
            .get_group(&model.group_name, &model.user_pool_id)
            .instrument(ctx.span().clone())
            .await
        {
            Ok(group) => Ok(Some(
                GroupModel::from_remote(&id, group, &model.user_pool_id)
                    .with_unset_zero_values(model),
            )),
            Err(e) if e.is_not_found() => {
                tracing::warn!("Cognito Group {} is already gone", id);
                Ok(None)
            }
            Err(e) => Err(Diagnostic::error(
                "Error reading Cognito Group",
                format!("API error: {}", e),
            )),
        }
    }
}

fn build_schema() -> Schema {
    let group_name_pattern = Regex::new(GROUP_NAME_PATTERN).expect("group name pattern compiles");
    let role_arn_pattern = Regex::new(ROLE_ARN_PATTERN).expect("role ARN pattern compiles");

    SchemaBuilder::new()
        .version(0)
        .description("Provides a Cognito User Group resource")
        .attribute(
            AttributeBuilder::new(ID, AttributeType::String)
                .description("The group name, which identifies the group within its pool")
                .computed()
                .plan_modifier(UseStateForUnknown)
                .build(),
        )
        .attribute(
            AttributeBuilder::new(GROUP_NAME, AttributeType::String)
                .description("The name of the user group")
                .required()
                .validator(StringLengthValidator::between(1, 128))
                .validator(StringPatternValidator::new(
                    group_name_pattern,
                    "letters, marks, symbols, numbers and punctuation only",
                ))
                .plan_modifier(RequiresReplaceIfChanged)
                .build(),
        )
        .attribute(
            AttributeBuilder::new(USER_POOL_ID, AttributeType::String)
                .description("The user pool ID")
                .required()
                .plan_modifier(RequiresReplaceIfChanged)
                .build(),
        )
        .attribute(
            AttributeBuilder::new(DESCRIPTION, AttributeType::String)
                .description("The description of the user group")
                .optional()
                .validator(StringLengthValidator::at_most(2048))
                .build(),
        )
        .attribute(
            AttributeBuilder::new(PRECEDENCE, AttributeType::Number)
                .description(
                    "The precedence of the user group; lower values take priority when a user \
                     belongs to several groups",
                )
                .optional()
                .validator(WholeNumberValidator)
                .validator(NumberRangeValidator {
                    min: Some(0.0),
                    max: Some(i32::MAX as f64),
                })
                .build(),
        )
        .attribute(
            AttributeBuilder::new(ROLE_ARN, AttributeType::String)
                .description("The ARN of the IAM role to be associated with the user group")
                .optional()
                .validator(StringLengthValidator::between(20, 2048))
                .validator(StringPatternValidator::new(role_arn_pattern, "an IAM role ARN"))
                .build(),
        )
        .build()
}

#[async_trait]
impl Resource for GroupResource {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: Self::schema_static(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: Self::schema_static().validate(&request.config),
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let mut diagnostics = Self::schema_static().validate(&request.planned_state);
        if has_errors(&diagnostics) {
            return CreateResourceResponse {
                new_state: DynamicValue::null(),
                diagnostics,
            };
        }

        let cognito = match self.cognito() {
            Ok(cognito) => cognito,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };

        let model = match GroupModel::from_value(&request.planned_state) {
            Ok(model) => model,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };

        let params = model.create_request();
        tracing::debug!("Creating Cognito Group: {:?}", params);

        if let Err(e) = cognito
            .create_group(&params)
            .instrument(ctx.span().clone())
            .await
        {
            diagnostics.push(Diagnostic::error(
                "Error creating Cognito Group",
                format!("API error: {}", e),
            ));
            return CreateResourceResponse {
                new_state: DynamicValue::null(),
                diagnostics,
            };
        }

        let created = GroupModel {
            id: Some(model.group_name.clone()),
            ..model
        };

        // A failed refresh still records the group so it is not orphaned
        let new_state = match self.read_group(&ctx, cognito, &created).await {
            Ok(Some(group)) => group.to_value(),
            Ok(None) => {
                diagnostics.push(Diagnostic::error(
                    "Error reading Cognito Group",
                    format!("Cognito Group {} not found after creation", created.group_name),
                ));
                created.to_value()
            }
            Err(diag) => {
                diagnostics.push(diag);
                created.to_value()
            }
        };

        CreateResourceResponse {
            new_state,
            diagnostics,
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let mut diagnostics = vec![];

        if request.current_state.is_null() {
            return ReadResourceResponse {
                new_state: None,
                diagnostics,
            };
        }

        let cognito = match self.cognito() {
            Ok(cognito) => cognito,
            Err(diag) => {
                diagnostics.push(diag);
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                };
            }
        };

        let model = match GroupModel::from_value(&request.current_state) {
            Ok(model) => model,
            Err(diag) => {
                diagnostics.push(diag);
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                };
            }
        };

        match self.read_group(&ctx, cognito, &model).await {
            Ok(group) => ReadResourceResponse {
                new_state: group.map(|g| g.to_value()),
                diagnostics,
            },
            Err(diag) => {
                diagnostics.push(diag);
                ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                }
            }
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let mut diagnostics = Self::schema_static().validate(&request.planned_state);
        if has_errors(&diagnostics) {
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        }

        let cognito = match self.cognito() {
            Ok(cognito) => cognito,
            Err(diag) => {
                diagnostics.push(diag);
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        let (prior, planned) = match (
            GroupModel::from_value(&request.prior_state),
            GroupModel::from_value(&request.planned_state),
        ) {
            (Ok(prior), Ok(planned)) => (prior, planned),
            (Err(diag), _) | (_, Err(diag)) => {
                diagnostics.push(diag);
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        let tracked_id = prior.tracked_id().to_string();
        let changes = ChangedFields::between(&prior, &planned);
        let params = planned.update_request(&changes, &tracked_id);
        tracing::debug!("Updating Cognito Group: {:?}", params);

        if let Err(e) = cognito
            .update_group(&params)
            .instrument(ctx.span().clone())
            .await
        {
            diagnostics.push(Diagnostic::error(
                "Error updating Cognito Group",
                format!("API error: {}", e),
            ));
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        }

        let updated = GroupModel {
            id: Some(tracked_id),
            ..planned
        };

        let new_state = match self.read_group(&ctx, cognito, &updated).await {
            Ok(Some(group)) => group.to_value(),
            Ok(None) => {
                diagnostics.push(Diagnostic::error(
                    "Error reading Cognito Group",
                    format!("Cognito Group {} not found after update", updated.group_name),
                ));
                updated.to_value()
            }
            Err(diag) => {
                diagnostics.push(diag);
                updated.to_value()
            }
        };

        UpdateResourceResponse {
            new_state,
            diagnostics,
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let mut diagnostics = vec![];

        let cognito = match self.cognito() {
            Ok(cognito) => cognito,
            Err(diag) => {
                diagnostics.push(diag);
                return DeleteResourceResponse { diagnostics };
            }
        };

        let model = match GroupModel::from_value(&request.prior_state) {
            Ok(model) => model,
            Err(diag) => {
                diagnostics.push(diag);
                return DeleteResourceResponse { diagnostics };
            }
        };

        let id = model.tracked_id();
        tracing::debug!("Deleting Cognito Group: {}", id);

        match cognito
            .delete_group(id, &model.user_pool_id)
            .instrument(ctx.span().clone())
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::warn!("Cognito Group {} was already deleted", id);
            }
            Err(e) => diagnostics.push(Diagnostic::error(
                "Error deleting Cognito Group",
                format!("API error: {}", e),
            )),
        }

        DeleteResourceResponse { diagnostics }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithConfigure for GroupResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];

        if let Some(data) = request.provider_data {
            if let Some(provider_data) = data.downcast_ref::<AwsProviderData>() {
                self.provider_data = Some(provider_data.clone());
            } else {
                diagnostics.push(Diagnostic::error(
                    "Invalid provider data",
                    "Failed to extract AwsProviderData from provider data",
                ));
            }
        } else if self.provider_data.is_none() {
            diagnostics.push(Diagnostic::error(
                "No provider data",
                "No provider data was provided to the resource",
            ));
        }

        ConfigureResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithImportState for GroupResource {
    /// Import IDs have the form `<user_pool_id>/<group_name>`
    ///
    /// Pool IDs never contain '/', so everything after the first one is the
    /// group name.
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: vec![],
        };

        tfplug::import_state_passthrough_id(&ctx, AttributePath::new(ID), &request, &mut response);
        let Some(imported) = response.imported_resources.pop() else {
            return response;
        };

        let raw_id = match imported.state.get_string(&AttributePath::new(ID)) {
            Ok(id) => id,
            Err(e) => {
                response
                    .diagnostics
                    .push(Diagnostic::error("Failed to read import ID", e.to_string()));
                return response;
            }
        };

        let (user_pool_id, group_name) = match raw_id.split_once('/') {
            Some((pool, name)) if !pool.is_empty() && !name.is_empty() => (pool, name),
            _ => {
                response.diagnostics.push(Diagnostic::error(
                    "Unexpected format of ID",
                    format!("Expected user_pool_id/group_name, got: {}", raw_id),
                ));
                return response;
            }
        };

        let cognito = match self.cognito() {
            Ok(cognito) => cognito,
            Err(diag) => {
                response.diagnostics.push(diag);
                return response;
            }
        };

        let seed = GroupModel {
            id: Some(group_name.to_string()),
            ..GroupModel::new(group_name, user_pool_id)
        };

        match self.read_group(&ctx, cognito, &seed).await {
            Ok(Some(group)) => response.imported_resources.push(
                tfplug::resource::ImportedResource {
                    type_name: imported.type_name,
                    state: group.to_value(),
                },
            ),
            Ok(None) => response.diagnostics.push(Diagnostic::error(
                "Cannot import non-existent remote object",
                format!(
                    "Cognito Group {} does not exist in user pool {}",
                    group_name, user_pool_id
                ),
            )),
            Err(diag) => response.diagnostics.push(diag),
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Client;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;
    use tfplug::types::Dynamic;

    const TARGET: &str = "x-amz-target";

    fn op(name: &str) -> String {
        format!("AWSCognitoIdentityProviderService.{}", name)
    }

    fn resource_for(server: &ServerGuard) -> GroupResource {
        let client = Client::new(&server.url()).unwrap();
        GroupResource::with_client(Arc::new(client))
    }

    fn planned(model: &GroupModel) -> DynamicValue {
        let mut value = model.to_value();
        value
            .set_value(&AttributePath::new(ID), Dynamic::Unknown)
            .unwrap();
        value
    }

    fn group_body(description: Option<&str>) -> String {
        let mut group = json!({"GroupName": "g1", "UserPoolId": "pool1"});
        if let Some(description) = description {
            group["Description"] = json!(description);
        }
        json!({ "Group": group }).to_string()
    }

    #[test]
    fn schema_marks_key_attributes_force_new() {
        let schema = GroupResource::schema_static();

        let mut prior = GroupModel::new("g1", "pool1");
        prior.id = Some("g1".to_string());
        let mut proposed = prior.clone();
        proposed.user_pool_id = "pool2".to_string();
        proposed.description = Some("changed".to_string());

        let mut proposed_value = proposed.to_value();
        proposed_value
            .set_value(&AttributePath::new(ID), Dynamic::Unknown)
            .unwrap();
        let result =
            schema.modify_plan(&prior.to_value(), &proposed_value, &proposed.to_value());

        assert_eq!(result.requires_replace, vec![AttributePath::new(USER_POOL_ID)]);
        assert_eq!(
            result.planned_state.get_string(&AttributePath::new(ID)).unwrap(),
            "g1"
        );
    }

    #[test]
    fn schema_validators_enforce_constraints() {
        let schema = GroupResource::schema_static();

        let mut model = GroupModel::new("g1", "pool1");
        model.precedence = Some(0);
        model.role_arn = Some("arn:aws:iam::123456789012:role/admins".to_string());
        assert!(schema.validate(&model.to_value()).is_empty());

        let cases: Vec<(&str, Dynamic)> = vec![
            (GROUP_NAME, Dynamic::String(String::new())),
            (GROUP_NAME, Dynamic::String("x".repeat(129))),
            (GROUP_NAME, Dynamic::String("has space".to_string())),
            (DESCRIPTION, Dynamic::String("d".repeat(2049))),
            (PRECEDENCE, Dynamic::Number(-1.0)),
            (PRECEDENCE, Dynamic::Number(2147483648.0)),
            (PRECEDENCE, Dynamic::Number(1.5)),
            (ROLE_ARN, Dynamic::String("not-an-arn-but-long-enough".to_string())),
        ];
        for (name, bad) in cases {
            let mut value = model.to_value();
            value.set_value(&AttributePath::new(name), bad.clone()).unwrap();
            let diags = schema.validate(&value);
            assert!(has_errors(&diags), "{} = {:?} should be rejected", name, bad);
        }

        let mut value = model.to_value();
        value
            .set_number(&AttributePath::new(PRECEDENCE), 2147483647.0)
            .unwrap();
        value
            .set_string(&AttributePath::new(GROUP_NAME), "ünïcode-группа_1")
            .unwrap();
        assert!(schema.validate(&value).is_empty());
    }

    #[tokio::test]
    async fn create_sends_only_set_fields_and_refreshes_state() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/")
            .match_header(TARGET, op("CreateGroup").as_str())
            .match_body(Matcher::Json(json!({"GroupName": "g1", "UserPoolId": "pool1"})))
            .with_status(200)
            .with_body(group_body(None))
            .create_async()
            .await;
        let get = server
            .mock("POST", "/")
            .match_header(TARGET, op("GetGroup").as_str())
            .match_body(Matcher::Json(json!({"GroupName": "g1", "UserPoolId": "pool1"})))
            .with_status(200)
            .with_body(group_body(None))
            .create_async()
            .await;

        let resource = resource_for(&server);
        let model = GroupModel::new("g1", "pool1");
        let response = resource
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: TYPE_NAME.to_string(),
                    planned_state: planned(&model),
                    config: model.to_value(),
                },
            )
            .await;

        create.assert_async().await;
        get.assert_async().await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);

        let state = GroupModel::from_value(&response.new_state).unwrap();
        assert_eq!(state.id.as_deref(), Some("g1"));
        assert_eq!(state.group_name, "g1");
        assert_eq!(state.user_pool_id, "pool1");
        assert_eq!(state.description, None);
        assert_eq!(state.precedence, None);
    }

    #[tokio::test]
    async fn create_failure_records_no_state() {
        let mut server = Server::new_async().await;
        let _create = server
            .mock("POST", "/")
            .match_header(TARGET, op("CreateGroup").as_str())
            .with_status(400)
            .with_body(r#"{"__type":"GroupExistsException","message":"Group already exists"}"#)
            .create_async()
            .await;

        let resource = resource_for(&server);
        let model = GroupModel::new("g1", "pool1");
        let response = resource
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: TYPE_NAME.to_string(),
                    planned_state: planned(&model),
                    config: model.to_value(),
                },
            )
            .await;

        assert!(response.new_state.is_null());
        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "Error creating Cognito Group");
        assert!(response.diagnostics[0].detail.contains("GroupExistsException"));
    }

    #[tokio::test]
    async fn invalid_config_never_reaches_the_service() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/")
            .expect(0)
            .create_async()
            .await;

        let resource = resource_for(&server);
        let mut model = GroupModel::new("g1", "pool1");
        model.precedence = Some(-1);
        let response = resource
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: TYPE_NAME.to_string(),
                    planned_state: planned(&model),
                    config: model.to_value(),
                },
            )
            .await;

        create.assert_async().await;
        assert!(has_errors(&response.diagnostics));
        assert!(response.new_state.is_null());
    }

    #[tokio::test]
    async fn read_of_missing_group_clears_state() {
        let mut server = Server::new_async().await;
        let _get = server
            .mock("POST", "/")
            .match_header(TARGET, op("GetGroup").as_str())
            .with_status(400)
            .with_body(r#"{"__type":"ResourceNotFoundException","message":"Group not found."}"#)
            .create_async()
            .await;

        let resource = resource_for(&server);
        let mut model = GroupModel::new("g1", "pool1");
        model.id = Some("g1".to_string());
        let response = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: TYPE_NAME.to_string(),
                    current_state: model.to_value(),
                },
            )
            .await;

        assert!(response.new_state.is_none());
        assert!(response.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn read_failure_keeps_state_and_reports() {
        let mut server = Server::new_async().await;
        let _get = server
            .mock("POST", "/")
            .match_header(TARGET, op("GetGroup").as_str())
            .with_status(400)
            .with_body(r#"{"__type":"NotAuthorizedException","message":"denied"}"#)
            .create_async()
            .await;

        let resource = resource_for(&server);
        let mut model = GroupModel::new("g1", "pool1");
        model.id = Some("g1".to_string());
        let response = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: TYPE_NAME.to_string(),
                    current_state: model.to_value(),
                },
            )
            .await;

        assert_eq!(response.new_state, Some(model.to_value()));
        assert_eq!(response.diagnostics[0].summary, "Error reading Cognito Group");
    }

    #[tokio::test]
    async fn update_sends_key_and_changed_fields_only() {
        let mut server = Server::new_async().await;
        let update = server
            .mock("POST", "/")
            .match_header(TARGET, op("UpdateGroup").as_str())
            .match_body(Matcher::Json(json!({
                "GroupName": "g1",
                "UserPoolId": "pool1",
                "Description": "team leads"
            })))
            .with_status(200)
            .with_body(group_body(Some("team leads")))
            .create_async()
            .await;
        let _get = server
            .mock("POST", "/")
            .match_header(TARGET, op("GetGroup").as_str())
            .with_status(200)
            .with_body(group_body(Some("team leads")))
            .create_async()
            .await;

        let resource = resource_for(&server);
        let mut prior = GroupModel::new("g1", "pool1");
        prior.id = Some("g1".to_string());
        let mut next = prior.clone();
        next.description = Some("team leads".to_string());

        let response = resource
            .update(
                Context::new(),
                UpdateResourceRequest {
                    type_name: TYPE_NAME.to_string(),
                    prior_state: prior.to_value(),
                    planned_state: next.to_value(),
                    config: next.to_value(),
                },
            )
            .await;

        update.assert_async().await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert_eq!(
            response
                .new_state
                .get_string(&AttributePath::new(DESCRIPTION))
                .unwrap(),
            "team leads"
        );
    }

    #[tokio::test]
    async fn update_clears_removed_description_with_empty_string() {
        let mut server = Server::new_async().await;
        let update = server
            .mock("POST", "/")
            .match_header(TARGET, op("UpdateGroup").as_str())
            .match_body(Matcher::Json(json!({
                "GroupName": "g1",
                "UserPoolId": "pool1",
                "Description": ""
            })))
            .with_status(200)
            .with_body(group_body(None))
            .create_async()
            .await;
        let _get = server
            .mock("POST", "/")
            .match_header(TARGET, op("GetGroup").as_str())
            .with_status(200)
            .with_body(group_body(None))
            .create_async()
            .await;

        let resource = resource_for(&server);
        let mut prior = GroupModel::new("g1", "pool1");
        prior.id = Some("g1".to_string());
        prior.description = Some("old".to_string());
        let mut next = prior.clone();
        next.description = None;

        let response = resource
            .update(
                Context::new(),
                UpdateResourceRequest {
                    type_name: TYPE_NAME.to_string(),
                    prior_state: prior.to_value(),
                    planned_state: next.to_value(),
                    config: next.to_value(),
                },
            )
            .await;

        update.assert_async().await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert_eq!(
            response.new_state.get(&AttributePath::new(DESCRIPTION)),
            Some(&Dynamic::Null)
        );
    }

    #[tokio::test]
    async fn update_clearing_precedence_leaves_it_unset() {
        let mut server = Server::new_async().await;
        let update = server
            .mock("POST", "/")
            .match_header(TARGET, op("UpdateGroup").as_str())
            .match_body(Matcher::Json(json!({
                "GroupName": "g1",
                "UserPoolId": "pool1",
                "Precedence": 0
            })))
            .with_status(200)
            .with_body(r#"{"Group":{"GroupName":"g1","UserPoolId":"pool1","Precedence":0}}"#)
            .create_async()
            .await;
        let _get = server
            .mock("POST", "/")
            .match_header(TARGET, op("GetGroup").as_str())
            .with_status(200)
            .with_body(r#"{"Group":{"GroupName":"g1","UserPoolId":"pool1","Precedence":0}}"#)
            .create_async()
            .await;

        let resource = resource_for(&server);
        let mut prior = GroupModel::new("g1", "pool1");
        prior.id = Some("g1".to_string());
        prior.precedence = Some(5);
        let mut next = prior.clone();
        next.precedence = None;

        let response = resource
            .update(
                Context::new(),
                UpdateResourceRequest {
                    type_name: TYPE_NAME.to_string(),
                    prior_state: prior.to_value(),
                    planned_state: next.to_value(),
                    config: next.to_value(),
                },
            )
            .await;

        update.assert_async().await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert_eq!(response.new_state, next.to_value());

        let refreshed = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: TYPE_NAME.to_string(),
                    current_state: response.new_state,
                },
            )
            .await;
        assert_eq!(refreshed.new_state, Some(next.to_value()));
    }

    #[tokio::test]
    async fn update_failure_keeps_prior_state() {
        let mut server = Server::new_async().await;
        let _update = server
            .mock("POST", "/")
            .match_header(TARGET, op("UpdateGroup").as_str())
            .with_status(400)
            .with_body(r#"{"__type":"InvalidParameterException","message":"bad role"}"#)
            .create_async()
            .await;

        let resource = resource_for(&server);
        let mut prior = GroupModel::new("g1", "pool1");
        prior.id = Some("g1".to_string());
        let mut next = prior.clone();
        next.precedence = Some(2);

        let response = resource
            .update(
                Context::new(),
                UpdateResourceRequest {
                    type_name: TYPE_NAME.to_string(),
                    prior_state: prior.to_value(),
                    planned_state: next.to_value(),
                    config: next.to_value(),
                },
            )
            .await;

        assert_eq!(response.new_state, prior.to_value());
        assert_eq!(response.diagnostics[0].summary, "Error updating Cognito Group");
    }

    #[tokio::test]
    async fn delete_tolerates_missing_group() {
        let mut server = Server::new_async().await;
        let delete = server
            .mock("POST", "/")
            .match_header(TARGET, op("DeleteGroup").as_str())
            .match_body(Matcher::Json(json!({"GroupName": "g1", "UserPoolId": "pool1"})))
            .with_status(400)
            .with_body(r#"{"__type":"ResourceNotFoundException","message":"Group not found."}"#)
            .create_async()
            .await;

        let resource = resource_for(&server);
        let mut prior = GroupModel::new("g1", "pool1");
        prior.id = Some("g1".to_string());
        let response = resource
            .delete(
                Context::new(),
                DeleteResourceRequest {
                    type_name: TYPE_NAME.to_string(),
                    prior_state: prior.to_value(),
                },
            )
            .await;

        delete.assert_async().await;
        assert!(response.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn delete_reports_other_failures() {
        let mut server = Server::new_async().await;
        let _delete = server
            .mock("POST", "/")
            .match_header(TARGET, op("DeleteGroup").as_str())
            .with_status(400)
            .with_body(r#"{"__type":"TooManyRequestsException","message":"slow down"}"#)
            .create_async()
            .await;

        let resource = resource_for(&server);
        let mut prior = GroupModel::new("g1", "pool1");
        prior.id = Some("g1".to_string());
        let response = resource
            .delete(
                Context::new(),
                DeleteResourceRequest {
                    type_name: TYPE_NAME.to_string(),
                    prior_state: prior.to_value(),
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "Error deleting Cognito Group");
    }

    #[tokio::test]
    async fn import_parses_pool_and_name() {
        let mut server = Server::new_async().await;
        let get = server
            .mock("POST", "/")
            .match_header(TARGET, op("GetGroup").as_str())
            .match_body(Matcher::Json(json!({"GroupName": "g1", "UserPoolId": "pool1"})))
            .with_status(200)
            .with_body(group_body(Some("imported")))
            .create_async()
            .await;

        let resource = resource_for(&server);
        let response = resource
            .import_state(
                Context::new(),
                ImportResourceStateRequest {
                    type_name: TYPE_NAME.to_string(),
                    id: "pool1/g1".to_string(),
                },
            )
            .await;

        get.assert_async().await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert_eq!(response.imported_resources.len(), 1);
        let state = GroupModel::from_value(&response.imported_resources[0].state).unwrap();
        assert_eq!(state.id.as_deref(), Some("g1"));
        assert_eq!(state.user_pool_id, "pool1");
        assert_eq!(state.description.as_deref(), Some("imported"));

        let nested = server
            .mock("POST", "/")
            .match_header(TARGET, op("GetGroup").as_str())
            .match_body(Matcher::Json(
                json!({"GroupName": "eng/leads", "UserPoolId": "pool1"}),
            ))
            .with_status(200)
            .with_body(r#"{"Group":{"GroupName":"eng/leads","UserPoolId":"pool1"}}"#)
            .create_async()
            .await;

        let response = resource
            .import_state(
                Context::new(),
                ImportResourceStateRequest {
                    type_name: TYPE_NAME.to_string(),
                    id: "pool1/eng/leads".to_string(),
                },
            )
            .await;

        nested.assert_async().await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let state = GroupModel::from_value(&response.imported_resources[0].state).unwrap();
        assert_eq!(state.id.as_deref(), Some("eng/leads"));
        assert_eq!(state.group_name, "eng/leads");
        assert_eq!(state.user_pool_id, "pool1");
    }

    #[tokio::test]
    async fn import_rejects_malformed_ids() {
        let resource = GroupResource::new();
        for id in ["g1", "/g1", "pool1/", ""] {
            let response = resource
                .import_state(
                    Context::new(),
                    ImportResourceStateRequest {
                        type_name: TYPE_NAME.to_string(),
                        id: id.to_string(),
                    },
                )
                .await;
            assert!(response.imported_resources.is_empty());
            assert_eq!(response.diagnostics[0].summary, "Unexpected format of ID");
        }
    }

    #[tokio::test]
    async fn operations_fail_without_provider_data() {
        let resource = GroupResource::new();
        let mut prior = GroupModel::new("g1", "pool1");
        prior.id = Some("g1".to_string());

        let response = resource
            .delete(
                Context::new(),
                DeleteResourceRequest {
                    type_name: TYPE_NAME.to_string(),
                    prior_state: prior.to_value(),
                },
            )
            .await;
        assert_eq!(response.diagnostics[0].summary, "Provider not configured");
    }

    #[tokio::test]
    async fn configure_rejects_foreign_provider_data() {
        let mut resource = GroupResource::new();
        let response = resource
            .configure(
                Context::new(),
                ConfigureResourceRequest {
                    provider_data: Some(Arc::new("not provider data".to_string())
                        as Arc<dyn std::any::Any + Send + Sync>),
                },
            )
            .await;
        assert_eq!(response.diagnostics[0].summary, "Invalid provider data");

        let response = resource
            .configure(
                Context::new(),
                ConfigureResourceRequest {
                    provider_data: None,
                },
            )
            .await;
        assert_eq!(response.diagnostics[0].summary, "No provider data");
    }
}
