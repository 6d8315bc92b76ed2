//! Typed view of the aws_cognito_group state

use crate::api::{CreateGroupRequest, GroupType, UpdateGroupRequest};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

pub const ID: &str = "id";
pub const GROUP_NAME: &str = "group_name";
pub const USER_POOL_ID: &str = "user_pool_id";
pub const DESCRIPTION: &str = "description";
pub const PRECEDENCE: &str = "precedence";
pub const ROLE_ARN: &str = "role_arn";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupModel {
    /// Tracked identifier; equal to group_name once the group exists
    pub id: Option<String>,
    pub group_name: String,
    pub user_pool_id: String,
    pub description: Option<String>,
    pub precedence: Option<i64>,
    pub role_arn: Option<String>,
}

/// Which user-settable attributes differ between two models
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangedFields {
    pub group_name: bool,
    pub description: bool,
    pub precedence: bool,
    pub role_arn: bool,
}

impl ChangedFields {
    pub fn between(prior: &GroupModel, planned: &GroupModel) -> Self {
        Self {
            group_name: prior.group_name != planned.group_name,
            description: prior.description != planned.description,
            precedence: prior.precedence != planned.precedence,
            role_arn: prior.role_arn != planned.role_arn,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.group_name || self.description || self.precedence || self.role_arn)
    }
}

impl GroupModel {
    pub fn new(group_name: impl Into<String>, user_pool_id: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            user_pool_id: user_pool_id.into(),
            ..Default::default()
        }
    }

    pub fn from_value(value: &DynamicValue) -> Result<Self, Diagnostic> {
        let id = optional_string(value, ID)?;
        let group_name = required_string(value, GROUP_NAME)?;
        let user_pool_id = required_string(value, USER_POOL_ID)?;
        let description = optional_string(value, DESCRIPTION)?;
        let precedence = value
            .get_optional_number(&AttributePath::new(PRECEDENCE))
            .map_err(|e| invalid(PRECEDENCE, e))?
            .map(|n| n as i64);
        let role_arn = optional_string(value, ROLE_ARN)?;

        Ok(Self {
            id,
            group_name,
            user_pool_id,
            description,
            precedence,
            role_arn,
        })
    }

    /// Every schema attribute is present; unset optionals are null
    pub fn to_value(&self) -> DynamicValue {
        let mut entries = std::collections::HashMap::new();
        entries.insert(ID.to_string(), opt_string(&self.id));
        entries.insert(
            GROUP_NAME.to_string(),
            Dynamic::String(self.group_name.clone()),
        );
        entries.insert(
            USER_POOL_ID.to_string(),
            Dynamic::String(self.user_pool_id.clone()),
        );
        entries.insert(DESCRIPTION.to_string(), opt_string(&self.description));
        entries.insert(
            PRECEDENCE.to_string(),
            self.precedence
                .map(|p| Dynamic::Number(p as f64))
                .unwrap_or(Dynamic::Null),
        );
        entries.insert(ROLE_ARN.to_string(), opt_string(&self.role_arn));
        DynamicValue::new(Dynamic::Map(entries))
    }

    /// The identifier the group is tracked under, group_name until assigned
    pub fn tracked_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.group_name)
    }

    pub fn create_request(&self) -> CreateGroupRequest {
        CreateGroupRequest {
            group_name: self.group_name.clone(),
            user_pool_id: self.user_pool_id.clone(),
            description: self.description.clone(),
            precedence: self.precedence,
            role_arn: self.role_arn.clone(),
        }
    }

    /// Builds an update carrying only the changed optionals
    ///
    /// A field changed to unset is sent as its zero value so the service
    /// clears it. The group is addressed by `tracked_id` unless group_name
    /// itself changed.
    pub fn update_request(&self, changes: &ChangedFields, tracked_id: &str) -> UpdateGroupRequest {
        let group_name = if changes.group_name {
            self.group_name.clone()
        } else {
            tracked_id.to_string()
        };

        UpdateGroupRequest {
            group_name,
            user_pool_id: self.user_pool_id.clone(),
            description: changes
                .description
                .then(|| self.description.clone().unwrap_or_default()),
            precedence: changes
                .precedence
                .then(|| self.precedence.unwrap_or_default()),
            role_arn: changes
                .role_arn
                .then(|| self.role_arn.clone().unwrap_or_default()),
        }
    }

    /// State after a successful lookup of the group tracked as `id`
    ///
    /// group_name follows the tracked identifier; user_pool_id comes from
    /// the service, falling back to the one the lookup used.
    pub fn from_remote(id: &str, group: GroupType, user_pool_id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            group_name: id.to_string(),
            user_pool_id: group
                .user_pool_id
                .unwrap_or_else(|| user_pool_id.to_string()),
            description: group.description,
            precedence: group.precedence,
            role_arn: group.role_arn,
        }
    }

    /// Keeps optionals unset where `reference` has them unset and the
    /// service reports its zero value
    ///
    /// Cognito has no null precedence: a cleared precedence reads back as 0
    /// and a cleared description or role may read back as "".
    pub fn with_unset_zero_values(mut self, reference: &GroupModel) -> Self {
        if reference.description.is_none() && self.description.as_deref() == Some("") {
            self.description = None;
        }
        if reference.precedence.is_none() && self.precedence == Some(0) {
            self.precedence = None;
        }
        if reference.role_arn.is_none() && self.role_arn.as_deref() == Some("") {
            self.role_arn = None;
        }
        self
    }
}

fn opt_string(value: &Option<String>) -> Dynamic {
    value
        .as_ref()
        .map(|s| Dynamic::String(s.clone()))
        .unwrap_or(Dynamic::Null)
}

fn required_string(value: &DynamicValue, name: &str) -> Result<String, Diagnostic> {
    value
        .get_string(&AttributePath::new(name))
        .map_err(|e| invalid(name, e))
}

fn optional_string(value: &DynamicValue, name: &str) -> Result<Option<String>, Diagnostic> {
    value
        .get_optional_string(&AttributePath::new(name))
        .map_err(|e| invalid(name, e))
}

fn invalid(name: &str, err: tfplug::TfplugError) -> Diagnostic {
    Diagnostic::error(format!("Invalid {}", name), err.to_string())
        .with_attribute(AttributePath::new(name))
}
