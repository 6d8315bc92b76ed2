//! User pool group API implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, Client};

/// Group as returned by the service
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupType {
    pub group_name: Option<String>,
    pub user_pool_id: Option<String>,
    pub description: Option<String>,
    pub precedence: Option<i64>,
    pub role_arn: Option<String>,
    pub creation_date: Option<f64>,
    pub last_modified_date: Option<f64>,
}

/// Request body for CreateGroup; unset optionals are left out of the body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateGroupRequest {
    pub group_name: String,
    pub user_pool_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precedence: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,
}

/// Request body for UpdateGroup
///
/// GroupName and UserPoolId identify the group; a present optional replaces
/// the stored value and an absent one leaves it untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateGroupRequest {
    pub group_name: String,
    pub user_pool_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precedence: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct GroupKey<'a> {
    group_name: &'a str,
    user_pool_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GroupResponse {
    group: GroupType,
}

/// Group operations a resource needs from the remote service
#[async_trait]
pub trait CognitoGroups: Send + Sync {
    async fn create_group(&self, request: &CreateGroupRequest) -> Result<GroupType, ApiError>;

    async fn get_group(&self, group_name: &str, user_pool_id: &str)
        -> Result<GroupType, ApiError>;

    async fn update_group(&self, request: &UpdateGroupRequest) -> Result<GroupType, ApiError>;

    async fn delete_group(&self, group_name: &str, user_pool_id: &str) -> Result<(), ApiError>;
}

pub struct GroupsApi<'a> {
    client: &'a Client,
}

impl<'a> GroupsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn create(&self, request: &CreateGroupRequest) -> Result<GroupType, ApiError> {
        let response: GroupResponse = self.client.call("CreateGroup", request).await?;
        Ok(response.group)
    }

    pub async fn get(&self, group_name: &str, user_pool_id: &str) -> Result<GroupType, ApiError> {
        let key = GroupKey {
            group_name,
            user_pool_id,
        };
        let response: GroupResponse = self.client.call("GetGroup", &key).await?;
        Ok(response.group)
    }

    pub async fn update(&self, request: &UpdateGroupRequest) -> Result<GroupType, ApiError> {
        let response: GroupResponse = self.client.call("UpdateGroup", request).await?;
        Ok(response.group)
    }

    pub async fn delete(&self, group_name: &str, user_pool_id: &str) -> Result<(), ApiError> {
        let key = GroupKey {
            group_name,
            user_pool_id,
        };
        self.client
            .call::<serde::de::IgnoredAny, _>("DeleteGroup", &key)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl CognitoGroups for Client {
    async fn create_group(&self, request: &CreateGroupRequest) -> Result<GroupType, ApiError> {
        self.cognito().groups().create(request).await
    }

    async fn get_group(
        &self,
        group_name: &str,
        user_pool_id: &str,
    ) -> Result<GroupType, ApiError> {
        self.cognito().groups().get(group_name, user_pool_id).await
    }

    async fn update_group(&self, request: &UpdateGroupRequest) -> Result<GroupType, ApiError> {
        self.cognito().groups().update(request).await
    }

    async fn delete_group(&self, group_name: &str, user_pool_id: &str) -> Result<(), ApiError> {
        self.cognito().groups().delete(group_name, user_pool_id).await
    }
}
