pub mod groups;

use crate::api::Client;

/// Cognito user pool API
pub struct CognitoApi<'a> {
    client: &'a Client,
}

impl<'a> CognitoApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// User pool group operations
    pub fn groups(&self) -> groups::GroupsApi<'a> {
        groups::GroupsApi::new(self.client)
    }
}
