//! Provider data structure passed to resources

use crate::api::{Client, CognitoGroups};
use std::sync::Arc;

#[derive(Clone)]
pub struct AwsProviderData {
    pub cognito: Arc<dyn CognitoGroups>,
}

impl AwsProviderData {
    pub fn new(client: Client) -> Self {
        Self {
            cognito: Arc::new(client),
        }
    }

    /// Wraps any implementation of the group operations, e.g. a test double
    pub fn with_cognito(cognito: Arc<dyn CognitoGroups>) -> Self {
        Self { cognito }
    }
}
