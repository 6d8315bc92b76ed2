pub mod client;
pub mod cognito;
pub mod error;

pub use client::{endpoint_for_region, Client, ClientConfig};
pub use cognito::groups::{CognitoGroups, CreateGroupRequest, GroupType, UpdateGroupRequest};
pub use error::ApiError;
