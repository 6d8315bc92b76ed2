//! tfplug - Terraform Plugin Framework for Rust
//!
//! The provider-side half of the Terraform plugin model: schemas, dynamic
//! values, diagnostics and the resource/provider traits a provider implements,
//! served to Terraform over Plugin Protocol 6. State storage stays with
//! Terraform itself.

// Core modules
pub mod context;
pub mod error;
pub mod schema;
pub mod types;

// Provider API modules
pub mod provider;
pub mod resource;

// Server modules
pub mod grpc;
pub mod proto;
pub mod server;

// Helper modules
pub mod import;
pub mod logging;
pub mod plan_modifier;
pub mod validator;

// Re-exports for convenience
pub use context::Context;
pub use error::{Result, TfplugError};
pub use import::import_state_passthrough_id;
pub use provider::{Provider, ResourceFactory};
pub use resource::{Resource, ResourceWithConfigure, ResourceWithImportState};
pub use schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
pub use server::{serve, ServerConfig};
pub use types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
