//! Generated types for Terraform Plugin Protocol 6
//!
//! Built from `proto/tfplugin6.proto` by tonic-build. Several message names
//! collide with framework types (`DynamicValue`, `Diagnostic`, `Schema`,
//! `AttributePath`), so refer to these through the `proto::` prefix.

tonic::include_proto!("tfplugin6");

pub use provider_server::{Provider as ProviderService, ProviderServer};
