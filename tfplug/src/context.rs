//! Request-scoped context handed to every provider and resource call
//!
//! The host creates one Context per RPC. It carries the tracing span the
//! call's log lines belong to so that remote API calls made on behalf of the
//! request are attributed to the resource type and operation that caused them.

use tracing::Span;

/// Pass this as first parameter to ALL async trait methods
#[derive(Clone, Debug)]
pub struct Context {
    span: Span,
}

impl Context {
    /// A context with no span attached
    pub fn new() -> Self {
        Self { span: Span::none() }
    }

    /// A context whose span names the resource type and the operation
    pub fn for_operation(type_name: &str, operation: &'static str) -> Self {
        Self {
            span: tracing::info_span!("resource", type_name = %type_name, operation),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
