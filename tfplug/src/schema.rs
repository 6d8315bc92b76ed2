//! Schema types and builders for tfplug
//!
//! This module provides the schema system for defining resource and provider
//! schemas: attribute types, flags, validators and plan modifiers, plus the
//! schema-driven validation and planning passes the framework runs before a
//! resource sees a request.

use crate::plan_modifier::{PlanModifier, PlanModifyRequest};
use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use crate::validator::Validator;
use std::sync::Arc;

/// AttributeType defines the primitive Terraform types tfplug supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Number, // Always f64
    Bool,
}

impl AttributeType {
    pub fn accepts(&self, value: &Dynamic) -> bool {
        matches!(
            (self, value),
            (_, Dynamic::Null | Dynamic::Unknown)
                | (AttributeType::String, Dynamic::String(_))
                | (AttributeType::Number, Dynamic::Number(_))
                | (AttributeType::Bool, Dynamic::Bool(_))
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Number => "number",
            AttributeType::Bool => "bool",
        }
    }
}

/// Schema is returned by providers and resources
/// Version is used for state migration
#[derive(Debug, Clone)]
pub struct Schema {
    pub version: i64,
    pub description: String,
    pub attributes: Vec<Attribute>,
}

/// Attribute represents a single configuration attribute
#[derive(Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub validators: Vec<Arc<dyn Validator>>,
    pub plan_modifiers: Vec<Arc<dyn PlanModifier>>,
}

// Manual Debug implementation since validators/modifiers don't implement Debug
impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.r#type)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field(
                "validators",
                &self
                    .validators
                    .iter()
                    .map(|v| v.description())
                    .collect::<Vec<_>>(),
            )
            .field(
                "plan_modifiers",
                &self
                    .plan_modifiers
                    .iter()
                    .map(|m| m.description())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Outcome of the schema-driven planning pass
#[derive(Debug, Clone)]
pub struct PlanResult {
    pub planned_state: DynamicValue,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Checks presence, type and attribute validators against a config
    ///
    /// Unknown values pass: they are checked again once known at apply time.
    pub fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for attr in &self.attributes {
            let path = AttributePath::new(&attr.name);
            let value = config.get(&path).unwrap_or(&Dynamic::Null);

            if value.is_null() {
                if attr.required {
                    diagnostics.push(
                        Diagnostic::error(
                            "Missing required argument",
                            format!("The argument \"{}\" is required", attr.name),
                        )
                        .with_attribute(path),
                    );
                }
                continue;
            }

            if value.is_unknown() {
                continue;
            }

            if !attr.r#type.accepts(value) {
                diagnostics.push(
                    Diagnostic::error(
                        "Incorrect attribute value type",
                        format!(
                            "Attribute \"{}\" must be a {}, got {}",
                            attr.name,
                            attr.r#type.name(),
                            value.kind()
                        ),
                    )
                    .with_attribute(path),
                );
                continue;
            }

            for validator in &attr.validators {
                validator.validate(value, &path, &mut diagnostics);
            }
        }

        diagnostics
    }

    /// Plans a resource change from Terraform's proposed new state
    ///
    /// On create, computed attributes the config leaves unset become unknown
    /// before the plan modifiers run.
    pub fn plan_change(
        &self,
        prior_state: &DynamicValue,
        proposed_state: &DynamicValue,
        config: &DynamicValue,
    ) -> PlanResult {
        let mut proposed = proposed_state.clone();
        let mut diagnostics = Vec::new();

        if prior_state.is_null() && !proposed.is_null() {
            for attr in self.attributes.iter().filter(|a| a.computed) {
                let path = AttributePath::new(&attr.name);
                if config.get(&path).is_some_and(|v| !v.is_null()) {
                    continue;
                }
                if let Err(e) = proposed.set_value(&path, Dynamic::Unknown) {
                    diagnostics.push(
                        Diagnostic::error("Failed to plan computed attribute", e.to_string())
                            .with_attribute(path),
                    );
                }
            }
        }

        let mut result = self.modify_plan(prior_state, &proposed, config);
        diagnostics.append(&mut result.diagnostics);
        result.diagnostics = diagnostics;
        result
    }

    /// Runs every attribute's plan modifiers over a proposed new state
    ///
    /// A null proposal is a destroy plan and passes through untouched.
    pub fn modify_plan(
        &self,
        prior_state: &DynamicValue,
        proposed_state: &DynamicValue,
        config: &DynamicValue,
    ) -> PlanResult {
        let mut result = PlanResult {
            planned_state: proposed_state.clone(),
            requires_replace: Vec::new(),
            diagnostics: Vec::new(),
        };

        if proposed_state.is_null() {
            return result;
        }

        for attr in self.attributes.iter().filter(|a| !a.plan_modifiers.is_empty()) {
            let path = AttributePath::new(&attr.name);
            let state = prior_state.get(&path).cloned().unwrap_or(Dynamic::Null);
            let config_value = config.get(&path).cloned().unwrap_or(Dynamic::Null);
            let mut plan = result
                .planned_state
                .get(&path)
                .cloned()
                .unwrap_or(Dynamic::Null);
            let mut replace = false;

            for modifier in &attr.plan_modifiers {
                let response = modifier.modify_plan(PlanModifyRequest {
                    state: state.clone(),
                    plan,
                    config: config_value.clone(),
                    path: path.clone(),
                });
                plan = response.plan_value;
                replace |= response.requires_replace;
                result.diagnostics.extend(response.diagnostics);
            }

            if let Err(e) = result.planned_state.set_value(&path, plan) {
                result.diagnostics.push(
                    Diagnostic::error("Failed to apply plan modifier", e.to_string())
                        .with_attribute(path.clone()),
                );
            }
            if replace {
                result.requires_replace.push(path);
            }
        }

        result
    }
}

/// AttributeBuilder provides fluent API for building attributes
/// ALWAYS use this instead of constructing Attribute directly
pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                validators: Vec::new(),
                plan_modifiers: Vec::new(),
            },
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.attribute.validators.push(Arc::new(validator));
        self
    }

    pub fn plan_modifier(mut self, modifier: impl PlanModifier + 'static) -> Self {
        self.attribute.plan_modifiers.push(Arc::new(modifier));
        self
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// SchemaBuilder provides fluent API for building schemas
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema {
                version: 0,
                description: String::new(),
                attributes: Vec::new(),
            },
        }
    }

    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.schema.attributes.push(attr);
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.schema.description = desc.to_string();
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan_modifier::{RequiresReplaceIfChanged, UseStateForUnknown};
    use crate::validator::StringLengthValidator;

    fn test_schema() -> Schema {
        SchemaBuilder::new()
            .version(1)
            .description("Test resource schema")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .required()
                    .validator(StringLengthValidator::between(1, 8))
                    .plan_modifier(RequiresReplaceIfChanged)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("size", AttributeType::Number)
                    .optional()
                    .build(),
            )
            .build()
    }

    fn value(entries: &[(&str, Dynamic)]) -> DynamicValue {
        let mut dv = DynamicValue::object();
        for (name, v) in entries {
            dv.set_value(&AttributePath::new(name), v.clone()).unwrap();
        }
        dv
    }

    fn s(v: &str) -> Dynamic {
        Dynamic::String(v.to_string())
    }

    #[test]
    fn attribute_builder_creates_required_string() {
        let attr = AttributeBuilder::new("name", AttributeType::String)
            .description("The name of the resource")
            .required()
            .build();

        assert_eq!(attr.name, "name");
        assert_eq!(attr.r#type, AttributeType::String);
        assert!(attr.required);
        assert!(!attr.optional);
        assert_eq!(attr.description, "The name of the resource");
    }

    #[test]
    fn schema_builder_creates_schema_with_attributes() {
        let schema = test_schema();

        assert_eq!(schema.version, 1);
        assert_eq!(schema.attributes.len(), 3);
        assert!(schema.attribute("id").unwrap().computed);
        assert!(schema.attribute("missing").is_none());
    }

    #[test]
    fn cloned_attributes_keep_validators() {
        let schema = test_schema().clone();
        assert_eq!(schema.attribute("name").unwrap().validators.len(), 1);
    }

    #[test]
    fn validate_reports_missing_required_attribute() {
        let diags = test_schema().validate(&value(&[("size", Dynamic::Number(1.0))]));

        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "Missing required argument");
        assert_eq!(diags[0].attribute, Some(AttributePath::new("name")));
    }

    #[test]
    fn validate_reports_type_mismatch_and_runs_validators() {
        let diags = test_schema().validate(&value(&[
            ("name", s("far-too-long")),
            ("size", s("big")),
        ]));

        assert_eq!(diags.len(), 2);
        assert!(diags[0].summary.contains("cannot be longer than 8"));
        assert_eq!(diags[1].summary, "Incorrect attribute value type");
    }

    #[test]
    fn validate_skips_unknown_values() {
        let diags = test_schema().validate(&value(&[("name", Dynamic::Unknown)]));
        assert!(diags.is_empty());
    }

    #[test]
    fn modify_plan_flags_replacement_and_keeps_computed_state() {
        let prior = value(&[("id", s("a")), ("name", s("a"))]);
        let proposed = value(&[("id", Dynamic::Unknown), ("name", s("b"))]);

        let result = test_schema().modify_plan(&prior, &proposed, &proposed);

        assert_eq!(result.requires_replace, vec![AttributePath::new("name")]);
        assert_eq!(
            result
                .planned_state
                .get_string(&AttributePath::new("id"))
                .unwrap(),
            "a"
        );
    }

    #[test]
    fn plan_change_marks_unset_computed_attributes_unknown_on_create() {
        let proposed = value(&[("id", Dynamic::Null), ("name", s("a"))]);

        let result = test_schema().plan_change(&DynamicValue::null(), &proposed, &proposed);

        assert!(result.diagnostics.is_empty());
        assert!(result.requires_replace.is_empty());
        assert_eq!(
            result.planned_state.get(&AttributePath::new("id")),
            Some(&Dynamic::Unknown)
        );
        assert_eq!(
            result
                .planned_state
                .get_string(&AttributePath::new("name"))
                .unwrap(),
            "a"
        );
    }

    #[test]
    fn plan_change_keeps_prior_computed_values_on_update() {
        let prior = value(&[("id", s("a")), ("name", s("a")), ("size", Dynamic::Null)]);
        let proposed = value(&[("id", s("a")), ("name", s("a")), ("size", Dynamic::Number(2.0))]);
        let config = value(&[("id", Dynamic::Null), ("name", s("a")), ("size", Dynamic::Number(2.0))]);

        let result = test_schema().plan_change(&prior, &proposed, &config);

        assert!(result.requires_replace.is_empty());
        assert_eq!(result.planned_state, proposed);
    }

    #[test]
    fn modify_plan_passes_destroy_through() {
        let prior = value(&[("id", s("a")), ("name", s("a"))]);

        let result = test_schema().modify_plan(&prior, &DynamicValue::null(), &DynamicValue::null());

        assert!(result.planned_state.is_null());
        assert!(result.requires_replace.is_empty());
    }
}
