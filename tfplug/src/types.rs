//! Core type system for tfplug
//!
//! Configuration, plans and state all travel as a `DynamicValue`: an untyped
//! tree of Terraform values addressed by `AttributePath`. Resources decode it
//! into their own typed models at the edge and never pattern match on it
//! deep inside business logic.

use crate::error::{Result, TfplugError};
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{self, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Dynamic represents a Terraform value of any type
#[derive(Debug, Clone, PartialEq)]
pub enum Dynamic {
    Null,
    Bool(bool),
    /// All numbers are f64 to match Terraform
    Number(f64),
    String(String),
    List(Vec<Dynamic>),
    /// Objects are represented as maps
    Map(HashMap<String, Dynamic>),
    /// Not known until apply
    Unknown,
}

impl Dynamic {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Dynamic::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Dynamic::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Dynamic::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Dynamic::Unknown)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Dynamic::Null => "null",
            Dynamic::Bool(_) => "bool",
            Dynamic::Number(_) => "number",
            Dynamic::String(_) => "string",
            Dynamic::List(_) => "list",
            Dynamic::Map(_) => "map",
            Dynamic::Unknown => "unknown",
        }
    }
}

impl Serialize for Dynamic {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Dynamic::Null => serializer.serialize_unit(),
            Dynamic::Bool(b) => serializer.serialize_bool(*b),
            // Whole numbers go out as integers so msgpack and JSON keep them exact
            Dynamic::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Dynamic::Number(n) => serializer.serialize_f64(*n),
            Dynamic::String(s) => serializer.serialize_str(s),
            Dynamic::List(items) => items.serialize(serializer),
            Dynamic::Map(entries) => entries.serialize(serializer),
            // msgpack extension 0, the marker Terraform uses for unknown values
            Dynamic::Unknown if !serializer.is_human_readable() => serializer
                .serialize_newtype_struct(rmp_serde::MSGPACK_EXT_STRUCT_NAME, &UnknownExt),
            Dynamic::Unknown => Err(ser::Error::custom(
                "unknown values have no JSON encoding; plans travel as msgpack",
            )),
        }
    }
}

struct UnknownExt;

impl Serialize for UnknownExt {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeTuple;

        let mut ext = serializer.serialize_tuple(2)?;
        ext.serialize_element(&0i8)?;
        ext.serialize_element(&ExtPayload(&[0]))?;
        ext.end()
    }
}

struct ExtPayload(&'static [u8]);

impl Serialize for ExtPayload {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(self.0)
    }
}

/// Reads any msgpack extension as an unknown value, refined or not
struct ExtVisitor;

impl<'de> Visitor<'de> for ExtVisitor {
    type Value = Dynamic;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a msgpack extension")
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Dynamic, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let _tag: Option<i8> = seq.next_element()?;
        let _payload: Option<de::IgnoredAny> = seq.next_element()?;
        Ok(Dynamic::Unknown)
    }
}

struct DynamicVisitor;

impl<'de> Visitor<'de> for DynamicVisitor {
    type Value = Dynamic;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a Terraform value")
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Dynamic, E> {
        Ok(Dynamic::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Dynamic, E> {
        Ok(Dynamic::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<Dynamic, D::Error>
    where
        D: Deserializer<'de>,
    {
        Dynamic::deserialize(deserializer)
    }

    fn visit_newtype_struct<D>(self, deserializer: D) -> std::result::Result<Dynamic, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ExtVisitor)
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> std::result::Result<Dynamic, E> {
        Ok(Dynamic::Bool(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Dynamic, E> {
        Ok(Dynamic::Number(value as f64))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Dynamic, E> {
        Ok(Dynamic::Number(value as f64))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> std::result::Result<Dynamic, E> {
        Ok(Dynamic::Number(value))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Dynamic, E> {
        Ok(Dynamic::String(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> std::result::Result<Dynamic, E> {
        Ok(Dynamic::String(value))
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Dynamic, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Dynamic::List(items))
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Dynamic, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = HashMap::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Dynamic>()? {
            entries.insert(key, value);
        }
        Ok(Dynamic::Map(entries))
    }
}

impl<'de> Deserialize<'de> for Dynamic {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DynamicVisitor)
    }
}

/// DynamicValue wraps Dynamic and provides encoding and typed access
/// This is what gets passed between Terraform and the provider
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicValue {
    pub value: Dynamic,
}

impl DynamicValue {
    pub fn new(value: Dynamic) -> Self {
        Self { value }
    }

    pub fn null() -> Self {
        Self::new(Dynamic::Null)
    }

    pub fn unknown() -> Self {
        Self::new(Dynamic::Unknown)
    }

    /// An empty object, the usual starting point for building state
    pub fn object() -> Self {
        Self::new(Dynamic::Map(HashMap::new()))
    }

    /// Terraform exchanges values as msgpack; decoding treats an empty
    /// payload as null
    pub fn encode_msgpack(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec(&self.value)
            .map_err(|e| TfplugError::EncodingError(format!("msgpack encoding failed: {}", e)))
    }

    pub fn decode_msgpack(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Ok(Self::null());
        }
        rmp_serde::from_slice::<Dynamic>(data)
            .map(Self::new)
            .map_err(|e| TfplugError::DecodingError(format!("msgpack decoding failed: {}", e)))
    }

    pub fn encode_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.value)
            .map_err(|e| TfplugError::EncodingError(format!("json encoding failed: {}", e)))
    }

    pub fn decode_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice::<Dynamic>(data)
            .map(Self::new)
            .map_err(|e| TfplugError::DecodingError(format!("json decoding failed: {}", e)))
    }

    /// Returns the value at `path`, or None when any step is missing
    pub fn get(&self, path: &AttributePath) -> Option<&Dynamic> {
        let mut current = &self.value;
        for name in path.steps() {
            match current {
                Dynamic::Map(entries) => current = entries.get(name)?,
                _ => return None,
            }
        }
        Some(current)
    }

    pub fn get_string(&self, path: &AttributePath) -> Result<String> {
        match self.require(path)? {
            Dynamic::String(s) => Ok(s.clone()),
            other => Err(mismatch(path, "string", other)),
        }
    }

    pub fn get_number(&self, path: &AttributePath) -> Result<f64> {
        match self.require(path)? {
            Dynamic::Number(n) => Ok(*n),
            other => Err(mismatch(path, "number", other)),
        }
    }

    pub fn get_bool(&self, path: &AttributePath) -> Result<bool> {
        match self.require(path)? {
            Dynamic::Bool(b) => Ok(*b),
            other => Err(mismatch(path, "bool", other)),
        }
    }

    /// Missing, null and unknown all read as None; any other type is an error
    pub fn get_optional_string(&self, path: &AttributePath) -> Result<Option<String>> {
        match self.get(path) {
            None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => Ok(None),
            Some(Dynamic::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(mismatch(path, "string", other)),
        }
    }

    pub fn get_optional_number(&self, path: &AttributePath) -> Result<Option<f64>> {
        match self.get(path) {
            None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => Ok(None),
            Some(Dynamic::Number(n)) => Ok(Some(*n)),
            Some(other) => Err(mismatch(path, "number", other)),
        }
    }

    pub fn get_optional_bool(&self, path: &AttributePath) -> Result<Option<bool>> {
        match self.get(path) {
            None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => Ok(None),
            Some(Dynamic::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(mismatch(path, "bool", other)),
        }
    }

    pub fn set_string(&mut self, path: &AttributePath, value: impl Into<String>) -> Result<()> {
        self.set_value(path, Dynamic::String(value.into()))
    }

    pub fn set_number(&mut self, path: &AttributePath, value: f64) -> Result<()> {
        self.set_value(path, Dynamic::Number(value))
    }

    pub fn set_bool(&mut self, path: &AttributePath, value: bool) -> Result<()> {
        self.set_value(path, Dynamic::Bool(value))
    }

    pub fn set_null(&mut self, path: &AttributePath) -> Result<()> {
        self.set_value(path, Dynamic::Null)
    }

    /// Intermediate objects are created on demand; the root becomes an object
    /// if it was null
    pub fn set_value(&mut self, path: &AttributePath, new_value: Dynamic) -> Result<()> {
        let Some((last, parents)) = path.steps().split_last() else {
            self.value = new_value;
            return Ok(());
        };

        if self.value.is_null() {
            self.value = Dynamic::Map(HashMap::new());
        }

        let mut current = &mut self.value;
        for (depth, name) in parents.iter().enumerate() {
            current = match current {
                Dynamic::Map(entries) => entries
                    .entry(name.clone())
                    .or_insert_with(|| Dynamic::Map(HashMap::new())),
                other => {
                    return Err(TfplugError::TypeMismatch {
                        path: AttributePath::from_steps(&parents[..depth]).to_string(),
                        expected: "map".to_string(),
                        actual: other.kind().to_string(),
                    })
                }
            };
        }

        match current {
            Dynamic::Map(entries) => {
                entries.insert(last.clone(), new_value);
                Ok(())
            }
            other => Err(TfplugError::TypeMismatch {
                path: AttributePath::from_steps(parents).to_string(),
                expected: "map".to_string(),
                actual: other.kind().to_string(),
            }),
        }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn is_unknown(&self) -> bool {
        self.value.is_unknown()
    }

    fn require(&self, path: &AttributePath) -> Result<&Dynamic> {
        self.get(path)
            .ok_or_else(|| TfplugError::AttributeNotFound(path.to_string()))
    }
}

fn mismatch(path: &AttributePath, expected: &str, actual: &Dynamic) -> TfplugError {
    TfplugError::TypeMismatch {
        path: path.to_string(),
        expected: expected.to_string(),
        actual: actual.kind().to_string(),
    }
}

/// AttributePath addresses an attribute within a DynamicValue
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributePath {
    steps: Vec<String>,
}

impl AttributePath {
    pub fn new(name: &str) -> Self {
        Self {
            steps: vec![name.to_string()],
        }
    }

    pub fn root() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn attribute(mut self, name: &str) -> Self {
        self.steps.push(name.to_string());
        self
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    fn from_steps(steps: &[String]) -> Self {
        Self {
            steps: steps.to_vec(),
        }
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return f.write_str("<root>");
        }
        f.write_str(&self.steps.join("."))
    }
}

/// Diagnostic represents a warning or error reported back to Terraform
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub summary: String,
    pub detail: String,
    pub attribute: Option<AttributePath>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn with_attribute(mut self, path: AttributePath) -> Self {
        self.attribute = Some(path);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// Config represents configuration values
pub type Config = DynamicValue;

/// State represents resource state values
pub type State = DynamicValue;
