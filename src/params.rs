//! Parameter resolution
//!
//! Extracts the named parameters a handler declares for one batch item and
//! coerces them to the declared kind. Resolution only reads from the host;
//! the resulting `ResolvedParams` is immutable for the rest of the item.
//!
//! ## Kinds
//!
//! - `Text`, `Integer`, `Boolean`: passed through with the declared type
//! - `JsonDocument` / `JsonList`: string payloads are parsed, an empty string
//!   becomes `{}` / `[]` before parsing, malformed JSON is an error
//! - `StringList`: comma separated, trimmed, empty segments dropped

use serde_json::{Map, Value};

use crate::client::ChannelRef;
use crate::error::ParameterError;

// ============================================================================
// Specs
// ============================================================================

/// How a raw host value is coerced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Text,
    Integer,
    Boolean,
    /// Free-form JSON document, `{}` when empty
    JsonDocument,
    /// Free-form JSON list, `[]` when empty
    JsonList,
    /// Delimited string list
    StringList,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::Text => "string",
            ParamKind::Integer => "integer",
            ParamKind::Boolean => "boolean",
            ParamKind::JsonDocument => "JSON document",
            ParamKind::JsonList => "JSON list",
            ParamKind::StringList => "string list",
        }
    }
}

/// Value used when an optional parameter is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamDefault {
    /// The kind's empty value
    Empty,
    Text(&'static str),
    Integer(i64),
}

/// A parameter a handler reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub default: ParamDefault,
}

impl ParamSpec {
    pub const fn required(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: ParamDefault::Empty,
        }
    }

    pub const fn optional(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: ParamDefault::Empty,
        }
    }

    pub const fn or_text(self, value: &'static str) -> Self {
        Self {
            default: ParamDefault::Text(value),
            ..self
        }
    }

    pub const fn or_integer(self, value: i64) -> Self {
        Self {
            default: ParamDefault::Integer(value),
            ..self
        }
    }

    fn default_value(&self) -> ParamValue {
        match (self.kind, self.default) {
            (ParamKind::Text, ParamDefault::Text(s)) => ParamValue::Text(s.to_string()),
            (ParamKind::Integer, ParamDefault::Integer(n)) => ParamValue::Integer(n),
            (ParamKind::Text, _) => ParamValue::Text(String::new()),
            (ParamKind::Integer, _) => ParamValue::Integer(0),
            (ParamKind::Boolean, _) => ParamValue::Boolean(false),
            (ParamKind::JsonDocument, _) => ParamValue::Document(Value::Object(Map::new())),
            (ParamKind::JsonList, _) => ParamValue::Document(Value::Array(Vec::new())),
            (ParamKind::StringList, _) => ParamValue::List(Vec::new()),
        }
    }
}

// ============================================================================
// Host boundary
// ============================================================================

/// Host-side view of the batch: named parameters keyed by `(name, item index)`
pub trait ParameterSource: Send + Sync {
    fn item_count(&self) -> usize;

    /// Raw value, `None` when the host has nothing for this name
    fn parameter(&self, name: &str, item_index: usize) -> Option<Value>;
}

/// Items supplied as JSON objects of named parameters
#[derive(Debug, Clone, Default)]
pub struct JsonItems {
    items: Vec<Map<String, Value>>,
}

impl JsonItems {
    pub fn new(items: Vec<Map<String, Value>>) -> Self {
        Self { items }
    }

    /// Parse a JSON array of objects
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        let items: Vec<Map<String, Value>> = serde_json::from_str(s)?;
        Ok(Self::new(items))
    }
}

impl ParameterSource for JsonItems {
    fn item_count(&self) -> usize {
        self.items.len()
    }

    fn parameter(&self, name: &str, item_index: usize) -> Option<Value> {
        self.items.get(item_index)?.get(name).cloned()
    }
}

// ============================================================================
// Resolved values
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Document(Value),
    List(Vec<String>),
}

impl ParamValue {
    fn kind_name(&self) -> &'static str {
        match self {
            ParamValue::Text(_) => "string",
            ParamValue::Integer(_) => "integer",
            ParamValue::Boolean(_) => "boolean",
            ParamValue::Document(_) => "JSON document",
            ParamValue::List(_) => "string list",
        }
    }
}

/// Coerced parameters for one item, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedParams {
    values: Vec<(&'static str, ParamValue)>,
}

impl ResolvedParams {
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn require(&self, name: &str) -> Result<&ParamValue, ParameterError> {
        self.get(name).ok_or_else(|| ParameterError::Missing {
            name: name.to_string(),
        })
    }

    fn mismatch(name: &str, expected: &'static str, found: &ParamValue) -> ParameterError {
        ParameterError::TypeMismatch {
            name: name.to_string(),
            expected,
            found: found.kind_name(),
        }
    }

    pub fn text(&self, name: &str) -> Result<&str, ParameterError> {
        match self.require(name)? {
            ParamValue::Text(s) => Ok(s),
            other => Err(Self::mismatch(name, "string", other)),
        }
    }

    /// Text value, `None` when empty
    pub fn non_empty_text(&self, name: &str) -> Result<Option<&str>, ParameterError> {
        let s = self.text(name)?;
        Ok((!s.is_empty()).then_some(s))
    }

    pub fn integer(&self, name: &str) -> Result<i64, ParameterError> {
        match self.require(name)? {
            ParamValue::Integer(n) => Ok(*n),
            other => Err(Self::mismatch(name, "integer", other)),
        }
    }

    pub fn boolean(&self, name: &str) -> Result<bool, ParameterError> {
        match self.require(name)? {
            ParamValue::Boolean(b) => Ok(*b),
            other => Err(Self::mismatch(name, "boolean", other)),
        }
    }

    pub fn document(&self, name: &str) -> Result<&Value, ParameterError> {
        match self.require(name)? {
            ParamValue::Document(v) => Ok(v),
            other => Err(Self::mismatch(name, "JSON document", other)),
        }
    }

    /// Document that must be a JSON object, for payloads merged with other fields
    pub fn object(&self, name: &str) -> Result<&Map<String, Value>, ParameterError> {
        self.document(name)?
            .as_object()
            .ok_or_else(|| ParameterError::NotAnObject {
                name: name.to_string(),
            })
    }

    pub fn list(&self, name: &str) -> Result<&[String], ParameterError> {
        match self.require(name)? {
            ParamValue::List(items) => Ok(items),
            other => Err(Self::mismatch(name, "string list", other)),
        }
    }

    /// Channel addressed by separate `channelType` and `channelId` parameters
    pub fn channel(&self) -> Result<ChannelRef, ParameterError> {
        Ok(ChannelRef::new(
            self.text("channelType")?,
            self.text("channelId")?,
        ))
    }

    /// Channel addressed by a `type:id` parameter
    pub fn channel_cid(&self, name: &str) -> Result<ChannelRef, ParameterError> {
        parse_channel_cid(self.text(name)?)
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve every declared parameter for one item.
pub fn resolve_params(
    source: &dyn ParameterSource,
    item_index: usize,
    specs: &[ParamSpec],
) -> Result<ResolvedParams, ParameterError> {
    let values = specs
        .iter()
        .map(|spec| Ok((spec.name, resolve_param(source, item_index, spec)?)))
        .collect::<Result<Vec<_>, ParameterError>>()?;
    Ok(ResolvedParams { values })
}

/// Resolve and coerce a single parameter.
pub fn resolve_param(
    source: &dyn ParameterSource,
    item_index: usize,
    spec: &ParamSpec,
) -> Result<ParamValue, ParameterError> {
    let raw = match source.parameter(spec.name, item_index) {
        Some(Value::Null) | None => None,
        // An empty scalar field means "not filled in" for typed kinds
        Some(Value::String(s))
            if s.is_empty() && matches!(spec.kind, ParamKind::Integer | ParamKind::Boolean) =>
        {
            None
        }
        Some(v) => Some(v),
    };

    let Some(raw) = raw else {
        if spec.required {
            return Err(ParameterError::Missing {
                name: spec.name.to_string(),
            });
        }
        return Ok(spec.default_value());
    };

    coerce(spec, raw)
}

fn coerce(spec: &ParamSpec, raw: Value) -> Result<ParamValue, ParameterError> {
    let mismatch = |found: &Value| ParameterError::TypeMismatch {
        name: spec.name.to_string(),
        expected: spec.kind.as_str(),
        found: json_kind(found),
    };

    match spec.kind {
        ParamKind::Text => match raw {
            Value::String(s) => Ok(ParamValue::Text(s)),
            Value::Number(n) => Ok(ParamValue::Text(n.to_string())),
            Value::Bool(b) => Ok(ParamValue::Text(b.to_string())),
            other => Err(mismatch(&other)),
        },
        ParamKind::Integer => {
            let n = match &raw {
                Value::Number(n) => n.as_i64().or_else(|| {
                    // `as` saturates, so out-of-range floats must be rejected first
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0)
                        .filter(|f| *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                        .map(|f| f as i64)
                }),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            n.map(ParamValue::Integer).ok_or_else(|| mismatch(&raw))
        }
        ParamKind::Boolean => match &raw {
            Value::Bool(b) => Ok(ParamValue::Boolean(*b)),
            Value::String(s) if s == "true" => Ok(ParamValue::Boolean(true)),
            Value::String(s) if s == "false" => Ok(ParamValue::Boolean(false)),
            other => Err(mismatch(other)),
        },
        ParamKind::JsonDocument | ParamKind::JsonList => match raw {
            Value::String(s) => parse_json_param(spec.name, &s, spec.kind).map(ParamValue::Document),
            // Hosts may hand over an already structured document
            other => Ok(ParamValue::Document(other)),
        },
        ParamKind::StringList => match raw {
            Value::String(s) => Ok(ParamValue::List(split_member_list(&s))),
            Value::Array(items) => {
                let mut members = Vec::with_capacity(items.len());
                for item in &items {
                    match item {
                        Value::String(s) => members.push(s.as_str()),
                        other => return Err(mismatch(other)),
                    }
                }
                Ok(ParamValue::List(normalize_members(members)))
            }
            other => Err(mismatch(&other)),
        },
    }
}

/// Parse a JSON-bearing parameter. An empty string falls back to the kind's
/// empty value before parsing.
pub fn parse_json_param(name: &str, raw: &str, kind: ParamKind) -> Result<Value, ParameterError> {
    let text = match (raw.is_empty(), kind) {
        (true, ParamKind::JsonList) => "[]",
        (true, _) => "{}",
        (false, _) => raw,
    };
    serde_json::from_str(text).map_err(|source| ParameterError::InvalidJson {
        name: name.to_string(),
        source,
    })
}

/// Split on comma, trim whitespace, drop empty segments.
pub fn split_member_list(raw: &str) -> Vec<String> {
    normalize_members(raw.split(','))
}

fn normalize_members<'a>(segments: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    segments
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Split `type:id` on the first colon only.
pub fn parse_channel_cid(cid: &str) -> Result<ChannelRef, ParameterError> {
    let (channel_type, id) =
        cid.split_once(':')
            .ok_or_else(|| ParameterError::InvalidChannelCid {
                value: cid.to_string(),
            })?;
    Ok(ChannelRef::new(channel_type, id))
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
