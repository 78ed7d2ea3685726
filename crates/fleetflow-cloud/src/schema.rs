//! Attribute schemas for resources and data sources
//!
//! A schema names every attribute a resource kind understands, its type and
//! its lifecycle flags. The host validates declarations against it and the
//! planner uses it to decide between in-place updates and replacement.

use crate::error::{CloudError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::net::IpAddr;

/// Value type of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Int,
    Bool,
    /// Unordered set of strings
    Set,
    /// String to string mapping
    Map,
    /// List of nested objects (computed data only)
    List,
}

impl AttributeType {
    /// Whether `value` has this type. `null` is accepted by every type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (AttributeType::String, Value::String(_)) => true,
            (AttributeType::Int, Value::Number(n)) => n.is_i64(),
            (AttributeType::Bool, Value::Bool(_)) => true,
            (AttributeType::Set, Value::Array(items)) => items.iter().all(Value::is_string),
            (AttributeType::Map, Value::Object(map)) => map.values().all(Value::is_string),
            (AttributeType::List, Value::Array(items)) => items.iter().all(Value::is_object),
            _ => false,
        }
    }

    /// The value an unset attribute reads as
    pub fn zero(&self) -> Value {
        match self {
            AttributeType::String => Value::String(String::new()),
            AttributeType::Int => Value::from(0),
            AttributeType::Bool => Value::Bool(false),
            AttributeType::Set | AttributeType::List => Value::Array(Vec::new()),
            AttributeType::Map => Value::Object(Map::new()),
        }
    }
}

impl std::fmt::Display for AttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeType::String => write!(f, "string"),
            AttributeType::Int => write!(f, "int"),
            AttributeType::Bool => write!(f, "bool"),
            AttributeType::Set => write!(f, "set of strings"),
            AttributeType::Map => write!(f, "map of strings"),
            AttributeType::List => write!(f, "list of objects"),
        }
    }
}

/// Value constraint checked during validation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    IpAddress,
    OneOf(&'static [&'static str]),
    AtLeast(i64),
}

impl Check {
    fn verify(&self, key: &str, value: &Value) -> Option<String> {
        match (self, value) {
            (Check::IpAddress, Value::String(s)) => {
                if s.is_empty() || s.parse::<IpAddr>().is_ok() {
                    None
                } else {
                    Some(format!("expected {:?} to contain a valid IP, got: {}", key, s))
                }
            }
            (Check::OneOf(allowed), Value::String(s)) => {
                if allowed.contains(&s.as_str()) {
                    None
                } else {
                    Some(format!(
                        "expected {:?} to be one of {:?}, got {}",
                        key, allowed, s
                    ))
                }
            }
            (Check::AtLeast(min), Value::Number(n)) => match n.as_i64() {
                Some(v) if v >= *min => None,
                _ => Some(format!("expected {:?} to be at least ({}), got {}", key, min, n)),
            },
            _ => None,
        }
    }
}

/// Description of a single attribute
#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub kind: AttributeType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub force_new: bool,
    /// Map updated by patching: keys known only remotely are kept
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub patch: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts_with: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<Check>,
}

impl Attribute {
    fn new(kind: AttributeType) -> Self {
        Self {
            kind,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            patch: false,
            default: None,
            description: String::new(),
            deprecated: None,
            conflicts_with: Vec::new(),
            check: None,
        }
    }

    pub fn required(kind: AttributeType) -> Self {
        Self {
            required: true,
            ..Self::new(kind)
        }
    }

    pub fn optional(kind: AttributeType) -> Self {
        Self {
            optional: true,
            ..Self::new(kind)
        }
    }

    pub fn computed(kind: AttributeType) -> Self {
        Self {
            computed: true,
            ..Self::new(kind)
        }
    }

    pub fn required_string() -> Self {
        Self::required(AttributeType::String)
    }

    pub fn optional_string() -> Self {
        Self::optional(AttributeType::String)
    }

    pub fn computed_string() -> Self {
        Self::computed(AttributeType::String)
    }

    pub fn required_int() -> Self {
        Self::required(AttributeType::Int)
    }

    pub fn optional_int() -> Self {
        Self::optional(AttributeType::Int)
    }

    pub fn optional_set() -> Self {
        Self::optional(AttributeType::Set)
    }

    pub fn optional_map() -> Self {
        Self::optional(AttributeType::Map)
    }

    /// Changing this attribute requires destroying and recreating the resource
    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Map attribute applied as a patch; see [`Attribute::differs`]
    pub fn patched(mut self) -> Self {
        self.patch = true;
        self
    }

    /// Optional attribute whose value is filled in by the remote side when
    /// left unset
    pub fn with_computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn deprecate(mut self, message: impl Into<String>) -> Self {
        self.deprecated = Some(message.into());
        self
    }

    pub fn conflicts_with(mut self, keys: &[&'static str]) -> Self {
        self.conflicts_with.extend_from_slice(keys);
        self
    }

    pub fn check(mut self, check: Check) -> Self {
        self.check = Some(check);
        self
    }

    /// Set only by the provider, never by the user
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }

    /// Canonical form used for comparisons: unset reads as the zero value
    /// and sets are compared without regard to order.
    pub fn normalize(&self, value: Option<&Value>) -> Value {
        match value {
            None | Some(Value::Null) => self.kind.zero(),
            Some(Value::Array(items)) if self.kind == AttributeType::Set => {
                let mut items: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                items.sort_unstable();
                items.dedup();
                Value::from(items)
            }
            Some(v) => v.clone(),
        }
    }

    /// Whether moving from `old` to `new` is a change. A patched map only
    /// changes when `new` holds a key that `old` lacks or maps differently.
    pub fn differs(&self, old: Option<&Value>, new: Option<&Value>) -> bool {
        let (old, new) = (self.normalize(old), self.normalize(new));
        match (&old, &new) {
            (Value::Object(old), Value::Object(new)) if self.patch => {
                new.iter().any(|(key, value)| old.get(key) != Some(value))
            }
            _ => old != new,
        }
    }
}

fn is_set(value: Option<&Value>) -> bool {
    value.is_some_and(|v| !v.is_null())
}

/// Schema of a resource kind or data source
#[derive(Debug, Clone, Default, Serialize)]
pub struct Schema {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub attributes: BTreeMap<String, Attribute>,
}

impl Schema {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(key.into(), attribute);
        self
    }

    /// Adds an optional tag map under `key`
    pub fn with_tags(self, key: &str) -> Self {
        self.with_attribute(
            key,
            Attribute::optional_map()
                .patched()
                .describe("Map of tags (key: value). Keys set outside the declaration are kept."),
        )
    }

    pub fn get(&self, key: &str) -> Option<&Attribute> {
        self.attributes.get(key)
    }

    /// Validates a declared configuration, reporting every problem at once
    pub fn validate(&self, config: &Map<String, Value>) -> Result<()> {
        let mut problems: Vec<String> = Vec::new();

        for (key, value) in config {
            let Some(attr) = self.attributes.get(key) else {
                problems.push(format!("unsupported argument {:?}", key));
                continue;
            };
            if value.is_null() {
                continue;
            }
            if attr.is_computed_only() {
                problems.push(format!("{:?} is computed and cannot be set", key));
                continue;
            }
            if !attr.kind.accepts(value) {
                problems.push(format!("{:?}: expected {}", key, attr.kind));
                continue;
            }
            if let Some(problem) = attr.check.as_ref().and_then(|c| c.verify(key, value)) {
                problems.push(problem);
            }
            if let Some(message) = &attr.deprecated {
                tracing::warn!(attribute = %key, "{}", message);
            }
            for other in &attr.conflicts_with {
                if is_set(config.get(*other)) {
                    let (a, b) = if key.as_str() < *other {
                        (key.as_str(), *other)
                    } else {
                        (*other, key.as_str())
                    };
                    let problem = format!("{:?} conflicts with {:?}", a, b);
                    if !problems.contains(&problem) {
                        problems.push(problem);
                    }
                }
            }
        }

        for (key, attr) in &self.attributes {
            if attr.required && !is_set(config.get(key)) {
                problems.push(format!("Missing required argument: {}", key));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(CloudError::Validation(problems.join("; ")))
        }
    }

    /// Fills unset attributes that declare a default
    pub fn apply_defaults(&self, config: &mut Map<String, Value>) {
        for (key, attr) in &self.attributes {
            if let Some(default) = &attr.default {
                if !is_set(config.get(key)) {
                    config.insert(key.clone(), default.clone());
                }
            }
        }
    }

    /// User-settable attributes whose desired value differs from the prior state
    pub fn changed_keys(&self, prior: &Map<String, Value>, desired: &Map<String, Value>) -> Vec<String> {
        self.attributes
            .iter()
            .filter(|(_, attr)| !attr.is_computed_only())
            .filter(|(key, attr)| {
                let new = desired.get(key.as_str());
                if !is_set(new) && attr.computed {
                    return false;
                }
                attr.differs(prior.get(key.as_str()), new)
            })
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Changed attributes that cannot be updated in place
    pub fn replacement_keys(
        &self,
        prior: &Map<String, Value>,
        desired: &Map<String, Value>,
    ) -> Vec<String> {
        self.changed_keys(prior, desired)
            .into_iter()
            .filter(|key| self.attributes.get(key).is_some_and(|a| a.force_new))
            .collect()
    }
}
