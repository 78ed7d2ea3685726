//! Declared resource state accessor
//!
//! `ResourceData` is the record the host keeps for one declared resource:
//! the identifier, the attributes known from the last read (`prior`) and the
//! attributes the current operation works with. Reconcilers read and write
//! through it and never keep their own copy between calls.

use crate::error::{CloudError, Result};
use crate::schema::Schema;
use crate::tags::Tags;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// Default bound of every remote phase
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

static NULL: Value = Value::Null;

/// Lifecycle operation, used to pick a timeout and for log context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Per-operation timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Timeouts {
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            create: timeout,
            read: timeout,
            update: timeout,
            delete: timeout,
        }
    }

    pub fn get(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Create => self.create,
            Operation::Read => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::uniform(DEFAULT_TIMEOUT)
    }
}

/// State record of one declared resource
#[derive(Debug, Clone)]
pub struct ResourceData {
    schema: Arc<Schema>,
    id: String,
    prior: Map<String, Value>,
    current: Map<String, Value>,
    timeouts: Timeouts,
}

impl ResourceData {
    /// Empty record, as seen before creation
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            id: String::new(),
            prior: Map::new(),
            current: Map::new(),
            timeouts: Timeouts::default(),
        }
    }

    /// Record for a resource about to be created from `config`
    pub fn for_create(schema: Arc<Schema>, config: Map<String, Value>) -> Self {
        Self {
            current: config,
            ..Self::new(schema)
        }
    }

    /// Record restored from persisted state
    pub fn from_state(schema: Arc<Schema>, id: impl Into<String>, attrs: Map<String, Value>) -> Self {
        Self {
            schema,
            id: id.into(),
            prior: attrs.clone(),
            current: attrs,
            timeouts: Timeouts::default(),
        }
    }

    /// Record for an update: `prior` is the stored state and `desired` the
    /// declared configuration. Computed values the configuration leaves
    /// unset are carried over from the prior state.
    pub fn planned(
        schema: Arc<Schema>,
        id: impl Into<String>,
        prior: Map<String, Value>,
        desired: Map<String, Value>,
    ) -> Self {
        let mut current = desired;
        for (key, attr) in &schema.attributes {
            if !attr.computed || current.get(key).is_some_and(|v| !v.is_null()) {
                continue;
            }
            if let Some(value) = prior.get(key) {
                current.insert(key.clone(), value.clone());
            }
        }

        Self {
            schema,
            id: id.into(),
            prior,
            current,
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Human readable identification for log fields
    pub fn id_string(&self, type_name: &str) -> String {
        format!("{} (ID = {})", type_name, self.id)
    }

    /// Current value of `key`, `null` when unset
    pub fn get(&self, key: &str) -> &Value {
        self.current.get(key).unwrap_or(&NULL)
    }

    pub fn get_str(&self, key: &str) -> &str {
        self.get(key).as_str().unwrap_or("")
    }

    pub fn get_int(&self, key: &str) -> i64 {
        self.get(key).as_i64().unwrap_or(0)
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).as_bool().unwrap_or(false)
    }

    /// Sorted, deduplicated set members
    pub fn get_set(&self, key: &str) -> Vec<String> {
        let mut items: Vec<String> = self
            .get(key)
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        items.sort();
        items.dedup();
        items
    }

    pub fn get_map(&self, key: &str) -> Tags {
        self.get(key)
            .as_object()
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The value of `key` if it is set to something other than its zero value
    pub fn get_ok(&self, key: &str) -> Option<&Value> {
        let value = self.current.get(key)?;
        let zero = match self.schema.get(key) {
            Some(attr) => attr.kind.zero(),
            None => Value::Null,
        };
        if value.is_null() || *value == zero {
            None
        } else {
            Some(value)
        }
    }

    /// Writes an attribute; fails for keys outside the schema or values of
    /// the wrong type
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let attr = self.schema.get(key).ok_or_else(|| {
            CloudError::StateError(format!("attribute {:?} is not part of the schema", key))
        })?;
        if !attr.kind.accepts(&value) {
            return Err(CloudError::StateError(format!(
                "invalid value for {:?}: expected {}",
                key, attr.kind
            )));
        }
        let value = if value.is_null() {
            value
        } else {
            attr.normalize(Some(&value))
        };
        self.current.insert(key.to_string(), value);
        Ok(())
    }

    pub fn has_change(&self, key: &str) -> bool {
        match self.schema.get(key) {
            Some(attr) => attr.differs(self.prior.get(key), self.current.get(key)),
            None => {
                self.prior.get(key).unwrap_or(&NULL) != self.current.get(key).unwrap_or(&NULL)
            }
        }
    }

    /// `(old, new)` values of `key`, both normalized
    pub fn get_change(&self, key: &str) -> (Value, Value) {
        match self.schema.get(key) {
            Some(attr) => (
                attr.normalize(self.prior.get(key)),
                attr.normalize(self.current.get(key)),
            ),
            None => (
                self.prior.get(key).cloned().unwrap_or(Value::Null),
                self.current.get(key).cloned().unwrap_or(Value::Null),
            ),
        }
    }

    /// Fails when one of `keys` held a value and would become empty; such a
    /// transition needs the resource to be recreated.
    pub fn reject_cleared(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            if !self.has_change(key) {
                continue;
            }
            let (old, new) = self.get_change(key);
            let old = old.as_str().unwrap_or("");
            let new = new.as_str().unwrap_or("");
            if !old.is_empty() && new.is_empty() {
                return Err(CloudError::Validation(format!(
                    "new value of {:?} cannot be empty. old value was {}. The resource must be recreated instead",
                    key, old
                )));
            }
        }
        Ok(())
    }

    /// Marks the current attributes as the known state
    pub fn commit(&mut self) {
        self.prior = self.current.clone();
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.current
    }

    pub fn into_attributes(self) -> Map<String, Value> {
        self.current
    }
}
