//! Lookup of remote objects by identifier or by name

use crate::data::ResourceData;
use crate::error::{CloudError, Result};

/// Search criterion of a data source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Id(String),
    Name(String),
}

impl Selector {
    /// Reads the criterion from the `id` and `name` attributes. The
    /// identifier wins when both are present.
    pub fn from_data(d: &ResourceData) -> Result<Self> {
        if let Some(id) = d.get_ok("id").and_then(|v| v.as_str()) {
            return Ok(Selector::Id(id.to_string()));
        }
        if let Some(name) = d.get_ok("name").and_then(|v| v.as_str()) {
            return Ok(Selector::Name(name.to_string()));
        }
        Err(CloudError::Validation(
            "either name or id must be specified".to_string(),
        ))
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selector::Id(id) => write!(f, "ID {}", id),
            Selector::Name(name) => write!(f, "name {:?}", name),
        }
    }
}

/// Picks the single item matching `selector`.
///
/// An identifier returns its first match. A name must match exactly one
/// item: several matches are reported as ambiguous instead of guessing.
pub fn find_unique<T, I, N>(
    items: impl IntoIterator<Item = T>,
    selector: &Selector,
    id_of: I,
    name_of: N,
    kind: &str,
) -> Result<T>
where
    I: Fn(&T) -> &str,
    N: Fn(&T) -> &str,
{
    let mut found: Option<T> = None;
    for item in items {
        match selector {
            Selector::Id(id) => {
                if id_of(&item) == id.as_str() {
                    return Ok(item);
                }
            }
            Selector::Name(name) => {
                if name_of(&item) == name.as_str() {
                    if found.is_some() {
                        return Err(CloudError::Ambiguous {
                            kind: kind.to_string(),
                            name: name.clone(),
                        });
                    }
                    found = Some(item);
                }
            }
        }
    }

    found.ok_or_else(|| CloudError::NotFound(format!("{} not found", kind)))
}
