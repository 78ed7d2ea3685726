//! Tag reconciliation
//!
//! Tags are patched, never replaced: missing keys are created, keys with a
//! different value are updated and keys only present remotely are left alone.

use std::collections::BTreeMap;

/// Unordered string to string mapping attached to a remote object
pub type Tags = BTreeMap<String, String>;

/// Changes needed to bring remote tags in line with the declared ones
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPatch {
    pub create: Tags,
    pub update: Tags,
}

impl TagPatch {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty()
    }
}

pub fn diff_tags(remote: &Tags, desired: &Tags) -> TagPatch {
    let mut patch = TagPatch::default();
    for (key, value) in desired {
        match remote.get(key) {
            None => {
                patch.create.insert(key.clone(), value.clone());
            }
            Some(current) if current != value => {
                patch.update.insert(key.clone(), value.clone());
            }
            Some(_) => {}
        }
    }
    patch
}
