//! Field Registry: the ordered list of placed fields.
//!
//! The registry is a persistent snapshot. Every mutation returns a new
//! registry and leaves the receiver untouched, so hosts can detect change by
//! reference (`same_snapshot`). A mutation that changes nothing hands back a
//! clone sharing the same allocation.
//!
//! `instance_id` is unique within a registry at all times. `field_kind` is
//! not: several placements of the same kind are normal.

use crate::id::InstanceId;
use crate::model::{FieldInstance, FieldKind, FieldPatch};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    fields: Arc<Vec<FieldInstance>>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a host-supplied list, keeping the first occurrence of any
    /// duplicated id.
    pub fn from_fields(fields: impl IntoIterator<Item = FieldInstance>) -> Self {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for mut field in fields {
            if !seen.insert(field.instance_id) {
                log::warn!("dropping duplicate field instance {}", field.instance_id);
                continue;
            }
            field.normalize();
            out.push(field);
        }
        Self {
            fields: Arc::new(out),
        }
    }

    /// Append a field. An instance whose id is already present is refused.
    pub fn add(&self, instance: FieldInstance) -> Self {
        if self.contains(instance.instance_id) {
            log::warn!("refusing to add duplicate id {}", instance.instance_id);
            return self.clone();
        }
        let mut instance = instance;
        instance.normalize();
        let mut fields = Vec::with_capacity(self.fields.len() + 1);
        fields.extend(self.fields.iter().cloned());
        fields.push(instance);
        Self {
            fields: Arc::new(fields),
        }
    }

    /// Apply `patch` to the field with `id`. Unknown ids are a no-op.
    pub fn update(&self, id: InstanceId, patch: &FieldPatch) -> Self {
        let Some(idx) = self.index_of(id) else {
            return self.clone();
        };
        let mut updated = self.fields[idx].clone();
        patch.apply_to(&mut updated);
        if updated == self.fields[idx] {
            return self.clone();
        }
        let mut fields = self.fields.as_ref().clone();
        fields[idx] = updated;
        Self {
            fields: Arc::new(fields),
        }
    }

    /// Remove the field with `id`. Unknown ids are a no-op.
    pub fn remove(&self, id: InstanceId) -> Self {
        let Some(idx) = self.index_of(id) else {
            return self.clone();
        };
        let mut fields = self.fields.as_ref().clone();
        fields.remove(idx);
        Self {
            fields: Arc::new(fields),
        }
    }

    pub fn find(&self, id: InstanceId) -> Option<&FieldInstance> {
        self.fields.iter().find(|f| f.instance_id == id)
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.index_of(id).is_some()
    }

    /// The most recently added instance of `kind`.
    pub fn latest_of_kind(&self, kind: &FieldKind) -> Option<&FieldInstance> {
        self.fields.iter().rev().find(|f| &f.field_kind == kind)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldInstance> {
        self.fields.iter()
    }

    pub fn as_slice(&self) -> &[FieldInstance] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `true` when both registries share one snapshot (no mutation between).
    pub fn same_snapshot(&self, other: &FieldRegistry) -> bool {
        Arc::ptr_eq(&self.fields, &other.fields)
    }

    fn index_of(&self, id: InstanceId) -> Option<usize> {
        self.fields.iter().position(|f| f.instance_id == id)
    }
}

impl PartialEq for FieldRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.same_snapshot(other) || self.fields == other.fields
    }
}

impl<'a> IntoIterator for &'a FieldRegistry {
    type Item = &'a FieldInstance;
    type IntoIter = std::slice::Iter<'a, FieldInstance>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for FieldRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.as_slice().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FieldRegistry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Vec::<FieldInstance>::deserialize(deserializer)?;
        Ok(Self::from_fields(fields))
    }
}
