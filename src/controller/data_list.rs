//! # Resource Data List
//!
//! Name-keyed view over `ShootState.spec.gardener`.
//!
//! Entries keep their position when replaced and are appended when new, so the
//! list order stays stable across upserts. Names are unique after every
//! operation. The list is an in-memory working copy; persisting it is the job
//! of [`crate::controller::patch`].

use crate::crd::GardenerResourceData;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GardenerResourceDataList(Vec<GardenerResourceData>);

impl GardenerResourceDataList {
    #[must_use]
    pub fn new(entries: Vec<GardenerResourceData>) -> Self {
        Self(entries)
    }

    /// Replace the entry with the same name, or append it
    pub fn upsert(&mut self, entry: GardenerResourceData) {
        match self.0.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.0.push(entry),
        }
    }

    /// Remove the entry named `name`, no-op if absent
    pub fn delete(&mut self, name: &str) {
        self.0.retain(|e| e.name != name);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&GardenerResourceData> {
        self.0.iter().find(|e| e.name == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GardenerResourceData> {
        self.0.iter()
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<GardenerResourceData> {
        self.0
    }
}
