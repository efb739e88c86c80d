//! # Patch Committer
//!
//! Persists a mutated ShootState data list as a strategic merge patch.
//!
//! `spec.gardener` is merged by the API server using `name` as the merge key,
//! so the patch only lists the entries that differ between the baseline
//! (captured before mutation) and the mutated list:
//!
//! - removed entries: `{"$patch": "delete", "name": ...}`
//! - new entries: the full entry
//! - changed entries: the name plus the changed fields, `null` for dropped keys
//!
//! Nothing else is sent and no resourceVersion is carried, so entries and
//! fields written concurrently by others are preserved.

use std::collections::HashMap;

use kube::ResourceExt;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::client::{object_key, GardenClient, StoreError};
use crate::crd::{GardenerResourceData, ShootState};
use crate::observability::metrics;

const PATCH_DIRECTIVE: &str = "$patch";

#[derive(Debug, Error)]
pub enum CommitError {
    #[error("failed to encode ShootState patch: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// JSON merge diff turning `old` into `new`, `None` if they are equal
fn merge_diff(old: &Value, new: &Value) -> Option<Value> {
    match (old, new) {
        (Value::Object(old), Value::Object(new)) => {
            let mut diff = Map::new();
            for key in old.keys().filter(|key| !new.contains_key(*key)) {
                diff.insert(key.clone(), Value::Null);
            }
            for (key, value) in new {
                let changed = match old.get(key) {
                    Some(previous) => merge_diff(previous, value),
                    None => Some(value.clone()),
                };
                if let Some(changed) = changed {
                    diff.insert(key.clone(), changed);
                }
            }
            (!diff.is_empty()).then_some(Value::Object(diff))
        }
        _ if old == new => None,
        _ => Some(new.clone()),
    }
}

/// Compute the strategic merge patch turning `baseline` into `mutated`
///
/// `None` means there is nothing to persist.
pub fn compute_patch(
    baseline: &ShootState,
    mutated: &ShootState,
) -> Result<Option<Value>, serde_json::Error> {
    let old: HashMap<&str, &GardenerResourceData> = baseline
        .spec
        .gardener
        .iter()
        .map(|e| (e.name.as_str(), e))
        .collect();
    let new: HashMap<&str, &GardenerResourceData> = mutated
        .spec
        .gardener
        .iter()
        .map(|e| (e.name.as_str(), e))
        .collect();

    let mut elements = Vec::new();

    for entry in &baseline.spec.gardener {
        if !new.contains_key(entry.name.as_str()) {
            elements.push(json!({ PATCH_DIRECTIVE: "delete", "name": entry.name }));
        }
    }

    for entry in &mutated.spec.gardener {
        let after = serde_json::to_value(entry)?;
        match old.get(entry.name.as_str()) {
            None => elements.push(after),
            Some(before) if *before == entry => {}
            Some(before) => {
                let before = serde_json::to_value(before)?;
                if let Some(Value::Object(mut diff)) = merge_diff(&before, &after) {
                    diff.insert("name".to_string(), Value::String(entry.name.clone()));
                    elements.push(Value::Object(diff));
                }
            }
        }
    }

    if elements.is_empty() {
        return Ok(None);
    }
    Ok(Some(json!({ "spec": { "gardener": elements } })))
}

/// Persist the difference between `baseline` and `mutated`
///
/// Returns `false` if there was nothing to send. Failures (including a
/// ShootState that vanished since it was read) are returned, never masked.
pub async fn commit(
    garden: &dyn GardenClient,
    baseline: &ShootState,
    mutated: &ShootState,
) -> Result<bool, CommitError> {
    let namespace = baseline.namespace().unwrap_or_default();
    let name = baseline.name_any();

    let Some(patch) = compute_patch(baseline, mutated)? else {
        debug!(shoot_state = %object_key(&namespace, &name), "ShootState already up to date");
        metrics::increment_shoot_state_patches("noop");
        return Ok(false);
    };

    debug!(shoot_state = %object_key(&namespace, &name), "Patching ShootState");
    match garden.patch_shoot_state(&namespace, &name, &patch).await {
        Ok(()) => {
            metrics::increment_shoot_state_patches("applied");
            Ok(true)
        }
        Err(e) => {
            metrics::increment_shoot_state_patches("failed");
            Err(e.into())
        }
    }
}
