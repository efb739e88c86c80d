//! # Legacy Priority Classes

use tracing::info;

use super::MaintenanceError;
use crate::client::SeedClient;
use crate::constants::LEGACY_PRIORITY_CLASSES;

/// Delete the priority classes in [`LEGACY_PRIORITY_CLASSES`]
///
/// Missing ones are skipped, other priority classes are never touched.
/// Returns the names that were deleted.
pub async fn cleanup_legacy_priority_classes(
    seed: &dyn SeedClient,
) -> Result<Vec<String>, MaintenanceError> {
    let mut deleted = Vec::new();
    for name in LEGACY_PRIORITY_CLASSES {
        let existed = seed
            .delete_priority_class(name)
            .await
            .map_err(|source| MaintenanceError::DeletePriorityClass {
                name: (*name).to_string(),
                source,
            })?;
        if existed {
            info!(priority_class = name, "Deleted legacy priority class");
            deleted.push((*name).to_string());
        }
    }
    Ok(deleted)
}
