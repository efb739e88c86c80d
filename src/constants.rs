//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Finalizer placed on every mirrored Secret
///
/// Blocks removal of the Secret until its entry has been pruned from the ShootState.
pub const SECRET_FINALIZER: &str = "gardenlet.gardener.cloud/secret-controller";

/// Field manager used for all patches issued by this controller
pub const FIELD_MANAGER: &str = "shoot-secret-controller";

/// Namespace label that identifies the role of a seed namespace
pub const LABEL_GARDEN_ROLE: &str = "gardener.cloud/role";

/// Value of [`LABEL_GARDEN_ROLE`] for Shoot control-plane namespaces
pub const GARDEN_ROLE_SHOOT: &str = "shoot";

/// `type` of every ShootState entry written by this controller
pub const RESOURCE_DATA_TYPE_SECRET: &str = "secret";

/// `status.lastOperation.type` recorded while a Shoot is migrated to another seed
pub const LAST_OPERATION_TYPE_MIGRATE: &str = "Migrate";

/// Label selecting ManagedResources created by gardener itself
pub const LABEL_KEY_ORIGIN: &str = "origin";

/// Value of [`LABEL_KEY_ORIGIN`] for gardener-owned ManagedResources
pub const LABEL_VALUE_GARDENER: &str = "gardener";

/// Priority classes that were renamed and must be removed from seeds
pub const LEGACY_PRIORITY_CLASSES: &[&str] = &["reversed-vpn-auth-server", "fluent-bit"];

/// Default label selector for Secrets persisted into the ShootState
pub const DEFAULT_SECRET_LABEL_SELECTOR: &str = "managed-by=secrets-manager,persist=true";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Default deadline for a single reconciliation (seconds)
pub const DEFAULT_RECONCILE_TIMEOUT_SECS: u64 = 30;

/// Default minimum backoff after a failed reconciliation (seconds)
pub const DEFAULT_BACKOFF_MIN_SECS: u64 = 1;

/// Default maximum backoff after repeated failures (seconds)
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;

/// Default limit of reconciliations running at the same time
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 10;

/// Default delay before restarting the controller stream after it ends (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Poll interval used while waiting for ManagedResources to disappear (seconds)
pub const MANAGED_RESOURCE_POLL_INTERVAL_SECS: u64 = 5;
