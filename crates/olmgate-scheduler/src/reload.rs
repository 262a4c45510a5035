//! Registry reload from sync-config stores.
//!
//! Job definitions are rebuilt from the product/order sync-config files on
//! demand; there is no persisted schedule state. Active configurations are
//! upserted as interval jobs, deactivated ones are removed, and an invalid
//! configuration is rejected without affecting its siblings.

use olmgate_core::{ConfigError, SyncConfigStore};
use serde::Serialize;

use crate::job::RequestTemplate;
use crate::registry::JobRegistry;
use crate::schedule::Schedule;

/// What a reload pass did, for operator feedback.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ReloadSummary {
    pub upserted: usize,
    pub removed: usize,
    pub rejected: usize,
}

/// Rebuilds registry entries from every given store.
///
/// # Errors
///
/// Returns `ConfigError` when a store cannot be read or parsed at all;
/// individually invalid configurations are counted in `rejected` instead.
pub fn reload_registry(
    registry: &JobRegistry,
    stores: &[SyncConfigStore],
) -> Result<ReloadSummary, ConfigError> {
    let mut summary = ReloadSummary::default();

    for store in stores {
        for config in store.load()? {
            if config.active {
                let schedule = Schedule::Interval {
                    interval_seconds: config.interval_seconds,
                };
                let template = RequestTemplate {
                    method: config.method,
                    url: config.url,
                    headers: config.headers,
                    body: config.body,
                    use_shared_auth: config.use_shared_auth,
                };
                match registry.upsert(&config.id, schedule, template) {
                    Ok(_) => summary.upserted += 1,
                    Err(e) => {
                        tracing::warn!(
                            job_id = %config.id,
                            error = %e,
                            "rejected sync job configuration"
                        );
                        summary.rejected += 1;
                    }
                }
            } else if registry.remove(&config.id) {
                summary.removed += 1;
            }
        }
    }

    Ok(summary)
}
