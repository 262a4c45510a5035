//! Scheduler tick loop.
//!
//! Background task that periodically scans the registry for due jobs and
//! spawns their executions. The loop itself performs no I/O: it reads the
//! registry, claims each due job, and hands the request to an independent
//! task. A hung or failing execution affects only that job's record.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::executor::JobExecutor;
use crate::registry::JobRegistry;

/// Runs the scheduler loop until the shutdown signal flips to `true`.
///
/// Bookkeeping (`last_execution`, `execution_count`, `next_execution`) is
/// claimed at dispatch, so a run still in flight on the next tick is not
/// re-dispatched; the outcome lands on the job record when the run finishes.
pub async fn run_scheduler_loop(
    registry: Arc<JobRegistry>,
    executor: Arc<JobExecutor>,
    tick: Duration,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(tick);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }

        if *shutdown.borrow() {
            break;
        }

        let now = Utc::now();
        for due in registry.due_jobs(now) {
            // The job may have been removed between the due scan and the claim.
            let Some(job) = registry.mark_dispatched(&due.id, now) else {
                continue;
            };

            tracing::info!(
                job_id = %job.id,
                execution = job.execution_count,
                next_execution = %job.next_execution,
                "dispatching job"
            );

            let registry = Arc::clone(&registry);
            let executor = Arc::clone(&executor);
            tokio::spawn(async move {
                let outcome = executor.execute(&job.request).await;
                if outcome.success {
                    tracing::info!(
                        job_id = %job.id,
                        status = outcome.status_code,
                        "job execution succeeded"
                    );
                } else {
                    tracing::warn!(
                        job_id = %job.id,
                        status = outcome.status_code,
                        error = outcome.error.as_deref().unwrap_or("unknown"),
                        "job execution failed"
                    );
                }
                registry.record_outcome(&job.id, outcome);
            });
        }
    }

    tracing::info!("scheduler loop stopped");
}
