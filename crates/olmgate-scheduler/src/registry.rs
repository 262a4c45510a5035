//! Concurrent job registry.
//!
//! The registry is mutated by the HTTP layer concurrently with the scheduler
//! loop. All operations take the lock briefly and hand out clones, so callers
//! never hold a reference into the map, so enumeration is always safe while
//! the loop advances bookkeeping. Locks are never held across await points.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};

use crate::error::SchedulerError;
use crate::job::{ExecutionOutcome, Job, RequestTemplate};
use crate::schedule::Schedule;

#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, Job>>,
}

impl JobRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a job, or replaces an existing job's schedule and template.
    ///
    /// `next_execution` is recomputed from now in both cases; `created_at`,
    /// `execution_count`, and execution history survive a replace. An upsert
    /// reactivates a deactivated job.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidSchedule`] when the schedule fails
    /// validation; the registry is left untouched.
    pub fn upsert(
        &self,
        id: &str,
        schedule: Schedule,
        request: RequestTemplate,
    ) -> Result<Job, SchedulerError> {
        schedule.validate()?;
        let now = Utc::now();
        let next_execution = schedule.next_after(now, None);

        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let job = match jobs.get_mut(id) {
            Some(existing) => {
                existing.schedule = schedule;
                existing.request = request;
                existing.next_execution = next_execution;
                existing.is_active = true;
                existing.clone()
            }
            None => {
                let job = Job {
                    id: id.to_owned(),
                    schedule,
                    request,
                    next_execution,
                    last_execution: None,
                    execution_count: 0,
                    is_active: true,
                    created_at: now,
                    last_outcome: None,
                };
                jobs.insert(id.to_owned(), job.clone());
                job
            }
        };
        Ok(job)
    }

    /// Removes a job. Returns whether one existed.
    pub fn remove(&self, id: &str) -> bool {
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }

    pub fn get(&self, id: &str) -> Option<Job> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Snapshot of every job. No live aliasing into the registry.
    pub fn all(&self) -> Vec<Job> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Snapshot of the jobs due at `now`: active with `next_execution <= now`.
    pub fn due_jobs(&self, now: DateTime<Utc>) -> Vec<Job> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|job| job.is_active && job.next_execution <= now)
            .cloned()
            .collect()
    }

    /// Claims a due job for execution: advances `last_execution`,
    /// `execution_count`, and `next_execution` in one step, so a slow run is
    /// never re-dispatched by subsequent ticks. One-shot jobs are deactivated
    /// here; they fire once and stay inspectable until removed or re-armed
    /// by a fresh upsert.
    ///
    /// Returns the post-claim snapshot, or `None` if the job vanished between
    /// the due scan and the claim.
    pub fn mark_dispatched(&self, id: &str, now: DateTime<Utc>) -> Option<Job> {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        jobs.get_mut(id).map(|job| {
            job.last_execution = Some(now);
            job.execution_count += 1;
            job.next_execution = job.schedule.next_after(now, Some(now));
            if matches!(job.schedule, Schedule::OnceAt { .. }) {
                job.is_active = false;
            }
            job.clone()
        })
    }

    /// Records the outcome of a finished execution. A job removed mid-flight
    /// simply drops its outcome.
    pub fn record_outcome(&self, id: &str, outcome: ExecutionOutcome) {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(job) = jobs.get_mut(id) {
            job.last_outcome = Some(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn template() -> RequestTemplate {
        RequestTemplate {
            method: "GET".to_owned(),
            url: "https://erp.olmed.example/api/ping".to_owned(),
            headers: std::collections::BTreeMap::new(),
            body: None,
            use_shared_auth: false,
        }
    }

    fn interval(secs: u64) -> Schedule {
        Schedule::Interval {
            interval_seconds: secs,
        }
    }

    #[test]
    fn upsert_computes_next_execution_from_now() {
        let registry = JobRegistry::new();
        let before = Utc::now();
        let job = registry.upsert("ping", interval(30), template()).unwrap();
        let after = Utc::now();

        assert!(job.next_execution >= before + Duration::seconds(30));
        assert!(job.next_execution <= after + Duration::seconds(30));
        assert_eq!(job.execution_count, 0);
        assert!(job.is_active);
        assert!(job.last_execution.is_none());
    }

    #[test]
    fn upsert_is_idempotent_not_cumulative() {
        let registry = JobRegistry::new();
        let first = registry.upsert("ping", interval(30), template()).unwrap();
        let second = registry.upsert("ping", interval(30), template()).unwrap();
        let after = Utc::now();

        assert_eq!(second.execution_count, 0, "upsert must not count as a run");
        assert_eq!(second.created_at, first.created_at);
        // Recomputed from now, not stacked on top of the previous value.
        assert!(second.next_execution <= after + Duration::seconds(30));
        assert_eq!(registry.all().len(), 1);
    }

    #[test]
    fn upsert_replaces_schedule_and_template() {
        let registry = JobRegistry::new();
        registry.upsert("ping", interval(30), template()).unwrap();

        let mut replacement = template();
        replacement.url = "https://erp.olmed.example/api/pong".to_owned();
        let job = registry
            .upsert("ping", interval(60), replacement.clone())
            .unwrap();

        assert_eq!(job.schedule, interval(60));
        assert_eq!(job.request, replacement);
    }

    #[test]
    fn upsert_rejects_invalid_schedule_without_touching_registry() {
        let registry = JobRegistry::new();
        let result = registry.upsert("bad", interval(0), template());
        assert!(matches!(result, Err(SchedulerError::InvalidSchedule(_))));
        assert!(registry.get("bad").is_none());
    }

    #[test]
    fn invalid_sibling_does_not_affect_valid_registration() {
        let registry = JobRegistry::new();
        assert!(registry.upsert("bad", interval(0), template()).is_err());
        assert!(registry.upsert("good", interval(30), template()).is_ok());
        assert!(registry.get("good").is_some());
        assert!(registry.get("bad").is_none());
    }

    #[test]
    fn remove_reports_existence() {
        let registry = JobRegistry::new();
        assert!(!registry.remove("ping"));
        registry.upsert("ping", interval(30), template()).unwrap();
        assert!(registry.remove("ping"));
        assert!(registry.get("ping").is_none());
    }

    #[test]
    fn due_jobs_skips_future_and_inactive() {
        let registry = JobRegistry::new();
        registry.upsert("soon", interval(1), template()).unwrap();
        registry.upsert("later", interval(3600), template()).unwrap();

        let now = Utc::now() + Duration::seconds(2);
        let due: Vec<String> = registry.due_jobs(now).into_iter().map(|j| j.id).collect();
        assert_eq!(due, vec!["soon".to_owned()]);

        // A dispatched one-shot is inactive and never due again.
        registry
            .upsert(
                "oneshot",
                Schedule::OnceAt {
                    run_at: Utc::now() - Duration::seconds(5),
                },
                template(),
            )
            .unwrap();
        let now = Utc::now();
        assert!(registry.due_jobs(now).iter().any(|j| j.id == "oneshot"));
        registry.mark_dispatched("oneshot", now);
        assert!(!registry.due_jobs(now).iter().any(|j| j.id == "oneshot"));
    }

    #[test]
    fn mark_dispatched_advances_bookkeeping_without_drift() {
        let registry = JobRegistry::new();
        registry.upsert("ping", interval(30), template()).unwrap();

        // The §-style scenario: dispatch happens one second after the job
        // came due; the next execution anchors to the dispatch instant.
        let dispatched_at = Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 31).unwrap();
        let job = registry.mark_dispatched("ping", dispatched_at).unwrap();

        assert_eq!(job.execution_count, 1);
        assert_eq!(job.last_execution, Some(dispatched_at));
        assert_eq!(
            job.next_execution,
            Utc.with_ymd_and_hms(2025, 6, 2, 10, 1, 1).unwrap(),
            "next execution must be lastExecution + 30s"
        );
        assert!(job.is_active);
    }

    #[test]
    fn mark_dispatched_deactivates_one_shot_jobs() {
        let registry = JobRegistry::new();
        let run_at = Utc::now() - Duration::seconds(1);
        registry
            .upsert("oneshot", Schedule::OnceAt { run_at }, template())
            .unwrap();

        let job = registry.mark_dispatched("oneshot", Utc::now()).unwrap();
        assert!(!job.is_active, "one-shot jobs deactivate after firing");
        assert_eq!(job.execution_count, 1);
    }

    #[test]
    fn mark_dispatched_missing_job_returns_none() {
        let registry = JobRegistry::new();
        assert!(registry.mark_dispatched("ghost", Utc::now()).is_none());
    }

    #[test]
    fn record_outcome_attaches_to_job() {
        let registry = JobRegistry::new();
        registry.upsert("ping", interval(30), template()).unwrap();

        registry.record_outcome(
            "ping",
            ExecutionOutcome {
                success: false,
                status_code: Some(500),
                response_body: String::new(),
                error: Some("HTTP 500".to_owned()),
                executed_at: Utc::now(),
            },
        );

        let job = registry.get("ping").unwrap();
        let outcome = job.last_outcome.expect("outcome should be recorded");
        assert!(!outcome.success);
        assert_eq!(outcome.status_code, Some(500));
    }
}
