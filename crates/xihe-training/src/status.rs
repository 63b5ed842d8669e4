//! Normalisation of job status reported by the compute platform.

use crate::error::{TrainingError, TrainingResult};
use crate::job::JobDetail;

/// Display value for a job the platform has not reported on yet.
pub const STATUS_SCHEDULING: &str = "scheduling";

/// Statuses after which a job never changes again.
pub const DEFAULT_DONE_STATUSES: [&str; 4] = ["completed", "failed", "terminated", "abnormal"];

/// Decides which platform statuses are terminal and how statuses are shown.
#[derive(Debug, Clone)]
pub struct JobStatusRules {
    done: Vec<String>,
}

impl Default for JobStatusRules {
    fn default() -> Self {
        Self::new(DEFAULT_DONE_STATUSES)
    }
}

impl JobStatusRules {
    pub fn new<I, S>(done: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self { done: done.into_iter().map(|s| s.as_ref().to_lowercase()).collect() }
    }

    /// Terminal statuses compare case-insensitively; an empty status is never done.
    #[must_use]
    pub fn is_job_done(&self, status: &str) -> bool {
        !status.is_empty() && self.done.iter().any(|d| d.eq_ignore_ascii_case(status))
    }

    /// Status shown to callers; unset maps to `scheduling`.
    #[must_use]
    pub fn display_status(status: &str) -> &str {
        if status.is_empty() { STATUS_SCHEDULING } else { status }
    }

    /// Merges a platform report into the stored detail.
    ///
    /// Transitions are append-only: once the stored status is terminal its
    /// status cannot change. Empty incoming fields keep the stored values.
    pub fn reconcile(
        &self,
        current: &JobDetail,
        incoming: &JobDetail,
    ) -> TrainingResult<JobDetail> {
        let status_changes =
            !incoming.status.is_empty() && !incoming.status.eq_ignore_ascii_case(&current.status);
        if status_changes && self.is_job_done(&current.status) {
            return Err(TrainingError::JobAlreadyDone(current.status.clone()));
        }

        let pick =
            |new: &String, old: &String| if new.is_empty() { old.clone() } else { new.clone() };
        Ok(JobDetail {
            status: pick(&incoming.status, &current.status),
            error: pick(&incoming.error, &current.error),
            duration: if incoming.duration > 0 { incoming.duration } else { current.duration },
            aim_path: pick(&incoming.aim_path, &current.aim_path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(status: &str) -> JobDetail {
        JobDetail { status: status.to_string(), ..Default::default() }
    }

    #[test]
    fn test_empty_status_is_scheduling_and_not_done() {
        let rules = JobStatusRules::default();
        assert_eq!(JobStatusRules::display_status(""), "scheduling");
        assert!(!rules.is_job_done(""));
    }

    #[test]
    fn test_done_statuses_are_case_insensitive() {
        let rules = JobStatusRules::default();
        assert!(rules.is_job_done("Completed"));
        assert!(rules.is_job_done("failed"));
        assert!(!rules.is_job_done("Running"));
        assert_eq!(JobStatusRules::display_status("Running"), "Running");
    }

    #[test]
    fn test_custom_done_statuses() {
        let rules = JobStatusRules::new(["Succeeded"]);
        assert!(rules.is_job_done("succeeded"));
        assert!(!rules.is_job_done("completed"));
    }

    #[test]
    fn test_reconcile_moves_forward() {
        let rules = JobStatusRules::default();
        let running = rules.reconcile(&JobDetail::default(), &detail("Running")).unwrap();
        assert_eq!(running.status, "Running");

        let incoming = JobDetail {
            status: "Completed".to_string(),
            duration: 120,
            aim_path: "obs://aim/1".to_string(),
            ..Default::default()
        };
        let done = rules.reconcile(&running, &incoming).unwrap();
        assert_eq!(done.status, "Completed");
        assert_eq!(done.duration, 120);
        assert_eq!(done.aim_path, "obs://aim/1");
    }

    #[test]
    fn test_reconcile_rejects_leaving_terminal_status() {
        let rules = JobStatusRules::default();
        let err = rules.reconcile(&detail("Failed"), &detail("Running")).unwrap_err();
        assert!(matches!(err, TrainingError::JobAlreadyDone(s) if s == "Failed"));
    }

    #[test]
    fn test_reconcile_fills_details_of_terminal_job() {
        let rules = JobStatusRules::default();
        let current =
            JobDetail { status: "Failed".to_string(), duration: 30, ..Default::default() };
        let incoming = JobDetail { error: "OOM".to_string(), ..Default::default() };
        let merged = rules.reconcile(&current, &incoming).unwrap();
        assert_eq!(merged.status, "Failed");
        assert_eq!(merged.error, "OOM");
        assert_eq!(merged.duration, 30);
    }
}
