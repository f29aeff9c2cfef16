//! Selection state shared across panels.
//!
//! The selected job is a weak reference: an id plus the last snapshot seen,
//! re-resolved against the job list after every refresh.

use crate::model::Job;

#[derive(Debug, Clone, Default)]
pub struct JobSelection {
    selected: Option<Job>,
    /// Set once anything has been selected, by the user or by default.
    initialized: bool,
}

impl JobSelection {
    pub fn selected(&self) -> Option<&Job> {
        self.selected.as_ref()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_ref().map(|job| job.id.as_str())
    }

    pub fn select(&mut self, job: Job) {
        self.initialized = true;
        self.selected = Some(job);
    }

    /// The user closed the detail view. Later refreshes must not reopen it.
    pub fn clear(&mut self) {
        self.initialized = true;
        self.selected = None;
    }

    /// Drop the selection if it points at `job_id`. Returns true if it did.
    pub fn forget(&mut self, job_id: &str) -> bool {
        if self.selected_id() == Some(job_id) {
            self.selected = None;
            true
        } else {
            false
        }
    }

    /// Re-resolve against a freshly sorted list. Returns true when the
    /// selected id changed.
    pub fn reconcile(&mut self, jobs: &[Job]) -> bool {
        match self.selected.take() {
            Some(current) => {
                self.selected = jobs.iter().find(|job| job.id == current.id).cloned();
                self.selected.is_none()
            }
            None if !self.initialized => match jobs.first() {
                Some(newest) => {
                    self.select(newest.clone());
                    true
                }
                None => false,
            },
            None => false,
        }
    }
}

/// Composite key the derived coaching and coverage panels are bound to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SelectionKey {
    pub job_id: Option<String>,
    pub plan_id: Option<String>,
}

impl SelectionKey {
    pub fn new(job_id: Option<&str>, plan_id: Option<&str>) -> Self {
        Self {
            job_id: job_id.map(str::to_owned),
            plan_id: plan_id.map(str::to_owned),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::JobStatus;

    fn job(id: &str, status: JobStatus) -> Job {
        Job {
            id: id.to_string(),
            filename: format!("{id}.mp3"),
            original_name: None,
            status,
            created_at: String::new(),
            updated_at: None,
            result_summary: None,
            analysis_json: None,
            error: None,
            email_status: None,
            email_sent_at: None,
        }
    }

    #[test]
    fn first_non_empty_refresh_selects_newest() {
        let mut selection = JobSelection::default();
        assert!(!selection.reconcile(&[]));
        assert_eq!(selection.selected_id(), None);

        let jobs = vec![job("j2", JobStatus::Uploaded), job("j1", JobStatus::Done)];
        assert!(selection.reconcile(&jobs));
        assert_eq!(selection.selected_id(), Some("j2"));
    }

    #[test]
    fn selection_follows_refreshed_snapshot() {
        let mut selection = JobSelection::default();
        selection.select(job("j1", JobStatus::Processing));

        let changed = selection.reconcile(&[job("j1", JobStatus::Done)]);
        assert!(!changed);
        assert_eq!(selection.selected().unwrap().status, JobStatus::Done);
    }

    #[test]
    fn vanished_selection_becomes_none_and_is_not_replaced() {
        let mut selection = JobSelection::default();
        selection.select(job("j1", JobStatus::Done));

        assert!(selection.reconcile(&[job("j2", JobStatus::Done)]));
        assert_eq!(selection.selected_id(), None);

        assert!(!selection.reconcile(&[job("j2", JobStatus::Done)]));
        assert_eq!(selection.selected_id(), None);
    }

    #[test]
    fn closed_selection_stays_closed() {
        let mut selection = JobSelection::default();
        selection.reconcile(&[job("j1", JobStatus::Done)]);
        selection.clear();
        selection.reconcile(&[job("j1", JobStatus::Done)]);
        assert_eq!(selection.selected_id(), None);
    }

    #[test]
    fn forget_only_matches_selected_id() {
        let mut selection = JobSelection::default();
        selection.select(job("j1", JobStatus::Done));
        assert!(!selection.forget("j9"));
        assert!(selection.forget("j1"));
        assert_eq!(selection.selected(), None);
    }
}
