//! Test session state owned by the run sequencer

use crate::models::measurement::RunResult;
use crate::types::SessionStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One sequence of attempts triggered by a single user action.
///
/// Only the sequencer mutates a session; everyone else sees a [`SessionSnapshot`].
#[derive(Debug, Clone)]
pub struct TestSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    total_runs: usize,
    completed_runs: Vec<RunResult>,
    status: SessionStatus,
    failure_reason: Option<String>,
}

impl TestSession {
    /// Start a new running session targeting `total_runs` attempts
    pub(crate) fn start(total_runs: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            total_runs,
            completed_runs: Vec::with_capacity(total_runs),
            status: SessionStatus::Running,
            failure_reason: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn total_runs(&self) -> usize {
        self.total_runs
    }

    pub fn completed_runs(&self) -> &[RunResult] {
        &self.completed_runs
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Whether every planned attempt has produced a result
    pub fn is_full(&self) -> bool {
        self.completed_runs.len() >= self.total_runs
    }

    /// Append the result of the attempt that just resolved
    pub(crate) fn record(&mut self, result: RunResult) {
        debug_assert_eq!(self.status, SessionStatus::Running);
        self.completed_runs.push(result);
    }

    pub(crate) fn complete(&mut self) {
        self.status = SessionStatus::Completed;
    }

    /// Mark the session failed; collected runs are no longer reportable
    pub(crate) fn fail(&mut self, reason: impl Into<String>) {
        self.status = SessionStatus::Failed;
        self.failure_reason = Some(reason.into());
    }

    /// Read-only view for observers
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: Some(self.id),
            status: self.status,
            started_at: Some(self.started_at),
            total_runs: self.total_runs,
            completed_runs: self.completed_runs.len(),
            failure_reason: self.failure_reason.clone(),
        }
    }
}

/// Copy of a session's observable state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: Option<Uuid>,
    pub status: SessionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub total_runs: usize,
    pub completed_runs: usize,
    pub failure_reason: Option<String>,
}

impl SessionSnapshot {
    /// Snapshot reported before any session has started
    pub fn idle() -> Self {
        Self {
            id: None,
            status: SessionStatus::Idle,
            started_at: None,
            total_runs: 0,
            completed_runs: 0,
            failure_reason: None,
        }
    }
}
