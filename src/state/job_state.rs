/// Lifecycle states of a single user crawl
///
/// This module defines every state a crawl job passes through and which
/// transitions between them are legal.
use std::fmt;

/// Represents the current state of a user crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Job is created but its batch has not started yet
    Pending,

    /// Pagination and page fetches are in flight
    Running,

    /// At least one listing page was fetched and extracted
    Succeeded,

    /// No listing page could be fetched; the dataset is empty
    Failed,
}

impl JobState {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Returns true if moving from `self` to `next` is allowed
    ///
    /// Pending → Running → Succeeded | Failed.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Running, Self::Succeeded)
                | (Self::Running, Self::Failed)
        )
    }

    /// Short lowercase label used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    /// Returns all possible job states
    pub fn all_states() -> [Self; 4] {
        [Self::Pending, Self::Running, Self::Succeeded, Self::Failed]
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
