use crate::state::JobState;
use crate::HarvestError;

/// Bookkeeping for one user's crawl within a run
///
/// The job never owns the extracted records; it only counts them so the
/// run report stays small when thousands of users are harvested.
#[derive(Debug, Clone)]
pub struct CrawlJob {
    /// Member handle being harvested
    pub username: String,

    /// First listing page for the member
    pub base_url: String,

    /// Current lifecycle state
    pub state: JobState,

    /// Pages reported by the pagination control
    pub total_pages: u32,

    /// Pages whose fetch ended in an error
    pub failed_pages: u32,

    /// Records extracted across all pages
    pub record_count: usize,

    /// Most recent failure message, if any
    pub last_error: Option<String>,
}

impl CrawlJob {
    pub fn new(username: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            base_url: base_url.into(),
            state: JobState::Pending,
            total_pages: 0,
            failed_pages: 0,
            record_count: 0,
            last_error: None,
        }
    }

    /// Moves the job to `next`, rejecting illegal transitions
    pub fn transition(&mut self, next: JobState) -> Result<(), HarvestError> {
        if !self.state.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// Records an error without changing state
    pub fn note_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }
}
