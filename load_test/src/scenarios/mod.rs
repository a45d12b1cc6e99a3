// Scenarios module
// Contains the iteration bodies run by each virtual user

pub mod get_todo_by_id;

/// How an iteration ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    /// Every identifier was requested and paused after
    Completed,
    /// Cancelled mid-request or mid-pause
    Interrupted,
}
