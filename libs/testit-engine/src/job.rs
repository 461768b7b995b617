use testit_common::types::Language;
use tracing::debug;
use uuid::Uuid;

/// Lifecycle of one execution attempt.
///
/// A Job is mutated only by the supervisor and workspace manager and never
/// outlives a terminal state: no retry, no reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Created,
    Compiling,
    CompileFailed,
    Running,
    Completed,
    RuntimeError,
    TimedOut,
    Killed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::CompileFailed
                | JobState::Completed
                | JobState::RuntimeError
                | JobState::TimedOut
                | JobState::Killed
        )
    }
}

/// One execution attempt. Owns its identity and state; the workspace and
/// process handle are owned by whichever component is driving the Job.
#[derive(Debug)]
pub struct Job {
    pub id: Uuid,
    pub language: Language,
    pub state: JobState,
}

impl Job {
    pub fn new(language: Language) -> Self {
        Self {
            id: Uuid::new_v4(),
            language,
            state: JobState::Created,
        }
    }

    pub fn advance(&mut self, next: JobState) {
        debug!(job_id = %self.id, from = ?self.state, to = ?next, "job state");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!JobState::Created.is_terminal());
        assert!(!JobState::Compiling.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::CompileFailed.is_terminal());
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::RuntimeError.is_terminal());
        assert!(JobState::TimedOut.is_terminal());
        assert!(JobState::Killed.is_terminal());
    }

    #[test]
    fn test_new_job_is_created() {
        let job = Job::new(Language::Python);
        assert_eq!(job.state, JobState::Created);
        assert_eq!(job.language, Language::Python);
    }

    #[test]
    fn test_job_ids_unique() {
        let a = Job::new(Language::Java);
        let b = Job::new(Language::Java);
        assert_ne!(a.id, b.id);
    }
}
