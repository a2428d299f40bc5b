//! Interpreter run state.

use fq_protocol::flow_models::Importance;

/// Two-state machine threaded through the step loop by value.
///
/// The only transition is `Running -> SkippingNonBlocking`, taken when a
/// blocking step fails. It is never undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Running,
    SkippingNonBlocking,
}

impl RunState {
    /// Whether a step of this importance is attempted in this state.
    pub fn admits(self, importance: Importance) -> bool {
        self == RunState::Running || importance.is_blocking()
    }

    /// State after a step of `importance` finished, `failed` or not.
    pub fn after(self, importance: Importance, failed: bool) -> RunState {
        if failed && importance.is_blocking() {
            RunState::SkippingNonBlocking
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_admits_everything() {
        let state = RunState::Running;
        assert!(state.admits(Importance::Normal));
        assert!(state.admits(Importance::Blocking));
        assert!(state.admits(Importance::Critical));
    }

    #[test]
    fn test_skipping_admits_only_blocking() {
        let state = RunState::SkippingNonBlocking;
        assert!(!state.admits(Importance::Normal));
        assert!(!state.admits(Importance::Critical));
        assert!(state.admits(Importance::Blocking));
    }

    #[test]
    fn test_transition_is_one_way() {
        let state = RunState::Running.after(Importance::Normal, true);
        assert_eq!(state, RunState::Running);

        let state = state.after(Importance::Blocking, true);
        assert_eq!(state, RunState::SkippingNonBlocking);

        let state = state.after(Importance::Blocking, false);
        assert_eq!(state, RunState::SkippingNonBlocking);
    }
}
