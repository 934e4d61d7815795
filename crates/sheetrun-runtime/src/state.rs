//! Per-request lifecycle state machine.
//!
//! `Received → Allocated → Executing → {Succeeded | Failed} → Cleaned →
//! Responded`. A request that cannot be allocated goes straight from
//! `Received` to `Failed`, and a successful run whose artifact cannot be
//! read moves from `Succeeded` to `Failed`.

use std::fmt;

use sheetrun_types::RequestId;
use tracing::debug;

use crate::error::RuntimeError;

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    /// Validated and accepted.
    Received,
    /// An artifact path has been reserved.
    Allocated,
    /// The script is running.
    Executing,
    /// The script produced its artifact.
    Succeeded,
    /// The attempt failed.
    Failed,
    /// The artifact file has been released.
    Cleaned,
    /// A response has been produced. Terminal.
    Responded,
}

impl RequestState {
    /// Returns `true` if `next` may directly follow `self`.
    pub fn can_advance_to(self, next: Self) -> bool {
        use RequestState::*;
        matches!(
            (self, next),
            (Received, Allocated)
                | (Received, Failed)
                | (Allocated, Executing)
                | (Executing, Succeeded)
                | (Executing, Failed)
                | (Succeeded, Failed)
                | (Succeeded, Cleaned)
                | (Failed, Cleaned)
                | (Cleaned, Responded)
        )
    }

    /// Moves to `next`.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::InvalidTransition` if `next` cannot follow
    /// `self`.
    pub fn advance(self, next: Self) -> Result<Self, RuntimeError> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(RuntimeError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Returns `true` for the terminal state.
    pub fn is_terminal(self) -> bool {
        self == Self::Responded
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The state of one request, with transitions logged at debug level.
#[derive(Debug, Clone, Copy)]
pub struct RequestLifecycle {
    request_id: RequestId,
    state: RequestState,
}

impl RequestLifecycle {
    /// Starts a lifecycle in `Received`.
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            state: RequestState::Received,
        }
    }

    /// Current state.
    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Advances to `next`, leaving the state unchanged on error.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::InvalidTransition` for a skipped or backward
    /// step.
    pub fn advance(&mut self, next: RequestState) -> Result<(), RuntimeError> {
        self.state = self.state.advance(next)?;
        debug!(request_id = %self.request_id, state = %self.state, "request state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RequestState::*;

    #[test]
    fn success_path_is_valid() {
        let mut lc = RequestLifecycle::new(RequestId::new());
        for next in [Allocated, Executing, Succeeded, Cleaned, Responded] {
            lc.advance(next).expect("valid step");
        }
        assert!(lc.state().is_terminal());
    }

    #[test]
    fn failure_path_is_valid() {
        let mut lc = RequestLifecycle::new(RequestId::new());
        for next in [Allocated, Executing, Failed, Cleaned, Responded] {
            lc.advance(next).expect("valid step");
        }
    }

    #[test]
    fn read_failure_after_success_is_valid() {
        let mut lc = RequestLifecycle::new(RequestId::new());
        for next in [Allocated, Executing, Succeeded, Failed, Cleaned] {
            lc.advance(next).expect("valid step");
        }
    }

    #[test]
    fn cleaned_cannot_be_skipped() {
        assert!(Succeeded.advance(Responded).is_err());
        assert!(Failed.advance(Responded).is_err());
    }

    #[test]
    fn executing_cannot_be_skipped() {
        assert!(Allocated.advance(Succeeded).is_err());
    }

    #[test]
    fn invalid_step_keeps_state() {
        let mut lc = RequestLifecycle::new(RequestId::new());
        assert!(lc.advance(Cleaned).is_err());
        assert_eq!(lc.state(), Received);
    }

    #[test]
    fn responded_is_terminal() {
        for next in [Received, Allocated, Executing, Succeeded, Failed, Cleaned, Responded] {
            assert!(!Responded.can_advance_to(next));
        }
    }
}
