//! Optional per-call execution limits.
//!
//! The engine is shared and frozen, so limits cannot be set on it per call.
//! Instead the engine's progress callback consults the limits installed on
//! the current thread by a [`LimitGuard`]. Both limits default to unbounded.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::time::{Duration, Instant};

use rhai::Dynamic;

use crate::error::SandboxError;

/// Bounds applied to one script evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionLimits {
    /// Maximum number of interpreter operations, if any.
    pub max_operations: Option<u64>,
    /// Maximum wall-clock time, if any.
    pub timeout: Option<Duration>,
}

impl ExecutionLimits {
    /// No limits at all.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Checks that configured limits are usable.
    ///
    /// # Errors
    ///
    /// Returns `SandboxError::InvalidConfig` for a zero operation budget or
    /// a zero timeout.
    pub fn validate(&self) -> Result<(), SandboxError> {
        if self.max_operations == Some(0) {
            return Err(SandboxError::InvalidConfig {
                reason: "max_operations must be greater than 0".into(),
            });
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(SandboxError::InvalidConfig {
                reason: "timeout must be greater than 0".into(),
            });
        }
        Ok(())
    }

    /// Returns `true` when neither limit is set.
    pub fn is_unbounded(&self) -> bool {
        self.max_operations.is_none() && self.timeout.is_none()
    }
}

#[derive(Debug)]
struct ActiveLimits {
    max_operations: Option<u64>,
    deadline: Option<Instant>,
    timeout: Option<Duration>,
}

thread_local! {
    static ACTIVE: RefCell<Option<ActiveLimits>> = const { RefCell::new(None) };
}

/// Installs limits for evaluations on the current thread until dropped.
///
/// Not `Send`: the guard must be dropped on the thread that created it.
#[derive(Debug)]
pub struct LimitGuard {
    _thread_bound: PhantomData<*const ()>,
}

impl LimitGuard {
    /// Installs `limits`; the timeout clock starts now.
    pub fn install(limits: &ExecutionLimits) -> Self {
        let active = ActiveLimits {
            max_operations: limits.max_operations,
            deadline: limits.timeout.map(|t| Instant::now() + t),
            timeout: limits.timeout,
        };
        ACTIVE.with(|slot| *slot.borrow_mut() = Some(active));
        Self {
            _thread_bound: PhantomData,
        }
    }
}

impl Drop for LimitGuard {
    fn drop(&mut self) {
        ACTIVE.with(|slot| *slot.borrow_mut() = None);
    }
}

/// Progress callback registered on the engine.
///
/// Returning `Some` terminates the script; the value becomes the
/// termination reason.
pub(crate) fn on_progress(operations: u64) -> Option<Dynamic> {
    ACTIVE.with(|slot| {
        let slot = slot.borrow();
        let active = slot.as_ref()?;
        if let Some(max) = active.max_operations {
            if operations > max {
                return Some(Dynamic::from(format!(
                    "operation limit of {max} exceeded"
                )));
            }
        }
        match (active.deadline, active.timeout) {
            (Some(deadline), Some(timeout)) if Instant::now() >= deadline => Some(Dynamic::from(
                format!("time limit of {}ms exceeded", timeout.as_millis()),
            )),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unbounded() {
        let limits = ExecutionLimits::default();
        assert!(limits.is_unbounded());
        assert!(limits.validate().is_ok());
    }

    #[test]
    fn zero_operations_rejected() {
        let limits = ExecutionLimits {
            max_operations: Some(0),
            ..ExecutionLimits::default()
        };
        assert!(limits.validate().is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        let limits = ExecutionLimits {
            timeout: Some(Duration::ZERO),
            ..ExecutionLimits::default()
        };
        assert!(limits.validate().is_err());
    }

    #[test]
    fn no_guard_never_terminates() {
        assert!(on_progress(u64::MAX).is_none());
    }

    #[test]
    fn guard_enforces_operation_budget() {
        let limits = ExecutionLimits {
            max_operations: Some(10),
            ..ExecutionLimits::default()
        };
        let guard = LimitGuard::install(&limits);
        assert!(on_progress(10).is_none());
        assert!(on_progress(11).is_some());
        drop(guard);
        assert!(on_progress(11).is_none());
    }

    #[test]
    fn guard_enforces_deadline() {
        let limits = ExecutionLimits {
            timeout: Some(Duration::from_millis(1)),
            ..ExecutionLimits::default()
        };
        let _guard = LimitGuard::install(&limits);
        std::thread::sleep(Duration::from_millis(5));
        let reason = on_progress(1).expect("terminated");
        assert!(reason.to_string().contains("time limit"));
    }
}
