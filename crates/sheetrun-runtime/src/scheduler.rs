//! Optional concurrency cap.
//!
//! Concurrency is unbounded by default. A non-zero `max_concurrent` puts a
//! semaphore in front of script execution.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::warn;

use crate::error::RuntimeError;

/// Scheduler configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Maximum concurrent executions; `0` means unbounded.
    pub max_concurrent: usize,
}

/// Hands out execution permits.
#[derive(Debug, Clone)]
pub struct Scheduler {
    semaphore: Option<Arc<Semaphore>>,
    max_concurrent: usize,
}

/// Held for the duration of one execution.
#[derive(Debug)]
pub struct Permit {
    _permit: Option<OwnedSemaphorePermit>,
}

impl Scheduler {
    /// Creates a scheduler from `config`.
    ///
    /// A cap above what the semaphore (and [`Scheduler::drain`]) can count
    /// is clamped.
    pub fn new(config: &SchedulerConfig) -> Self {
        let ceiling = Semaphore::MAX_PERMITS.min(u32::MAX as usize);
        let max_concurrent = config.max_concurrent.min(ceiling);
        if max_concurrent < config.max_concurrent {
            warn!(
                requested = config.max_concurrent,
                max_concurrent, "concurrency cap clamped"
            );
        }
        let semaphore = (max_concurrent > 0).then(|| Arc::new(Semaphore::new(max_concurrent)));
        Self {
            semaphore,
            max_concurrent,
        }
    }

    /// A scheduler that never waits.
    pub fn unbounded() -> Self {
        Self::new(&SchedulerConfig::default())
    }

    /// Waits for an execution slot.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::SchedulerClosed` after [`Scheduler::drain`].
    pub async fn acquire(&self) -> Result<Permit, RuntimeError> {
        let Some(semaphore) = &self.semaphore else {
            return Ok(Permit { _permit: None });
        };
        let permit = Arc::clone(semaphore)
            .acquire_owned()
            .await
            .map_err(|_| RuntimeError::SchedulerClosed)?;
        Ok(Permit {
            _permit: Some(permit),
        })
    }

    /// Waits for in-flight executions to finish, then refuses new ones.
    pub async fn drain(&self) {
        let Some(semaphore) = &self.semaphore else {
            return;
        };
        let all = u32::try_from(self.max_concurrent).unwrap_or(u32::MAX);
        if let Ok(permits) = semaphore.acquire_many(all).await {
            permits.forget();
        }
        semaphore.close();
    }

    /// Free slots, or `None` when unbounded.
    pub fn available_permits(&self) -> Option<usize> {
        self.semaphore.as_ref().map(|s| s.available_permits())
    }

    /// The configured cap, or `None` when unbounded.
    pub fn max_concurrent(&self) -> Option<usize> {
        self.semaphore.as_ref().map(|_| self.max_concurrent)
    }
}
