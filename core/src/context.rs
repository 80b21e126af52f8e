//! Per-query execution context: cancellation, memory budget, and the
//! runtime-parameter snapshot.

use std::fmt;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::RuntimeParameters;
use crate::error::{Error, Result};

/// Why a query was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationReason {
    /// Explicit abort, e.g. the client went away.
    Manual,
    /// The query ran past its deadline.
    Timeout,
}

impl fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancellationReason::Manual => f.write_str("manual"),
            CancellationReason::Timeout => f.write_str("timeout"),
        }
    }
}

const NOT_CANCELLED: u8 = 0;
const CANCELLED_MANUAL: u8 = 1;
const CANCELLED_TIMEOUT: u8 = 2;

/// Shared cancellation signal. Clones observe the same state.
///
/// Evaluation code only ever polls it through [`throw_if_cancelled`]; the
/// signal itself is raised from outside (server, timeout watchdog).
///
/// [`throw_if_cancelled`]: CancellationHandle::throw_if_cancelled
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    state: Arc<AtomicU8>,
    deadline: Option<Instant>,
}

impl CancellationHandle {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(NOT_CANCELLED)),
            deadline: None,
        }
    }

    /// A handle that additionally reports a timeout once `deadline` passes.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            state: Arc::new(AtomicU8::new(NOT_CANCELLED)),
            deadline: Some(deadline),
        }
    }

    /// Raise the signal. The first reason wins.
    pub fn cancel(&self, reason: CancellationReason) {
        let code = match reason {
            CancellationReason::Manual => CANCELLED_MANUAL,
            CancellationReason::Timeout => CANCELLED_TIMEOUT,
        };
        let _ = self
            .state
            .compare_exchange(NOT_CANCELLED, code, Ordering::AcqRel, Ordering::Acquire);
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    fn reason(&self) -> Option<CancellationReason> {
        match self.state.load(Ordering::Acquire) {
            CANCELLED_MANUAL => Some(CancellationReason::Manual),
            CANCELLED_TIMEOUT => Some(CancellationReason::Timeout),
            _ => match self.deadline {
                Some(deadline) if Instant::now() >= deadline => {
                    self.cancel(CancellationReason::Timeout);
                    Some(CancellationReason::Timeout)
                }
                _ => None,
            },
        }
    }

    /// Non-blocking poll. `detail` is only evaluated when cancelled.
    pub fn throw_if_cancelled<F>(&self, detail: F) -> Result<()>
    where
        F: FnOnce() -> String,
    {
        match self.reason() {
            None => Ok(()),
            Some(reason) => {
                let detail = detail();
                tracing::debug!(%reason, %detail, "cancellation observed");
                Err(Error::Cancelled { reason, detail })
            }
        }
    }
}

impl Default for CancellationHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte budget shared by every allocation of one query.
///
/// Exhaustion is fatal: the error propagates to the query, nothing inside the
/// engine tries to recover from it.
#[derive(Debug, Clone)]
pub struct MemoryBudget {
    left: Arc<AtomicUsize>,
}

impl MemoryBudget {
    pub fn with_limit(bytes: usize) -> Self {
        Self {
            left: Arc::new(AtomicUsize::new(bytes)),
        }
    }

    pub fn unlimited() -> Self {
        Self::with_limit(usize::MAX)
    }

    pub fn available(&self) -> usize {
        self.left.load(Ordering::Acquire)
    }

    /// Reserve `bytes`; the reservation is returned to the budget on drop.
    pub fn reserve(&self, bytes: usize) -> Result<Reservation> {
        self.take(bytes)?;
        Ok(Reservation {
            budget: self.clone(),
            bytes,
        })
    }

    fn take(&self, bytes: usize) -> Result<()> {
        self.left
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| {
                left.checked_sub(bytes)
            })
            .map(|_| ())
            .map_err(|available| Error::MemoryLimit {
                requested: bytes,
                available,
            })
    }

    fn give_back(&self, bytes: usize) {
        // Saturating: an unlimited budget starts at usize::MAX.
        let _ = self
            .left
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| {
                Some(left.saturating_add(bytes))
            });
    }
}

impl Default for MemoryBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}

/// Bytes held from a [`MemoryBudget`].
#[derive(Debug)]
pub struct Reservation {
    budget: MemoryBudget,
    bytes: usize,
}

impl Reservation {
    /// Extend the reservation by `bytes`.
    pub fn grow(&mut self, bytes: usize) -> Result<()> {
        self.budget.take(bytes)?;
        self.bytes += bytes;
        Ok(())
    }

    /// Grow the reservation so that it covers at least `total` bytes.
    pub fn grow_to(&mut self, total: usize) -> Result<()> {
        if total > self.bytes {
            self.grow(total - self.bytes)?;
        }
        Ok(())
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.budget.give_back(self.bytes);
    }
}

/// Everything a running query shares with the operators it evaluates.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    cancellation: CancellationHandle,
    budget: MemoryBudget,
    parameters: RuntimeParameters,
}

impl ExecutionContext {
    /// Context with a fresh cancellation handle, no memory limit, and a
    /// snapshot of the process-wide runtime parameters.
    pub fn new() -> Self {
        Self::with_parameters(RuntimeParameters::current())
    }

    pub fn with_parameters(parameters: RuntimeParameters) -> Self {
        Self {
            cancellation: CancellationHandle::new(),
            budget: MemoryBudget::unlimited(),
            parameters,
        }
    }

    pub fn with_cancellation(mut self, cancellation: CancellationHandle) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn with_budget(mut self, budget: MemoryBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn cancellation(&self) -> &CancellationHandle {
        &self.cancellation
    }

    pub fn budget(&self) -> &MemoryBudget {
        &self.budget
    }

    pub fn parameters(&self) -> &RuntimeParameters {
        &self.parameters
    }

    /// Shorthand for polling the cancellation handle.
    pub fn check_cancellation<F>(&self, detail: F) -> Result<()>
    where
        F: FnOnce() -> String,
    {
        self.cancellation.throw_if_cancelled(detail)
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let handle = CancellationHandle::new();
        let clone = handle.clone();
        assert!(handle.throw_if_cancelled(|| "x".into()).is_ok());
        clone.cancel(CancellationReason::Manual);
        let err = handle.throw_if_cancelled(|| "stopped".into()).unwrap_err();
        assert!(err.is_cancellation());
        assert!(matches!(
            err,
            Error::Cancelled {
                reason: CancellationReason::Manual,
                ..
            }
        ));
    }

    #[test]
    fn test_first_reason_wins() {
        let handle = CancellationHandle::new();
        handle.cancel(CancellationReason::Timeout);
        handle.cancel(CancellationReason::Manual);
        assert!(matches!(
            handle.throw_if_cancelled(String::new),
            Err(Error::Cancelled {
                reason: CancellationReason::Timeout,
                ..
            })
        ));
    }

    #[test]
    fn test_deadline_reports_timeout() {
        let handle = CancellationHandle::with_deadline(Instant::now());
        assert!(handle.is_cancelled());
        assert!(matches!(
            handle.throw_if_cancelled(String::new),
            Err(Error::Cancelled {
                reason: CancellationReason::Timeout,
                ..
            })
        ));
    }

    #[test]
    fn test_budget_reserve_and_release() {
        let budget = MemoryBudget::with_limit(100);
        {
            let mut r = budget.reserve(60).unwrap();
            assert_eq!(budget.available(), 40);
            assert!(r.grow(50).is_err());
            r.grow_to(90).unwrap();
            assert_eq!(r.bytes(), 90);
            assert_eq!(budget.available(), 10);
        }
        assert_eq!(budget.available(), 100);
    }

    #[test]
    fn test_budget_exhaustion_error() {
        let budget = MemoryBudget::with_limit(8);
        match budget.reserve(9) {
            Err(Error::MemoryLimit {
                requested,
                available,
            }) => {
                assert_eq!(requested, 9);
                assert_eq!(available, 8);
            }
            other => panic!("expected memory limit error, got {:?}", other),
        }
    }

    #[test]
    fn test_unlimited_budget_does_not_overflow() {
        let budget = MemoryBudget::unlimited();
        let r = budget.reserve(1024).unwrap();
        drop(r);
        assert_eq!(budget.available(), usize::MAX);
    }
}
