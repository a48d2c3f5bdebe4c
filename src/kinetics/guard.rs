use crossbeam::channel::{bounded, RecvTimeoutError};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::{KineticsEngine, KineticsInput};
use crate::error::{SimError, SimResult};

/// Shared flag a caller raises to stop a long sweep between rows.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> SimResult<()> {
        if self.is_cancelled() {
            Err(SimError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// At most one call at a time into a non-reentrant engine.
#[derive(Default)]
struct CallGate {
    busy: Mutex<bool>,
    idle: Condvar,
}

impl CallGate {
    /// Wait until the engine is idle or `deadline` passes.
    fn acquire(self: &Arc<Self>, deadline: Instant) -> Option<GatePass> {
        let mut busy = self.busy.lock();
        while *busy {
            if self.idle.wait_until(&mut busy, deadline).timed_out() {
                break;
            }
        }
        if *busy {
            return None;
        }
        *busy = true;
        Some(GatePass(Arc::clone(self)))
    }
}

/// Releases the gate when the engine call finishes, even on panic.
struct GatePass(Arc<CallGate>);

impl Drop for GatePass {
    fn drop(&mut self) {
        *self.0.busy.lock() = false;
        self.0.idle.notify_one();
    }
}

/// Runs every call of the wrapped engine on a worker thread and gives up
/// after `timeout`.
///
/// A call that times out keeps running in the background until the engine
/// returns; its result is discarded. A non-reentrant engine is never entered
/// twice: while an abandoned call is still running, new calls wait for it
/// within their own timeout and fail with `EngineTimeout` if it does not end.
pub struct TimedEngine {
    inner: Arc<dyn KineticsEngine>,
    timeout: Duration,
    name: String,
    gate: Option<Arc<CallGate>>,
}

impl TimedEngine {
    pub fn new(inner: Arc<dyn KineticsEngine>, timeout: Duration) -> Self {
        let name = format!("{} (timeout {} ms)", inner.name(), timeout.as_millis());
        let gate = (!inner.is_reentrant()).then(|| Arc::new(CallGate::default()));
        Self {
            inner,
            timeout,
            name,
            gate,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn timed_out(&self, reason: &str) -> SimError {
        log::warn!("{} gave up {reason}", self.name);
        SimError::EngineTimeout {
            timeout_ms: self.timeout.as_millis() as u64,
        }
    }
}

impl KineticsEngine for TimedEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn full_response(&self, input: &KineticsInput<'_>) -> SimResult<Vec<f64>> {
        input.validate()?;
        let deadline = Instant::now() + self.timeout;
        let pass = match &self.gate {
            Some(gate) => match gate.acquire(deadline) {
                Some(pass) => Some(pass),
                None => return Err(self.timed_out("waiting for a previous call to finish")),
            },
            None => None,
        };

        let request = input.to_request();
        let engine = Arc::clone(&self.inner);
        let (tx, rx) = bounded(1);
        thread::Builder::new()
            .name("kinetics-call".into())
            .spawn(move || {
                let _pass = pass;
                let result = engine.full_response(&request.as_input());
                // receiver is gone after a timeout
                let _ = tx.send(result);
            })?;

        match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(self.timed_out("waiting for the kinetics engine")),
            Err(RecvTimeoutError::Disconnected) => Err(SimError::NativeEngineFailure(format!(
                "{} worker exited without a result",
                self.inner.name()
            ))),
        }
    }

    fn is_reentrant(&self) -> bool {
        self.inner.is_reentrant()
    }
}
