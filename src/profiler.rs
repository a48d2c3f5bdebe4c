use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Cumulative wall time per pipeline stage (surface build, kinetics, sweep rows).
#[derive(Default)]
pub struct Profiler {
    pub timings: HashMap<&'static str, Duration>,
    pub calls: HashMap<&'static str, u64>,
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(&mut self, guard: &ProfilerGuard) {
        let elapsed = guard.start.elapsed();
        *self.timings.entry(guard.stage).or_default() += elapsed;
        *self.calls.entry(guard.stage).or_default() += 1;
    }

    /// Stages ordered from the most to the least expensive.
    pub fn report_sorted(&self) -> Vec<(&'static str, Duration, u64)> {
        let mut v: Vec<_> = self
            .timings
            .iter()
            .map(|(stage, d)| (*stage, *d, self.calls.get(stage).copied().unwrap_or(0)))
            .collect();
        v.sort_by(|a, b| b.1.cmp(&a.1));
        v
    }

    pub fn clear(&mut self) {
        self.timings.clear();
        self.calls.clear();
    }

    pub fn log_and_clear(&mut self) {
        for (stage, total, calls) in self.report_sorted() {
            log::info!("{:<20} {:?} over {} call(s)", stage, total, calls);
        }
        self.clear();
    }
}

pub struct ProfilerGuard {
    stage: &'static str,
    start: Instant,
}

/// Start timing a stage. The guard reports to the global profiler when dropped.
pub fn start(stage: &'static str) -> ProfilerGuard {
    ProfilerGuard {
        stage,
        start: Instant::now(),
    }
}

#[cfg(feature = "profiling")]
impl Drop for ProfilerGuard {
    fn drop(&mut self) {
        crate::PROFILER.lock().finish(self);
    }
}

/// Time the enclosing scope only when the `profiling` feature is enabled.
#[macro_export]
macro_rules! profile_scope {
    ($name:expr) => {
        #[cfg(feature = "profiling")]
        let _guard = $crate::profiler::start($name);
    };
}
