pub mod config;
pub mod error;
pub mod experiment;
pub mod io;
pub mod kinetics;
pub mod observe;
pub mod profiler;
pub mod pulse;
pub mod response;
pub mod surface;
pub mod technique;
pub mod units;
pub mod utils;

pub use error::{SimError, SimResult};
pub use experiment::{ExperimentConfig, ExperimentOutcome};

#[cfg(feature = "profiling")]
use once_cell::sync::Lazy;
#[cfg(feature = "profiling")]
use parking_lot::Mutex;

#[cfg(feature = "profiling")]
pub static PROFILER: Lazy<Mutex<profiler::Profiler>> =
    Lazy::new(|| Mutex::new(profiler::Profiler::new()));
