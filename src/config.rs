// Centralized defaults for surface statistics, pulse sequences and sweeps

// ====================
// Surface Layer Statistics
// ====================
/// Supersamples per axis node used when integrating a probability density.
/// Keeps the node mass close to the true integral when the spread is close to the node spacing.
pub const DEFAULT_SUPERSAMPLE: usize = 1001;
/// Loading below which a sub-component is dropped before the kinetics call (mol/cm²).
pub const DEFAULT_LOADING_CUTOFF: f64 = 1.0e-13;
/// Smallest axis resolution that still defines a node spacing.
pub const MIN_AXIS_RESOLUTION: usize = 2;

// ====================
// Cyclic Voltammetry
// ====================
/// Default CV digital resolution, points per volt.
pub const CV_DEFAULT_RESOLUTION: usize = 50_000;

// ====================
// Square-Wave Voltammetry
// ====================
/// Default number of samples across one SWV pulse.
pub const SWV_DEFAULT_RESOLUTION: usize = 100;
/// Samples closing each SWV pulse that are averaged into its current.
pub const SWV_DECIMATION_BLOCK: usize = 10;

// ====================
// Variable-Frequency SWV
// ====================
/// Default number of frequency samples across the log-frequency window.
pub const VFSWV_DEFAULT_FREQUENCY_RESOLUTION: usize = 61;

// ====================
// Kinetics Engine
// ====================
/// Symbol exported by external kinetics libraries.
pub const KINETICS_SYMBOL: &str = "redoxKineticsFull";
/// Half-life benchmark of the native engine, in multiples of the time increment.
pub const HALF_LIFE_BENCHMARK_STEPS: f64 = 10.0;
/// Sub-loadings per nmol/cm² of a redox site in the native engine.
pub const SUBLOADINGS_PER_NMOL: f64 = 20.0;
