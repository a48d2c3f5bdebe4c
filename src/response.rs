// response.rs
// Technique outputs and the square-wave signal extraction

use crate::config::SWV_DECIMATION_BLOCK;
use crate::pulse::swv::staircase_steps;
use crate::pulse::PulseSequence;
use crate::utils::{linspace, mean};

/// Cyclic voltammogram: the full current is the signal.
#[derive(Clone, Debug)]
pub struct CvResponse {
    pub sequence: PulseSequence,
    /// A·cm⁻²; the capacitive current when no surface layer was given
    pub full_current: Vec<f64>,
    pub faradaic: bool,
}

/// Square-wave voltammogram with its net differential signal.
#[derive(Clone, Debug)]
pub struct SwvResponse {
    pub sequence: PulseSequence,
    pub full_current: Vec<f64>,
    /// Forward minus backward current, one value per potential step
    pub differential_current: Vec<f64>,
    /// Staircase potential of every step, V
    pub potential_steps: Vec<f64>,
    pub faradaic: bool,
}

/// Net square-wave signal from a full current trace.
///
/// The trace is cut into pulses of `samples_per_pulse` and the last
/// [`SWV_DECIMATION_BLOCK`] samples of every pulse are averaged. Pulses
/// alternate forward/backward; an incomplete pulse or an unpaired forward
/// pulse at the end is dropped.
pub fn swv_differential(current: &[f64], samples_per_pulse: usize) -> Vec<f64> {
    if samples_per_pulse == 0 {
        return Vec::new();
    }
    let tail = samples_per_pulse.min(SWV_DECIMATION_BLOCK);
    let pulses: Vec<f64> = current
        .chunks_exact(samples_per_pulse)
        .map(|pulse| mean(&pulse[samples_per_pulse - tail..]))
        .collect();
    pulses
        .chunks_exact(2)
        .map(|pair| pair[0] - pair[1])
        .collect()
}

/// Staircase potentials without the square-wave component.
pub fn swv_potential_steps(e_start: f64, e_end: f64, e_step: f64) -> Vec<f64> {
    linspace(e_start, e_end, staircase_steps(e_start, e_end, e_step))
}
