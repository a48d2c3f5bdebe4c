//! Faradaic plus capacitive current for a pulse sequence.
//!
//! Every engine honours one call contract: the time increment, the cell
//! resistance, the raw and double-layer corrected potentials, and the five
//! compressed surface arrays go in; one current per sample (A·cm⁻²) comes out.

pub mod butler_volmer;
pub mod dynamic;
pub mod guard;

#[cfg(test)]
mod tests;

pub use butler_volmer::ButlerVolmerEngine;
pub use dynamic::DynamicEngine;
pub use guard::{CancellationToken, TimedEngine};

use crate::error::{SimError, SimResult};
use crate::pulse::PulseSequence;
use crate::surface::CompressedSurface;

/// Borrowed arguments of one kinetics call.
#[derive(Clone, Copy, Debug)]
pub struct KineticsInput<'a> {
    /// Time increment between samples, s
    pub time_step: f64,
    /// Ohm
    pub resistance: f64,
    pub raw: &'a [f64],
    pub corrected: &'a [f64],
    pub surface: &'a CompressedSurface,
}

impl<'a> KineticsInput<'a> {
    pub fn new(sequence: &'a PulseSequence, surface: &'a CompressedSurface) -> Self {
        Self {
            time_step: sequence.time_step,
            resistance: sequence.resistance,
            raw: &sequence.raw_potential,
            corrected: &sequence.dlc_corrected_potential,
            surface,
        }
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.corrected.len() != self.raw.len() {
            return Err(SimError::ArraySizeMismatch {
                array: "dlc_corrected_potential",
                expected: self.raw.len(),
                actual: self.corrected.len(),
            });
        }
        self.surface.validate()?;
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "kinetics time step must be positive, got {} s",
                self.time_step
            )));
        }
        if !(self.resistance.is_finite() && self.resistance > 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "kinetics resistance must be positive, got {} Ohm",
                self.resistance
            )));
        }
        Ok(())
    }

    pub fn to_request(&self) -> KineticsRequest {
        KineticsRequest {
            time_step: self.time_step,
            resistance: self.resistance,
            raw: self.raw.to_vec(),
            corrected: self.corrected.to_vec(),
            surface: self.surface.clone(),
        }
    }
}

/// Owned copy of a [`KineticsInput`] that can cross threads.
#[derive(Clone, Debug)]
pub struct KineticsRequest {
    pub time_step: f64,
    pub resistance: f64,
    pub raw: Vec<f64>,
    pub corrected: Vec<f64>,
    pub surface: CompressedSurface,
}

impl KineticsRequest {
    pub fn as_input(&self) -> KineticsInput<'_> {
        KineticsInput {
            time_step: self.time_step,
            resistance: self.resistance,
            raw: &self.raw,
            corrected: &self.corrected,
            surface: &self.surface,
        }
    }
}

pub trait KineticsEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Full current response, one value per input sample.
    fn full_response(&self, input: &KineticsInput<'_>) -> SimResult<Vec<f64>>;

    /// Whether concurrent calls on one instance are safe.
    fn is_reentrant(&self) -> bool {
        false
    }
}

/// Reject engine output that breaks the call contract.
pub(crate) fn check_output(engine: &str, expected: usize, output: &[f64]) -> SimResult<()> {
    if output.len() != expected {
        return Err(SimError::NativeEngineFailure(format!(
            "{engine} returned {} samples for a sequence of {expected}",
            output.len()
        )));
    }
    if let Some(index) = output.iter().position(|v| !v.is_finite()) {
        return Err(SimError::NativeEngineFailure(format!(
            "{engine} returned a non-finite current at sample {index}"
        )));
    }
    Ok(())
}
