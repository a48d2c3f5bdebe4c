// technique/mod.rs
// Pipelines: pulse sequence -> kinetics engine -> signal extraction

pub mod cv;
pub mod swv;
pub mod vfswv;


pub use vfswv::{FrequencySweep, SweepOptions, VfSwvParameters, VfSwvResult};

use crate::error::SimResult;
use crate::kinetics::{KineticsEngine, KineticsInput};
use crate::pulse::PulseSequence;
use crate::surface::ActiveLayer;

/// Current response of a sequence. Without a surface layer the engine is
/// skipped and the capacitive current stands in for the full response.
pub fn full_current(
    sequence: &PulseSequence,
    layer: Option<&ActiveLayer>,
    engine: &dyn KineticsEngine,
) -> SimResult<Vec<f64>> {
    match layer {
        Some(layer) => engine.full_response(&KineticsInput::new(sequence, layer.compressed())),
        None => Ok(sequence.capacitive_current.clone()),
    }
}
