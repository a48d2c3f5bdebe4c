use super::full_current;
use crate::error::{SimError, SimResult};
use crate::kinetics::KineticsEngine;
use crate::pulse::SwvParameters;
use crate::response::{swv_differential, swv_potential_steps, SwvResponse};
use crate::surface::ActiveLayer;

/// One square-wave voltammogram. Holds no state between calls.
pub fn run(params: &SwvParameters, layer: Option<&ActiveLayer>, engine: &dyn KineticsEngine) -> SimResult<SwvResponse> {
    let sequence = params.build()?;
    let full_current = full_current(&sequence, layer, engine)?;
    let differential_current = swv_differential(&full_current, params.resolution);
    let potential_steps = swv_potential_steps(params.e_start, params.e_end, params.e_step);
    if differential_current.len() != potential_steps.len() {
        return Err(SimError::ArraySizeMismatch {
            array: "differential_current",
            expected: potential_steps.len(),
            actual: differential_current.len(),
        });
    }
    Ok(SwvResponse {
        sequence,
        full_current,
        differential_current,
        potential_steps,
        faradaic: layer.is_some(),
    })
}
