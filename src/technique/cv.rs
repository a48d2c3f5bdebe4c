use super::full_current;
use crate::error::SimResult;
use crate::kinetics::KineticsEngine;
use crate::pulse::CvParameters;
use crate::response::CvResponse;
use crate::surface::ActiveLayer;

pub fn run(params: &CvParameters, layer: Option<&ActiveLayer>, engine: &dyn KineticsEngine) -> SimResult<CvResponse> {
    let sequence = params.build()?;
    let full_current = full_current(&sequence, layer, engine)?;
    log::debug!(
        "CV {} -> {} V at {} V/s: {} samples",
        params.e_start,
        params.e_end,
        params.scan_rate,
        sequence.len()
    );
    Ok(CvResponse {
        sequence,
        full_current,
        faradaic: layer.is_some(),
    })
}
