use crate::error::{SimError, SimResult};

/// First-order RC charging of the electrode double layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DoubleLayerCorrector {
    resistance: f64,
    capacitance: f64,
}

impl DoubleLayerCorrector {
    pub fn new(resistance: f64, capacitance: f64) -> SimResult<Self> {
        if !(resistance.is_finite() && resistance > 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "resistance must be positive, got {resistance} Ohm"
            )));
        }
        if !(capacitance.is_finite() && capacitance > 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "capacitance must be positive, got {capacitance} F"
            )));
        }
        Ok(Self {
            resistance,
            capacitance,
        })
    }

    pub fn resistance(&self) -> f64 {
        self.resistance
    }

    pub fn capacitance(&self) -> f64 {
        self.capacitance
    }

    /// Fraction of the remaining potential gap closed within one step `dt`.
    pub fn decay_factor(&self, dt: f64) -> f64 {
        1.0 - (-dt / (self.resistance * self.capacitance)).exp()
    }

    /// Potential actually seen by the double layer.
    pub fn correct(&self, raw: &[f64], dt: f64) -> Vec<f64> {
        let decay = self.decay_factor(dt);
        let mut corrected = Vec::with_capacity(raw.len());
        let mut previous = match raw.first() {
            Some(&first) => first,
            None => return corrected,
        };
        corrected.push(previous);
        for &v in &raw[1..] {
            previous += (v - previous) * decay;
            corrected.push(previous);
        }
        corrected
    }

    /// Charging current, A·cm⁻².
    pub fn capacitive_current(&self, raw: &[f64], corrected: &[f64]) -> Vec<f64> {
        raw.iter()
            .zip(corrected)
            .map(|(r, c)| (r - c) / self.resistance)
            .collect()
    }
}
