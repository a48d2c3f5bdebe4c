use serde::{Deserialize, Serialize};

use super::{DoubleLayerCorrector, PulseSequence};
use crate::config::CV_DEFAULT_RESOLUTION;
use crate::error::{SimError, SimResult};

fn default_resolution() -> usize {
    CV_DEFAULT_RESOLUTION
}

/// Triangular potential sweep: `e_start` to `e_end` and back.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CvParameters {
    pub e_start: f64,
    pub e_end: f64,
    /// V/s
    pub scan_rate: f64,
    /// Points per volt
    #[serde(default = "default_resolution")]
    pub resolution: usize,
    pub resistance: f64,
    pub capacitance: f64,
}

impl CvParameters {
    pub fn validate(&self) -> SimResult<()> {
        if !self.e_start.is_finite() || !self.e_end.is_finite() || self.e_start == self.e_end {
            return Err(SimError::InvalidParameter(format!(
                "CV needs two distinct finite vertex potentials, got {} and {}",
                self.e_start, self.e_end
            )));
        }
        if !(self.scan_rate.is_finite() && self.scan_rate > 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "scan rate must be positive, got {} V/s",
                self.scan_rate
            )));
        }
        if self.resolution == 0 {
            return Err(SimError::InvalidParameter("CV resolution must be at least 1 point/V".into()));
        }
        Ok(())
    }

    /// Number of potential increments across the whole sweep.
    fn increments(&self) -> usize {
        (2.0 * (self.e_start - self.e_end).abs() * self.resolution as f64).round() as usize
    }

    pub fn sequence_length(&self) -> usize {
        self.increments() + 1
    }

    /// Seconds between two samples.
    pub fn time_step(&self) -> f64 {
        1.0 / (self.scan_rate * self.resolution as f64)
    }

    pub fn build(&self) -> SimResult<PulseSequence> {
        self.validate()?;
        let corrector = DoubleLayerCorrector::new(self.resistance, self.capacitance)?;

        let n = self.increments();
        let turn = (n + 1) / 2;
        let increment = 1.0 / self.resolution as f64;
        let direction = if self.e_end > self.e_start { 1.0 } else { -1.0 };
        let span = (self.e_end - self.e_start).abs();
        let mut raw: Vec<f64> = (0..=n)
            .map(|i| {
                let steps = if i <= turn { i } else { 2 * turn - i };
                // an odd increment count would otherwise overshoot the vertex
                self.e_start + direction * (steps as f64 * increment).min(span)
            })
            .collect();
        if let Some(last) = raw.last_mut() {
            *last = self.e_start;
        }

        let dt = self.time_step();
        let clock = (0..=n).map(|i| i as f64 * dt).collect();
        Ok(PulseSequence::from_raw(clock, raw, dt, &corrector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn params(e_start: f64, e_end: f64, resolution: usize) -> CvParameters {
        CvParameters {
            e_start,
            e_end,
            scan_rate: 0.1,
            resolution,
            resistance: 10.0,
            capacitance: 1e-4,
        }
    }

    #[test]
    fn reference_sweep_length() {
        let seq = params(0.5, -0.3, 50_000).build().unwrap();
        assert_eq!(seq.len(), 80_001);
        assert_eq!(seq.clock.len(), 80_001);
        assert_eq!(seq.dlc_corrected_potential.len(), 80_001);
        assert_eq!(seq.capacitive_current.len(), 80_001);
        assert_eq!(seq.raw_potential[0], 0.5);
        assert!((seq.raw_potential[40_000] + 0.3).abs() < 1e-9);
        assert!((seq.raw_potential[80_000] - 0.5).abs() < 1e-9);
        assert!((seq.clock[1] - 1.0 / 5000.0).abs() < 1e-15);
    }

    #[test]
    fn random_sweeps_have_the_rounded_length() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let e_start: f64 = rng.random_range(-1.0..1.0);
            let e_end: f64 = rng.random_range(-1.0..1.0);
            if (e_start - e_end).abs() < 1e-3 {
                continue;
            }
            let resolution = rng.random_range(100..5_000);
            let p = params(e_start, e_end, resolution);
            let seq = p.build().unwrap();
            let expected = (2.0 * (e_start - e_end).abs() * resolution as f64).round() as usize + 1;
            assert_eq!(seq.len(), expected);
            assert_eq!(p.sequence_length(), expected);
            assert_eq!(seq.raw_potential[0], e_start);
        }
    }

    #[test]
    fn sweep_turns_at_the_vertex() {
        let seq = params(-0.2, 0.2, 10).build().unwrap();
        assert_eq!(seq.len(), 9);
        let peak = seq.raw_potential.iter().cloned().fold(f64::MIN, f64::max);
        assert!((peak - 0.2).abs() < 1e-12);
        assert!((seq.raw_potential[8] + 0.2).abs() < 1e-12);
    }

    #[test]
    fn odd_increment_count_stays_within_the_window() {
        let seq = params(0.0, 0.3, 5).build().unwrap();
        assert_eq!(seq.len(), 4);
        assert_eq!(seq.raw_potential[1], 0.2);
        assert_eq!(seq.raw_potential[2], 0.3);
        assert_eq!(seq.raw_potential[3], 0.0);
        assert!(seq.raw_potential.iter().all(|v| (0.0..=0.3).contains(v)));
    }

    #[test]
    fn invalid_scan_is_rejected() {
        let mut p = params(0.5, -0.3, 1000);
        p.scan_rate = 0.0;
        assert!(matches!(p.build(), Err(SimError::InvalidParameter(_))));
        assert!(params(0.1, 0.1, 1000).build().is_err());
        let mut p = params(0.5, -0.3, 1000);
        p.resistance = -1.0;
        assert!(p.build().is_err());
    }
}
