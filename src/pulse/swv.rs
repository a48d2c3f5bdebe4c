use serde::{Deserialize, Serialize};

use super::{DoubleLayerCorrector, PulseSequence};
use crate::config::SWV_DEFAULT_RESOLUTION;
use crate::error::{SimError, SimResult};

fn default_resolution() -> usize {
    SWV_DEFAULT_RESOLUTION
}

/// Staircase levels from `e_start` to `e_end`, both included.
///
/// A span that is a whole number of steps up to rounding error counts as
/// exact; otherwise the last partial step is dropped.
pub fn staircase_steps(e_start: f64, e_end: f64, e_step: f64) -> usize {
    let ratio = (e_end - e_start) / e_step;
    if !ratio.is_finite() || ratio < 0.0 {
        return 0;
    }
    let nearest = ratio.round();
    let whole = if (ratio - nearest).abs() < 1e-9 { nearest } else { ratio.floor() };
    whole as usize + 1
}

/// Staircase with a superimposed square wave.
///
/// Every potential step lasts one forward and one backward pulse of
/// `resolution` samples each.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SwvParameters {
    pub e_start: f64,
    pub e_end: f64,
    /// Signed staircase increment, V
    pub e_step: f64,
    /// Square-wave amplitude, V
    pub amplitude: f64,
    /// log10 of the square-wave frequency, Hz
    pub log_freq: f64,
    pub resistance: f64,
    pub capacitance: f64,
    /// Samples per pulse
    #[serde(default = "default_resolution")]
    pub resolution: usize,
}

impl SwvParameters {
    /// Copy of these parameters at another frequency.
    pub fn with_log_freq(&self, log_freq: f64) -> Self {
        Self { log_freq, ..*self }
    }

    /// The step must point from `e_start` towards `e_end`.
    pub fn check_direction(&self) -> SimResult<()> {
        let span = self.e_end - self.e_start;
        if self.e_step == 0.0 || span * self.e_step < 0.0 || !self.e_step.is_finite() {
            return Err(SimError::InvalidScanDirection {
                e_start: self.e_start,
                e_end: self.e_end,
                e_step: self.e_step,
            });
        }
        Ok(())
    }

    pub fn validate(&self) -> SimResult<()> {
        for (name, value) in [
            ("e_start", self.e_start),
            ("e_end", self.e_end),
            ("amplitude", self.amplitude),
            ("log_freq", self.log_freq),
        ] {
            if !value.is_finite() {
                return Err(SimError::InvalidParameter(format!("{name} must be finite, got {value}")));
            }
        }
        self.check_direction()?;
        if self.resolution == 0 {
            return Err(SimError::InvalidParameter("SWV resolution must be at least 1 sample per pulse".into()));
        }
        Ok(())
    }

    /// Duration of one half-cycle, s.
    pub fn pulse_time(&self) -> f64 {
        1.0 / (2.0 * 10f64.powf(self.log_freq))
    }

    /// Seconds between two samples; also the kinetics time increment.
    pub fn time_step(&self) -> f64 {
        self.pulse_time() / self.resolution as f64
    }

    pub fn step_count(&self) -> usize {
        staircase_steps(self.e_start, self.e_end, self.e_step)
    }

    /// One forward and one backward pulse per staircase level.
    pub fn sequence_length(&self) -> usize {
        2 * self.resolution * self.step_count()
    }

    /// Square wave plus staircase, before any charging correction.
    pub fn raw_sequence(&self) -> SimResult<Vec<f64>> {
        self.validate()?;
        let npp = self.resolution;
        let mut flag: f64 = if self.e_step < 0.0 { 1.0 } else { -1.0 };
        let mut stair = self.e_start - self.e_step;
        let raw = (0..self.sequence_length())
            .map(|i| {
                if i % npp == 0 {
                    flag = -flag;
                }
                if i % (2 * npp) == 0 {
                    stair += self.e_step;
                }
                self.amplitude * flag + stair
            })
            .collect();
        Ok(raw)
    }

    pub fn build(&self) -> SimResult<PulseSequence> {
        let raw = self.raw_sequence()?;
        let corrector = DoubleLayerCorrector::new(self.resistance, self.capacitance)?;
        let dt = self.time_step();
        let mut t = 0.0;
        let clock = raw
            .iter()
            .map(|_| {
                let now = t;
                t += dt;
                now
            })
            .collect();
        Ok(PulseSequence::from_raw(clock, raw, dt, &corrector))
    }
}
