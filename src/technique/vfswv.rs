// technique/vfswv.rs
// Variable-frequency SWV: one square-wave voltammogram per frequency sample

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::swv;
use crate::config::{SWV_DEFAULT_RESOLUTION, VFSWV_DEFAULT_FREQUENCY_RESOLUTION};
use crate::error::{SimError, SimResult};
use crate::kinetics::{CancellationToken, KineticsEngine};
use crate::observe::{default_observer, Severity, SharedObserver, SimEvent};
use crate::profile_scope;
use crate::pulse::SwvParameters;
use crate::surface::ActiveLayer;
use crate::utils::linspace;

/// SWV parameters shared by every row of the sweep.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VfSwvParameters {
    pub e_start: f64,
    pub e_end: f64,
    pub e_step: f64,
    pub amplitude: f64,
    pub log_frequency_min: f64,
    pub log_frequency_max: f64,
    pub resistance: f64,
    pub capacitance: f64,
}

impl VfSwvParameters {
    /// Fresh single-frequency parameters; `self` is never modified.
    pub fn at_frequency(&self, log_freq: f64, pulse_resolution: usize) -> SwvParameters {
        SwvParameters {
            e_start: self.e_start,
            e_end: self.e_end,
            e_step: self.e_step,
            amplitude: self.amplitude,
            log_freq,
            resistance: self.resistance,
            capacitance: self.capacitance,
            resolution: pulse_resolution,
        }
    }

    /// Descending log-frequency axis.
    pub fn log_frequency_axis(&self, resolution: usize) -> Vec<f64> {
        linspace(self.log_frequency_max, self.log_frequency_min, resolution)
    }
}

#[derive(Clone)]
pub struct SweepOptions {
    pub frequency_domain_resolution: usize,
    pub pulse_resolution: usize,
    /// Run rows on the rayon pool when the engine allows concurrent calls.
    pub parallel: bool,
    /// Checked before every row.
    pub cancel: Option<CancellationToken>,
    pub observer: SharedObserver,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            frequency_domain_resolution: VFSWV_DEFAULT_FREQUENCY_RESOLUTION,
            pulse_resolution: SWV_DEFAULT_RESOLUTION,
            parallel: true,
            cancel: None,
            observer: default_observer(),
        }
    }
}

/// Differential current normalized by frequency, potential by frequency.
#[derive(Clone, Debug)]
pub struct VfSwvResult {
    /// `[frequency row, potential step]`, A·cm⁻²·Hz⁻¹
    pub matrix: Array2<f64>,
    pub potential_axis: Vec<f64>,
    /// Descending, log10 Hz
    pub log_frequency_axis: Vec<f64>,
}

impl VfSwvResult {
    /// Potential and log-frequency coordinates of every matrix cell.
    pub fn meshgrid(&self) -> (Array2<f64>, Array2<f64>) {
        let shape = (self.log_frequency_axis.len(), self.potential_axis.len());
        let potential = Array2::from_shape_fn(shape, |(_, j)| self.potential_axis[j]);
        let frequency = Array2::from_shape_fn(shape, |(i, _)| self.log_frequency_axis[i]);
        (potential, frequency)
    }

    /// Sign that makes the net current positive for display: cathodic scans
    /// produce negative differentials.
    pub fn display_sign(&self) -> f64 {
        match (self.potential_axis.first(), self.potential_axis.last()) {
            (Some(first), Some(last)) if first > last => -1.0,
            _ => 1.0,
        }
    }
}

struct SweepRow {
    normalized: Vec<f64>,
    potential_steps: Vec<f64>,
}

/// Drives an independent SWV pipeline for every frequency sample.
pub struct FrequencySweep<'a> {
    params: VfSwvParameters,
    options: SweepOptions,
    layer: Option<&'a ActiveLayer>,
    engine: &'a dyn KineticsEngine,
}

impl<'a> FrequencySweep<'a> {
    pub fn new(params: VfSwvParameters, layer: Option<&'a ActiveLayer>, engine: &'a dyn KineticsEngine) -> Self {
        Self {
            params,
            options: SweepOptions::default(),
            layer,
            engine,
        }
    }

    pub fn with_options(mut self, options: SweepOptions) -> Self {
        self.options = options;
        self
    }

    pub fn params(&self) -> &VfSwvParameters {
        &self.params
    }

    fn validate(&self) -> SimResult<()> {
        let p = &self.params;
        if !p.log_frequency_min.is_finite() || !p.log_frequency_max.is_finite() {
            return Err(SimError::InvalidParameter(format!(
                "log-frequency window must be finite, got [{}, {}]",
                p.log_frequency_min, p.log_frequency_max
            )));
        }
        if self.options.frequency_domain_resolution == 0 {
            return Err(SimError::InvalidParameter(
                "frequency domain resolution must be at least 1".into(),
            ));
        }
        // fail on the scan itself before any row runs
        p.at_frequency(p.log_frequency_max, self.options.pulse_resolution).validate()
    }

    fn row(&self, log_freq: f64) -> SimResult<SweepRow> {
        profile_scope!("sweep_row");
        if let Some(token) = &self.options.cancel {
            token.check()?;
        }
        let params = self.params.at_frequency(log_freq, self.options.pulse_resolution);
        let response = swv::run(&params, self.layer, self.engine)?;
        let frequency = 10f64.powf(log_freq);
        Ok(SweepRow {
            normalized: response.differential_current.iter().map(|j| j / frequency).collect(),
            potential_steps: response.potential_steps,
        })
    }

    pub fn run(&self) -> SimResult<VfSwvResult> {
        profile_scope!("frequency_sweep");
        self.validate()?;
        let observer = &self.options.observer;

        let log_frequency_axis = self.params.log_frequency_axis(self.options.frequency_domain_resolution);
        let parallel = self.options.parallel && self.engine.is_reentrant();
        if self.options.parallel && !parallel {
            observer.record(&SimEvent::new(
                Severity::Info,
                format!("engine '{}' is not reentrant; sweeping serially", self.engine.name()),
            ));
        }

        let rows: Vec<SweepRow> = if parallel {
            log_frequency_axis
                .par_iter()
                .map(|&log_f| self.row(log_f))
                .collect::<SimResult<_>>()?
        } else {
            log_frequency_axis
                .iter()
                .map(|&log_f| self.row(log_f))
                .collect::<SimResult<_>>()?
        };

        let result = assemble(rows, log_frequency_axis)?;
        observer.record(&SimEvent::new(
            Severity::Info,
            format!(
                "VF-SWV sweep finished: {} frequencies x {} potential steps",
                result.matrix.nrows(),
                result.matrix.ncols()
            ),
        ));
        Ok(result)
    }
}

fn same_axis(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
}

fn assemble(rows: Vec<SweepRow>, log_frequency_axis: Vec<f64>) -> SimResult<VfSwvResult> {
    let Some(first) = rows.first() else {
        return Err(SimError::InvalidParameter("sweep produced no rows".into()));
    };
    let potential_axis = first.potential_steps.clone();
    let width = potential_axis.len();

    let mut flat = Vec::with_capacity(rows.len() * width);
    for (index, row) in rows.iter().enumerate() {
        if !same_axis(&row.potential_steps, &potential_axis) || row.normalized.len() != width {
            return Err(SimError::FrequencyAxisMismatch { row: index });
        }
        flat.extend_from_slice(&row.normalized);
    }
    let matrix = Array2::from_shape_vec((rows.len(), width), flat)
        .map_err(|e| SimError::InvalidParameter(format!("sweep matrix: {e}")))?;

    Ok(VfSwvResult {
        matrix,
        potential_axis,
        log_frequency_axis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[f64], axis: &[f64]) -> SweepRow {
        SweepRow {
            normalized: values.to_vec(),
            potential_steps: axis.to_vec(),
        }
    }

    #[test]
    fn rows_with_a_different_axis_fail_fast() {
        let axis = [0.1, 0.0, -0.1];
        let shifted = [0.1, 0.0, -0.1000000001];
        let rows = vec![row(&[1.0, 2.0, 3.0], &axis), row(&[1.0, 2.0, 3.0], &axis), row(&[1.0, 2.0, 3.0], &shifted)];
        assert!(matches!(
            assemble(rows, vec![2.0, 1.0, 0.0]),
            Err(SimError::FrequencyAxisMismatch { row: 2 })
        ));
    }

    #[test]
    fn row_wider_than_its_axis_is_rejected() {
        let axis = [0.1, 0.0, -0.1];
        let rows = vec![row(&[1.0, 2.0, 3.0, 4.0], &axis)];
        assert!(matches!(
            assemble(rows, vec![1.0]),
            Err(SimError::FrequencyAxisMismatch { row: 0 })
        ));
    }

    #[test]
    fn matrix_is_frequency_by_potential() {
        let axis = [0.1, 0.0, -0.1];
        let rows = vec![row(&[1.0, 2.0, 3.0], &axis), row(&[4.0, 5.0, 6.0], &axis)];
        let result = assemble(rows, vec![1.0, 0.0]).unwrap();
        assert_eq!(result.matrix.dim(), (2, 3));
        assert_eq!(result.matrix[[1, 0]], 4.0);
        assert_eq!(result.display_sign(), -1.0);

        let (potential, frequency) = result.meshgrid();
        assert_eq!(potential[[1, 2]], -0.1);
        assert_eq!(frequency[[1, 2]], 0.0);
        assert_eq!(frequency[[0, 2]], 1.0);
    }
}
