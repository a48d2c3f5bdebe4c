// pulse/mod.rs
// Excitation sequences for the voltammetric techniques

pub mod cv;
pub mod dlc;
pub mod swv;

pub use cv::CvParameters;
pub use dlc::DoubleLayerCorrector;
pub use swv::SwvParameters;

/// Digitized excitation of one experiment, all arrays sharing one length.
#[derive(Clone, Debug, PartialEq)]
pub struct PulseSequence {
    /// Time of every sample, s
    pub clock: Vec<f64>,
    /// Potential applied by the potentiostat, V
    pub raw_potential: Vec<f64>,
    /// Potential after double-layer charging, V
    pub dlc_corrected_potential: Vec<f64>,
    /// Charging current, A·cm⁻²
    pub capacitive_current: Vec<f64>,
    /// Clock step between samples, s
    pub time_step: f64,
    pub resistance: f64,
}

impl PulseSequence {
    pub(crate) fn from_raw(clock: Vec<f64>, raw_potential: Vec<f64>, time_step: f64, corrector: &DoubleLayerCorrector) -> Self {
        let dlc_corrected_potential = corrector.correct(&raw_potential, time_step);
        let capacitive_current = corrector.capacitive_current(&raw_potential, &dlc_corrected_potential);
        Self {
            clock,
            raw_potential,
            dlc_corrected_potential,
            capacitive_current,
            time_step,
            resistance: corrector.resistance(),
        }
    }

    pub fn len(&self) -> usize {
        self.raw_potential.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw_potential.is_empty()
    }
}
