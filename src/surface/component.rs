// surface/component.rs
// Redox component description and its distribution shape

use serde::{Deserialize, Serialize};
use statrs::distribution::{Cauchy, Continuous, Normal};

use crate::error::{SimError, SimResult};

/// Statistical shape of a component across the potential axis.
/// The log-rate axis always uses a normal density.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistributionShape {
    Normal,
    /// Cauchy density
    Lorentz,
}

impl DistributionShape {
    pub fn parse(name: &str, component: usize) -> SimResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(DistributionShape::Normal),
            "lorentz" | "cauchy" => Ok(DistributionShape::Lorentz),
            other => Err(SimError::InvalidDistribution {
                component,
                reason: format!("unknown distribution shape '{other}', expected 'normal' or 'lorentz'"),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionShape::Normal => "normal",
            DistributionShape::Lorentz => "lorentz",
        }
    }
}

/// Probability density with a fixed centre and scale.
pub(crate) enum Density {
    Normal(Normal),
    Cauchy(Cauchy),
}

impl Density {
    pub(crate) fn new(shape: DistributionShape, center: f64, scale: f64, component: usize) -> SimResult<Self> {
        match shape {
            DistributionShape::Normal => Normal::new(center, scale)
                .map(Density::Normal)
                .map_err(|e| rejected(component, center, scale, e)),
            DistributionShape::Lorentz => Cauchy::new(center, scale)
                .map(Density::Cauchy)
                .map_err(|e| rejected(component, center, scale, e)),
        }
    }

    pub(crate) fn pdf(&self, x: f64) -> f64 {
        match self {
            Density::Normal(d) => d.pdf(x),
            Density::Cauchy(d) => d.pdf(x),
        }
    }
}

fn rejected(component: usize, center: f64, scale: f64, err: impl std::fmt::Display) -> SimError {
    SimError::InvalidDistribution {
        component,
        reason: format!("centre {center} / spread {scale}: {err}"),
    }
}

/// One redox couple on the electrode surface, described statistically.
#[derive(Clone, Debug, PartialEq)]
pub struct RedoxComponent {
    pub shape: DistributionShape,
    /// Surface loading, mol/cm²
    pub g0: f64,
    /// Most likely equilibrium potential, V
    pub e0: f64,
    pub sigma_e0: f64,
    /// log10 of the standard rate constant (s⁻¹)
    pub log_k0: f64,
    pub sigma_log_k0: f64,
    /// Butler-Volmer symmetry coefficient, strictly between 0 and 1
    pub a: f64,
    /// Electrons transferred per reaction
    pub z: u32,
}

impl RedoxComponent {
    pub fn validate(&self, component: usize) -> SimResult<()> {
        let fail = |reason: String| Err(SimError::InvalidDistribution { component, reason });
        if !self.g0.is_finite() || self.g0 < 0.0 {
            return fail(format!("surface loading must be a non-negative number, got {}", self.g0));
        }
        if !self.e0.is_finite() || !self.log_k0.is_finite() {
            return fail("distribution centres must be finite".into());
        }
        if !(self.sigma_e0 > 0.0) || !(self.sigma_log_k0 > 0.0) {
            return fail(format!(
                "spreads must be positive, got sigma_e0={} sigma_log_k0={}",
                self.sigma_e0, self.sigma_log_k0
            ));
        }
        if !(self.a > 0.0 && self.a < 1.0) {
            return fail(format!("symmetry coefficient must lie in (0, 1), got {}", self.a));
        }
        if self.z == 0 {
            return fail("electron count must be at least 1".into());
        }
        Ok(())
    }
}

/// Serializable component record as it appears in experiment files.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComponentConfig {
    pub dist_type: String,
    pub g0: f64,
    pub e0: f64,
    pub sigma_e0: f64,
    pub log_k0: f64,
    pub sigma_log_k0: f64,
    pub a: f64,
    pub z: u32,
}

impl ComponentConfig {
    pub fn to_component(&self, index: usize) -> SimResult<RedoxComponent> {
        Ok(RedoxComponent {
            shape: DistributionShape::parse(&self.dist_type, index)?,
            g0: self.g0,
            e0: self.e0,
            sigma_e0: self.sigma_e0,
            log_k0: self.log_k0,
            sigma_log_k0: self.sigma_log_k0,
            a: self.a,
            z: self.z,
        })
    }
}

impl From<&RedoxComponent> for ComponentConfig {
    fn from(c: &RedoxComponent) -> Self {
        Self {
            dist_type: c.shape.as_str().to_string(),
            g0: c.g0,
            e0: c.e0,
            sigma_e0: c.sigma_e0,
            log_k0: c.log_k0,
            sigma_log_k0: c.sigma_log_k0,
            a: c.a,
            z: c.z,
        }
    }
}
