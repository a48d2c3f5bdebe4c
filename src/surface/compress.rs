use super::SurfaceDistribution;
use crate::error::{SimError, SimResult};
use crate::observe::{Severity, SimEvent, SimObserver};

/// One entry of a [`CompressedSurface`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RedoxSite {
    pub e0: f64,
    pub k0: f64,
    pub g: f64,
    pub a: f64,
    pub z: f64,
}

/// Flat per-site arrays handed to the kinetics engine.
///
/// Sites appear group by group, each group flattened row-major
/// (potential node outer, log-rate node inner).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompressedSurface {
    /// Equilibrium potential, V
    pub e0: Vec<f64>,
    /// Standard rate constant, s⁻¹ (linear)
    pub k0: Vec<f64>,
    /// Loading, mol/cm²
    pub g: Vec<f64>,
    pub a: Vec<f64>,
    pub z: Vec<f64>,
}

impl CompressedSurface {
    pub fn from_arrays(e0: Vec<f64>, k0: Vec<f64>, g: Vec<f64>, a: Vec<f64>, z: Vec<f64>) -> SimResult<Self> {
        let surface = Self { e0, k0, g, a, z };
        surface.validate()?;
        Ok(surface)
    }

    pub fn len(&self) -> usize {
        self.g.len()
    }

    pub fn is_empty(&self) -> bool {
        self.g.is_empty()
    }

    /// All five arrays must have one entry per site.
    pub fn validate(&self) -> SimResult<()> {
        let expected = self.g.len();
        for (array, actual) in [
            ("e0", self.e0.len()),
            ("k0", self.k0.len()),
            ("a", self.a.len()),
            ("z", self.z.len()),
        ] {
            if actual != expected {
                return Err(SimError::ArraySizeMismatch {
                    array,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    pub fn total_loading(&self) -> f64 {
        self.g.iter().sum()
    }

    pub fn sites(&self) -> impl Iterator<Item = RedoxSite> + '_ {
        (0..self.len()).map(move |i| RedoxSite {
            e0: self.e0[i],
            k0: self.k0[i],
            g: self.g[i],
            a: self.a[i],
            z: self.z[i],
        })
    }

    fn push(&mut self, e0: f64, log_k0: f64, g: f64, a: f64, z: f64) {
        self.e0.push(e0);
        self.k0.push(10f64.powf(log_k0));
        self.g.push(g);
        self.a.push(a);
        self.z.push(z);
    }
}

/// Flatten every group and keep the cells whose loading is at least `cutoff`.
pub(super) fn compress(
    surface: &SurfaceDistribution,
    cutoff: f64,
    observer: &dyn SimObserver,
) -> SimResult<CompressedSurface> {
    if !cutoff.is_finite() || cutoff < 0.0 {
        return Err(SimError::InvalidParameter(format!(
            "loading cutoff must be a non-negative number, got {cutoff}"
        )));
    }

    let mut out = CompressedSurface::default();
    let mut original_size = 0usize;
    let mut original_loading = 0.0;
    for group in &surface.groups {
        for ((i, j), &g) in group.loading.indexed_iter() {
            original_size += 1;
            original_loading += g;
            if g < cutoff {
                continue;
            }
            out.push(
                surface.e_axis[i],
                surface.log_k_axis[j],
                g,
                group.symmetry[[i, j]],
                group.electrons[[i, j]],
            );
        }
    }

    let passed = out.total_loading();
    let size_reduction = if original_size == 0 {
        0.0
    } else {
        100.0 * (1.0 - out.len() as f64 / original_size as f64)
    };
    let loading_loss = if original_loading > 0.0 {
        100.0 * (1.0 - passed / original_loading)
    } else {
        0.0
    };

    observer.record(&SimEvent::metric(
        Severity::Info,
        format!("matrix size reduced by {size_reduction:.0}% ({} of {original_size} sites kept)", out.len()),
        "matrix_size_reduction_pct",
        size_reduction,
    ));
    observer.record(&SimEvent::metric(
        Severity::Info,
        format!("loading lost to size reduction {loading_loss:.3}%"),
        "loading_loss_pct",
        loading_loss,
    ));
    observer.record(&SimEvent::metric(
        Severity::Info,
        format!("surface loading passed to computation {passed:e} mol/cm²"),
        "loading_passed_mol_cm2",
        passed,
    ));

    Ok(out)
}
