// surface/mod.rs
// Statistical model of the electrochemically active surface layer

pub mod component;
mod compress;

#[cfg(test)]
mod tests;

pub use component::{ComponentConfig, DistributionShape, RedoxComponent};
pub use compress::{CompressedSurface, RedoxSite};

use ndarray::Array2;

use crate::config::{DEFAULT_LOADING_CUTOFF, DEFAULT_SUPERSAMPLE, MIN_AXIS_RESOLUTION};
use crate::error::{SimError, SimResult};
use crate::observe::{default_observer, Severity, SharedObserver, SimEvent, SimObserver};
use crate::profile_scope;
use crate::utils::{linspace, trapezoid};
use component::Density;

/// Components sharing one symmetry coefficient and electron count.
///
/// All grids are indexed `[potential node, log-rate node]`.
#[derive(Clone, Debug)]
pub struct ComponentGroup {
    /// Loading per (E0, log k0) cell, mol/cm²
    pub loading: Array2<f64>,
    pub symmetry: Array2<f64>,
    pub electrons: Array2<f64>,
    a: f64,
    z: u32,
}

impl ComponentGroup {
    fn new(loading: Array2<f64>, a: f64, z: u32) -> Self {
        let dim = loading.raw_dim();
        Self {
            symmetry: Array2::from_elem(dim, a),
            electrons: Array2::from_elem(dim, z as f64),
            loading,
            a,
            z,
        }
    }

    fn accepts(&self, component: &RedoxComponent) -> bool {
        self.a == component.a && self.z == component.z
    }

    pub fn mean_symmetry(&self) -> f64 {
        self.symmetry.mean().unwrap_or(self.a)
    }

    pub fn mean_electrons(&self) -> f64 {
        self.electrons.mean().unwrap_or(self.z as f64)
    }

    pub fn total_loading(&self) -> f64 {
        self.loading.sum()
    }
}

/// Potential and log-rate axes with the grouped loading grids built on them.
#[derive(Clone, Debug)]
pub struct SurfaceDistribution {
    pub e_axis: Vec<f64>,
    pub log_k_axis: Vec<f64>,
    pub groups: Vec<ComponentGroup>,
    /// Set when either pair of bounds arrived in descending order.
    pub bounds_reordered: bool,
}

impl SurfaceDistribution {
    pub fn build(
        e_axis_resolution: usize,
        e_bounds: (f64, f64),
        log_k_axis_resolution: usize,
        log_k_bounds: (f64, f64),
        components: &[RedoxComponent],
    ) -> SimResult<Self> {
        Self::build_with(
            e_axis_resolution,
            e_bounds,
            log_k_axis_resolution,
            log_k_bounds,
            components,
            DEFAULT_SUPERSAMPLE,
            default_observer().as_ref(),
        )
    }

    /// Build with an explicit supersample factor and diagnostics sink.
    pub fn build_with(
        e_axis_resolution: usize,
        e_bounds: (f64, f64),
        log_k_axis_resolution: usize,
        log_k_bounds: (f64, f64),
        components: &[RedoxComponent],
        supersample: usize,
        observer: &dyn SimObserver,
    ) -> SimResult<Self> {
        profile_scope!("surface_build");
        if supersample < 2 {
            return Err(SimError::InvalidBounds(format!(
                "supersample factor must be at least 2, got {supersample}"
            )));
        }
        let (e_lo, e_hi, e_swapped) = order_bounds("potential", e_axis_resolution, e_bounds)?;
        let (k_lo, k_hi, k_swapped) = order_bounds("log-rate", log_k_axis_resolution, log_k_bounds)?;
        if e_swapped || k_swapped {
            observer.record(&SimEvent::new(
                Severity::Warning,
                format!(
                    "axis bounds given in descending order were reordered: E {:?} -> ({e_lo}, {e_hi}), log k {:?} -> ({k_lo}, {k_hi})",
                    e_bounds, log_k_bounds
                ),
            ));
        }

        let e_axis = linspace(e_lo, e_hi, e_axis_resolution);
        let log_k_axis = linspace(k_lo, k_hi, log_k_axis_resolution);

        let mut groups: Vec<ComponentGroup> = Vec::new();
        for (index, component) in components.iter().enumerate() {
            component.validate(index)?;
            let e_density = Density::new(component.shape, component.e0, component.sigma_e0, index)?;
            let k_density = Density::new(
                DistributionShape::Normal,
                component.log_k0,
                component.sigma_log_k0,
                index,
            )?;

            let e_masses = node_masses(&e_axis, &e_density, supersample);
            let k_masses = node_masses(&log_k_axis, &k_density, supersample);
            let loading = Array2::from_shape_fn((e_axis.len(), log_k_axis.len()), |(i, j)| {
                component.g0 * e_masses[i] * k_masses[j]
            });

            let last_index = groups.len().saturating_sub(1);
            match groups.last_mut() {
                Some(last) if last.accepts(component) => {
                    last.loading += &loading;
                    observer.record(&SimEvent::new(
                        Severity::Debug,
                        format!("component {index} merged into group {last_index}"),
                    ));
                }
                _ => groups.push(ComponentGroup::new(loading, component.a, component.z)),
            }
        }

        Ok(Self {
            e_axis,
            log_k_axis,
            groups,
            bounds_reordered: e_swapped || k_swapped,
        })
    }

    /// Equilibrium potential of every grid cell (constant along each row).
    pub fn potential_grid(&self) -> Array2<f64> {
        let e = &self.e_axis;
        Array2::from_shape_fn((e.len(), self.log_k_axis.len()), |(i, _)| e[i])
    }

    /// log10 k0 of every grid cell (constant along each column).
    pub fn log_rate_grid(&self) -> Array2<f64> {
        let k = &self.log_k_axis;
        Array2::from_shape_fn((self.e_axis.len(), k.len()), |(_, j)| k[j])
    }

    pub fn total_loading(&self) -> f64 {
        self.groups.iter().map(ComponentGroup::total_loading).sum()
    }

    pub fn compress(&self, cutoff: f64) -> SimResult<CompressedSurface> {
        compress::compress(self, cutoff, default_observer().as_ref())
    }

    pub fn compress_observed(&self, cutoff: f64, observer: &dyn SimObserver) -> SimResult<CompressedSurface> {
        compress::compress(self, cutoff, observer)
    }
}

fn order_bounds(axis: &str, resolution: usize, bounds: (f64, f64)) -> SimResult<(f64, f64, bool)> {
    if resolution < MIN_AXIS_RESOLUTION {
        return Err(SimError::InvalidBounds(format!(
            "{axis} axis resolution must be at least {MIN_AXIS_RESOLUTION}, got {resolution}"
        )));
    }
    let (a, b) = bounds;
    if !a.is_finite() || !b.is_finite() || a == b {
        return Err(SimError::InvalidBounds(format!(
            "{axis} bounds must be two distinct finite values, got ({a}, {b})"
        )));
    }
    Ok((a.min(b), a.max(b), a > b))
}

/// Probability mass around every axis node.
///
/// The axis is widened by half a spacing on both ends and resampled
/// `supersample` times per node; each consecutive chunk is integrated with
/// the trapezoid rule.
fn node_masses(axis: &[f64], density: &Density, supersample: usize) -> Vec<f64> {
    let n = axis.len();
    let lo = (3.0 * axis[0] - axis[1]) / 2.0;
    let hi = (3.0 * axis[n - 1] - axis[n - 2]) / 2.0;
    let wide = linspace(lo, hi, n * supersample);
    let mut pdf = vec![0.0; supersample];
    wide.chunks_exact(supersample)
        .map(|x| {
            for (p, &v) in pdf.iter_mut().zip(x) {
                *p = density.pdf(v);
            }
            trapezoid(&pdf, x)
        })
        .collect()
}

/// Axis layout and components of a surface layer.
#[derive(Clone, Debug)]
pub struct LayerDefinition {
    pub e_axis_resolution: usize,
    pub e_bounds: (f64, f64),
    pub log_k_axis_resolution: usize,
    pub log_k_bounds: (f64, f64),
    pub components: Vec<RedoxComponent>,
}

/// Surface layer ready for the kinetics engine. Immutable once built.
#[derive(Clone, Debug)]
pub struct ActiveLayer {
    distribution: SurfaceDistribution,
    compressed: CompressedSurface,
    loading_cutoff: f64,
}

impl ActiveLayer {
    pub fn new(definition: &LayerDefinition, loading_cutoff: f64) -> SimResult<Self> {
        Self::with_observer(definition, loading_cutoff, default_observer())
    }

    pub fn with_default_cutoff(definition: &LayerDefinition) -> SimResult<Self> {
        Self::new(definition, DEFAULT_LOADING_CUTOFF)
    }

    pub fn with_observer(
        definition: &LayerDefinition,
        loading_cutoff: f64,
        observer: SharedObserver,
    ) -> SimResult<Self> {
        let distribution = SurfaceDistribution::build_with(
            definition.e_axis_resolution,
            definition.e_bounds,
            definition.log_k_axis_resolution,
            definition.log_k_bounds,
            &definition.components,
            DEFAULT_SUPERSAMPLE,
            observer.as_ref(),
        )?;
        let compressed = distribution.compress_observed(loading_cutoff, observer.as_ref())?;
        Ok(Self {
            distribution,
            compressed,
            loading_cutoff,
        })
    }

    pub fn distribution(&self) -> &SurfaceDistribution {
        &self.distribution
    }

    pub fn compressed(&self) -> &CompressedSurface {
        &self.compressed
    }

    pub fn loading_cutoff(&self) -> f64 {
        self.loading_cutoff
    }

    pub fn e_axis(&self) -> &[f64] {
        &self.distribution.e_axis
    }

    pub fn log_k_axis(&self) -> &[f64] {
        &self.distribution.log_k_axis
    }

    pub fn groups(&self) -> &[ComponentGroup] {
        &self.distribution.groups
    }

    /// Loading passed on to the kinetics engine, mol/cm².
    pub fn total_loading(&self) -> f64 {
        self.compressed.total_loading()
    }
}
