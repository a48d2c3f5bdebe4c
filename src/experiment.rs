// experiment.rs
// Loading and running a complete simulation request from an experiment TOML file

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{DEFAULT_LOADING_CUTOFF, KINETICS_SYMBOL, SWV_DEFAULT_RESOLUTION, VFSWV_DEFAULT_FREQUENCY_RESOLUTION};
use crate::error::SimResult;
use crate::kinetics::{ButlerVolmerEngine, DynamicEngine, KineticsEngine, TimedEngine};
use crate::observe::SharedObserver;
use crate::pulse::{CvParameters, SwvParameters};
use crate::response::{CvResponse, SwvResponse};
use crate::surface::{ActiveLayer, ComponentConfig, LayerDefinition};
use crate::technique::{cv, swv, FrequencySweep, SweepOptions, VfSwvParameters, VfSwvResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Bare electrode when omitted
    pub surface: Option<SurfaceConfig>,
    pub technique: TechniqueConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_loading_cutoff() -> f64 {
    DEFAULT_LOADING_CUTOFF
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceConfig {
    pub e_axis_resolution: usize,
    pub e_bounds: [f64; 2],
    pub log_k_axis_resolution: usize,
    pub log_k_bounds: [f64; 2],
    #[serde(default = "default_loading_cutoff")]
    pub loading_cutoff: f64,
    #[serde(default)]
    pub components: Vec<ComponentConfig>,
}

impl SurfaceConfig {
    pub fn to_definition(&self) -> SimResult<LayerDefinition> {
        let components = self
            .components
            .iter()
            .enumerate()
            .map(|(i, c)| c.to_component(i))
            .collect::<SimResult<Vec<_>>>()?;
        Ok(LayerDefinition {
            e_axis_resolution: self.e_axis_resolution,
            e_bounds: (self.e_bounds[0], self.e_bounds[1]),
            log_k_axis_resolution: self.log_k_axis_resolution,
            log_k_bounds: (self.log_k_bounds[0], self.log_k_bounds[1]),
            components,
        })
    }

    pub fn build_layer(&self, observer: SharedObserver) -> SimResult<ActiveLayer> {
        ActiveLayer::with_observer(&self.to_definition()?, self.loading_cutoff, observer)
    }
}

fn default_frequency_resolution() -> usize {
    VFSWV_DEFAULT_FREQUENCY_RESOLUTION
}

fn default_pulse_resolution() -> usize {
    SWV_DEFAULT_RESOLUTION
}

fn default_parallel() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VfSwvConfig {
    pub e_start: f64,
    pub e_end: f64,
    pub e_step: f64,
    pub amplitude: f64,
    pub log_frequency_min: f64,
    pub log_frequency_max: f64,
    pub resistance: f64,
    pub capacitance: f64,
    #[serde(default = "default_frequency_resolution")]
    pub frequency_domain_resolution: usize,
    #[serde(default = "default_pulse_resolution")]
    pub pulse_resolution: usize,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl VfSwvConfig {
    pub fn parameters(&self) -> VfSwvParameters {
        VfSwvParameters {
            e_start: self.e_start,
            e_end: self.e_end,
            e_step: self.e_step,
            amplitude: self.amplitude,
            log_frequency_min: self.log_frequency_min,
            log_frequency_max: self.log_frequency_max,
            resistance: self.resistance,
            capacitance: self.capacitance,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TechniqueConfig {
    Cv(CvParameters),
    Swv(SwvParameters),
    Vfswv(VfSwvConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EngineConfig {
    Native {
        timeout_ms: Option<u64>,
    },
    Dynamic {
        library: PathBuf,
        #[serde(default)]
        symbol: Option<String>,
        #[serde(default)]
        release_symbol: Option<String>,
        timeout_ms: Option<u64>,
    },
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig::Native { timeout_ms: None }
    }
}

impl EngineConfig {
    pub fn build(&self) -> SimResult<Arc<dyn KineticsEngine>> {
        let (engine, timeout_ms): (Arc<dyn KineticsEngine>, Option<u64>) = match self {
            EngineConfig::Native { timeout_ms } => (Arc::new(ButlerVolmerEngine::new()), *timeout_ms),
            EngineConfig::Dynamic {
                library,
                symbol,
                release_symbol,
                timeout_ms,
            } => {
                let symbol = symbol.as_deref().unwrap_or(KINETICS_SYMBOL);
                let engine = DynamicEngine::load_with(library, symbol, release_symbol.as_deref())?;
                (Arc::new(engine), *timeout_ms)
            }
        };
        Ok(match timeout_ms {
            Some(ms) => Arc::new(TimedEngine::new(engine, Duration::from_millis(ms))),
            None => engine,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub directory: Option<PathBuf>,
}

/// Result of one experiment run.
#[derive(Debug)]
pub enum ExperimentOutcome {
    Cv(CvResponse),
    Swv(SwvResponse),
    VfSwv(VfSwvResult),
}

impl ExperimentConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> SimResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> SimResult<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Two-component Lorentz layer probed by a cathodic SWV scan.
    pub fn example() -> Self {
        let component = |g0: f64, log_k0: f64, z: u32| ComponentConfig {
            dist_type: "lorentz".into(),
            g0,
            e0: -0.2,
            sigma_e0: 0.04,
            log_k0,
            sigma_log_k0: 0.1,
            a: 0.5,
            z,
        };
        Self {
            surface: Some(SurfaceConfig {
                e_axis_resolution: 20,
                e_bounds: [-0.5, 0.1],
                log_k_axis_resolution: 15,
                log_k_bounds: [0.0, 2.5],
                loading_cutoff: DEFAULT_LOADING_CUTOFF,
                components: vec![component(0.035e-9, 1.2, 1), component(0.02e-9, 0.5, 2)],
            }),
            technique: TechniqueConfig::Swv(SwvParameters {
                e_start: 0.5,
                e_end: -0.5,
                e_step: -0.01,
                amplitude: 0.025,
                log_freq: 2.0,
                resistance: 10.0,
                capacitance: 100e-6,
                resolution: SWV_DEFAULT_RESOLUTION,
            }),
            engine: EngineConfig::default(),
            output: OutputConfig {
                directory: Some(PathBuf::from("voltammetry_results")),
            },
        }
    }

    pub fn run(&self, observer: SharedObserver) -> SimResult<ExperimentOutcome> {
        let layer = self.build_layer(observer.clone())?;
        self.run_on(layer.as_ref(), observer)
    }

    /// `None` when the experiment probes a bare electrode.
    pub fn build_layer(&self, observer: SharedObserver) -> SimResult<Option<ActiveLayer>> {
        self.surface.as_ref().map(|s| s.build_layer(observer)).transpose()
    }

    /// Run the technique against an already built layer.
    pub fn run_on(&self, layer: Option<&ActiveLayer>, observer: SharedObserver) -> SimResult<ExperimentOutcome> {
        let engine = self.engine.build()?;
        log::info!(
            "running {} with the '{}' engine{}",
            self.technique.label(),
            engine.name(),
            if layer.is_some() { "" } else { " (no surface layer)" }
        );

        let outcome = match &self.technique {
            TechniqueConfig::Cv(params) => ExperimentOutcome::Cv(cv::run(params, layer, engine.as_ref())?),
            TechniqueConfig::Swv(params) => ExperimentOutcome::Swv(swv::run(params, layer, engine.as_ref())?),
            TechniqueConfig::Vfswv(config) => {
                let options = SweepOptions {
                    frequency_domain_resolution: config.frequency_domain_resolution,
                    pulse_resolution: config.pulse_resolution,
                    parallel: config.parallel,
                    cancel: None,
                    observer,
                };
                let sweep = FrequencySweep::new(config.parameters(), layer, engine.as_ref()).with_options(options);
                ExperimentOutcome::VfSwv(sweep.run()?)
            }
        };
        Ok(outcome)
    }
}

impl TechniqueConfig {
    pub fn label(&self) -> &'static str {
        match self {
            TechniqueConfig::Cv(_) => "CV",
            TechniqueConfig::Swv(_) => "SWV",
            TechniqueConfig::Vfswv(_) => "VF-SWV",
        }
    }
}
