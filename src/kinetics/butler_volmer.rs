// kinetics/butler_volmer.rs
// In-process Butler-Volmer solver for surface-confined redox sites

use super::{check_output, KineticsEngine, KineticsInput};
use crate::config::{HALF_LIFE_BENCHMARK_STEPS, SUBLOADINGS_PER_NMOL};
use crate::error::SimResult;
use crate::profile_scope;
use crate::surface::RedoxSite;
use crate::units::{FARADAY, F_BY_RT, LN_2, MOL_TO_NMOL};

/// Deterministic solver for surface-confined Butler-Volmer kinetics.
///
/// Each site's reduced fraction relaxes analytically within a time step.
/// The ohmic drop of the faradaic current is fed back into the effective
/// potential by alternating an over-correcting pass with an averaging pass,
/// one pair per sub-loading of the site.
#[derive(Clone, Copy, Debug, Default)]
pub struct ButlerVolmerEngine;

impl ButlerVolmerEngine {
    pub fn new() -> Self {
        Self
    }
}

/// Forward and backward rate constants at every sample for one site.
struct RateTable {
    forward: Vec<f64>,
    backward: Vec<f64>,
    sum: Vec<f64>,
    ratio: Vec<f64>,
}

impl RateTable {
    fn new(len: usize) -> Self {
        Self {
            forward: vec![0.0; len],
            backward: vec![0.0; len],
            sum: vec![0.0; len],
            ratio: vec![0.0; len],
        }
    }

    fn set(&mut self, j: usize, overpotential: f64, site: &RedoxSite) {
        let x = overpotential * F_BY_RT * site.z;
        let kf = site.k0 * (x * site.a).exp();
        let kb = site.k0 * (-x * (1.0 - site.a)).exp();
        self.forward[j] = kf;
        self.backward[j] = kb;
        self.sum[j] = kf + kb;
        self.ratio[j] = kb / (kf + kb);
    }

    fn slow(&self, j: usize, forward: bool, limit: f64) -> bool {
        let k = if forward { self.forward[j] } else { self.backward[j] };
        LN_2 / k > limit
    }
}

/// Sample range over which the site's current is worth integrating.
///
/// Returns `None` when neither end of the sequence is slow enough to matter.
fn lookup_window(rates: &RateTable, site: &RedoxSite, benchmark: f64, descending: bool) -> Option<(usize, usize)> {
    let len = rates.forward.len();
    let forward_limit = benchmark * (1.0 - site.a);
    let backward_limit = benchmark * site.a;
    let (lead_forward, lead_limit, trail_limit) = if descending {
        (false, backward_limit, forward_limit)
    } else {
        (true, forward_limit, backward_limit)
    };

    let start = (0..len).find(|&j| rates.slow(j, lead_forward, lead_limit));
    let end = (1..len).rev().find(|&j| rates.slow(j, !lead_forward, trail_limit));
    if start.is_none() && end.is_none() {
        return None;
    }
    Some((start.unwrap_or(0), end.unwrap_or(len - 1)))
}

/// Even number of passes a site is split into; zero for an empty site.
fn subloading_count(g: f64) -> usize {
    let mut count = (SUBLOADINGS_PER_NMOL * g * MOL_TO_NMOL).ceil().max(0.0) as usize;
    if count % 2 != 0 {
        count += 1;
    }
    count
}

impl KineticsEngine for ButlerVolmerEngine {
    fn name(&self) -> &str {
        "butler-volmer"
    }

    fn full_response(&self, input: &KineticsInput<'_>) -> SimResult<Vec<f64>> {
        profile_scope!("kinetics");
        input.validate()?;
        let len = input.len();
        if len == 0 {
            return Ok(Vec::new());
        }

        let dt = input.time_step;
        let resistance = input.resistance;
        let benchmark = HALF_LIFE_BENCHMARK_STEPS * dt;
        let descending = input.corrected[0] > input.corrected[len - 1];

        let mut averaged = input.corrected.to_vec();
        let mut overcorrected = averaged.clone();
        let mut overpotential = vec![0.0; len];
        let mut current = vec![0.0; len];
        let mut rates = RateTable::new(len);

        for site in input.surface.sites() {
            for j in 0..len {
                overpotential[j] = averaged[j] - site.e0;
                rates.set(j, overpotential[j], &site);
            }
            let Some((start, end)) = lookup_window(&rates, &site, benchmark, descending) else {
                continue;
            };

            let passes = subloading_count(site.g);
            if passes == 0 {
                continue;
            }
            let part = 2.0 * site.g / passes as f64;
            current.iter_mut().for_each(|c| *c = 0.0);

            for pass in 0..passes {
                let mut red = part / (1.0 + (site.z * F_BY_RT * overpotential[start]).exp());
                for n in start + 1..=end {
                    current[n] = site.z * FARADAY * (red * rates.forward[n] - (part - red) * rates.backward[n]);
                    let equilibrium = part * rates.ratio[n];
                    red = equilibrium + (red - equilibrium) * (-rates.sum[n] * dt).exp();
                }

                for m in start..end {
                    if pass % 2 == 0 {
                        overcorrected[m] -= current[m] * resistance;
                        overpotential[m] = overcorrected[m] - site.e0;
                    } else {
                        let mean = (overcorrected[m] - current[m] * resistance + overcorrected[m]) / 2.0;
                        averaged[m] = mean;
                        overcorrected[m] = mean;
                        overpotential[m] = mean - site.e0;
                    }
                    rates.set(m, overpotential[m], &site);
                }
            }
        }

        let response: Vec<f64> = input
            .raw
            .iter()
            .zip(&averaged)
            .map(|(raw, effective)| (raw - effective) / resistance)
            .collect();
        check_output(self.name(), len, &response)?;
        Ok(response)
    }

    fn is_reentrant(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subloadings_are_even() {
        assert_eq!(subloading_count(0.0), 0);
        assert_eq!(subloading_count(1e-13), 2);
        assert_eq!(subloading_count(0.05e-9), 2);
        assert_eq!(subloading_count(0.5e-9), 10);
        assert_eq!(subloading_count(0.12e-9), 4);
    }

    #[test]
    fn window_spans_the_slow_region() {
        let site = RedoxSite {
            e0: 0.0,
            k0: 10.0,
            g: 1e-10,
            a: 0.5,
            z: 1.0,
        };
        let potentials = [0.4, 0.2, 0.0, -0.2, -0.4];
        let mut rates = RateTable::new(potentials.len());
        for (j, e) in potentials.iter().enumerate() {
            rates.set(j, *e, &site);
        }
        assert!(rates.forward[0] > rates.backward[0]);
        assert!((rates.ratio[2] - 0.5).abs() < 1e-12);

        // slow everywhere with a tiny time step
        let window = lookup_window(&rates, &site, 1e-9, true);
        assert_eq!(window, Some((0, 4)));
        // fast everywhere with a huge benchmark
        assert_eq!(lookup_window(&rates, &site, 1e9, true), None);
    }
}
