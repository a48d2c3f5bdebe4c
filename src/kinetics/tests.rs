use super::*;
use crate::pulse::{CvParameters, SwvParameters};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn single_site(e0: f64, k0: f64, g: f64) -> CompressedSurface {
    CompressedSurface::from_arrays(vec![e0], vec![k0], vec![g], vec![0.5], vec![1.0]).unwrap()
}

fn cv_sequence() -> PulseSequence {
    CvParameters {
        e_start: -0.4,
        e_end: 0.4,
        scan_rate: 0.1,
        resolution: 1000,
        resistance: 10.0,
        capacitance: 1e-4,
    }
    .build()
    .unwrap()
}

#[test]
fn empty_surface_returns_the_capacitive_current() {
    let sequence = cv_sequence();
    let surface = CompressedSurface::default();
    let response = ButlerVolmerEngine::new()
        .full_response(&KineticsInput::new(&sequence, &surface))
        .unwrap();
    assert_eq!(response, sequence.capacitive_current);
}

#[test]
fn surface_couple_oxidises_forward_and_reduces_backward() {
    let sequence = cv_sequence();
    let surface = single_site(0.0, 100.0, 1e-10);
    let response = ButlerVolmerEngine::new()
        .full_response(&KineticsInput::new(&sequence, &surface))
        .unwrap();
    assert_eq!(response.len(), sequence.len());

    let faradaic: Vec<f64> = response
        .iter()
        .zip(&sequence.capacitive_current)
        .map(|(full, cap)| full - cap)
        .collect();
    let (peak_index, peak) = faradaic
        .iter()
        .cloned()
        .enumerate()
        .fold((0, f64::MIN), |best, (i, v)| if v > best.1 { (i, v) } else { best });
    let (trough_index, trough) = faradaic
        .iter()
        .cloned()
        .enumerate()
        .fold((0, f64::MAX), |best, (i, v)| if v < best.1 { (i, v) } else { best });

    let turn = sequence.len() / 2;
    assert!(peak > 0.0);
    assert!(trough < 0.0);
    assert!(peak_index < turn);
    assert!(trough_index > turn);
    assert!(sequence.raw_potential[peak_index].abs() < 0.15);
    assert!(sequence.raw_potential[trough_index].abs() < 0.15);
}

#[test]
fn square_wave_response_is_finite() {
    let sequence = SwvParameters {
        e_start: 0.3,
        e_end: -0.3,
        e_step: -0.01,
        amplitude: 0.025,
        log_freq: 1.0,
        resistance: 10.0,
        capacitance: 1e-5,
        resolution: 100,
    }
    .build()
    .unwrap();
    let surface = single_site(0.0, 30.0, 5e-11);
    let response = ButlerVolmerEngine::new()
        .full_response(&KineticsInput::new(&sequence, &surface))
        .unwrap();
    assert_eq!(response.len(), sequence.len());
    assert!(response.iter().all(|v| v.is_finite()));
    assert!(response
        .iter()
        .zip(&sequence.capacitive_current)
        .any(|(full, cap)| (full - cap).abs() > 1e-9));
}

#[test]
fn input_validation_catches_length_mismatches() {
    let sequence = cv_sequence();
    let surface = single_site(0.0, 100.0, 1e-10);
    let short = &sequence.dlc_corrected_potential[1..];
    let input = KineticsInput {
        corrected: short,
        ..KineticsInput::new(&sequence, &surface)
    };
    assert!(matches!(
        ButlerVolmerEngine::new().full_response(&input),
        Err(SimError::ArraySizeMismatch {
            array: "dlc_corrected_potential",
            ..
        })
    ));

    let mut broken = single_site(0.0, 100.0, 1e-10);
    broken.z.push(2.0);
    let input = KineticsInput::new(&sequence, &broken);
    assert!(matches!(input.validate(), Err(SimError::ArraySizeMismatch { array: "z", .. })));
}

struct SlowEngine;

impl KineticsEngine for SlowEngine {
    fn name(&self) -> &str {
        "slow"
    }

    fn full_response(&self, input: &KineticsInput<'_>) -> SimResult<Vec<f64>> {
        thread::sleep(Duration::from_millis(300));
        Ok(vec![0.0; input.len()])
    }
}

#[test]
fn timed_engine_gives_up_on_slow_calls() {
    let sequence = cv_sequence();
    let surface = CompressedSurface::default();
    let engine = TimedEngine::new(Arc::new(SlowEngine), Duration::from_millis(20));
    assert!(!engine.is_reentrant());
    let result = engine.full_response(&KineticsInput::new(&sequence, &surface));
    assert!(matches!(result, Err(SimError::EngineTimeout { timeout_ms: 20 })));
}

/// Non-reentrant engine that records how many calls overlap.
#[derive(Default)]
struct OverlapCounter {
    active: AtomicUsize,
    max_active: AtomicUsize,
    started: AtomicUsize,
}

impl KineticsEngine for OverlapCounter {
    fn name(&self) -> &str {
        "overlap-counter"
    }

    fn full_response(&self, input: &KineticsInput<'_>) -> SimResult<Vec<f64>> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(300));
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(vec![0.0; input.len()])
    }
}

#[test]
fn abandoned_call_blocks_the_next_one() {
    let sequence = cv_sequence();
    let surface = CompressedSurface::default();
    let inner = Arc::new(OverlapCounter::default());
    let engine = TimedEngine::new(inner.clone(), Duration::from_millis(20));
    for _ in 0..3 {
        let result = engine.full_response(&KineticsInput::new(&sequence, &surface));
        assert!(matches!(result, Err(SimError::EngineTimeout { timeout_ms: 20 })));
    }
    assert_eq!(inner.started.load(Ordering::SeqCst), 1);

    // once the abandoned call ends, the engine is usable again
    let patient = TimedEngine::new(inner.clone(), Duration::from_secs(5));
    thread::sleep(Duration::from_millis(400));
    assert_eq!(patient.full_response(&KineticsInput::new(&sequence, &surface)).unwrap().len(), sequence.len());
    assert_eq!(inner.max_active.load(Ordering::SeqCst), 1);
}

#[test]
fn timed_engine_passes_results_through() {
    let sequence = cv_sequence();
    let surface = single_site(0.0, 100.0, 1e-10);
    let input = KineticsInput::new(&sequence, &surface);
    let direct = ButlerVolmerEngine::new().full_response(&input).unwrap();
    let timed = TimedEngine::new(Arc::new(ButlerVolmerEngine::new()), Duration::from_secs(30));
    assert!(timed.is_reentrant());
    assert_eq!(timed.full_response(&input).unwrap(), direct);
}

#[test]
fn cancellation_is_shared_between_clones() {
    let token = CancellationToken::new();
    let observer = token.clone();
    assert!(observer.check().is_ok());
    token.cancel();
    assert!(observer.is_cancelled());
    assert!(matches!(observer.check(), Err(SimError::Cancelled)));
}

#[test]
fn missing_library_is_an_engine_failure() {
    let result = DynamicEngine::load("/nonexistent/libredox_kinetics_missing.so");
    assert!(matches!(result, Err(SimError::NativeEngineFailure(_))));
}
