//! Structured diagnostics emitted by the simulation pipeline.
//!
//! Computation code never prints. It hands a [`SimEvent`] to whatever
//! [`SimObserver`] was injected at construction; the default observer
//! forwards to the `log` facade.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
        };
        write!(f, "{label}")
    }
}

/// Named numeric measurement attached to an event.
#[derive(Clone, Debug, PartialEq)]
pub struct Metric {
    pub name: &'static str,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimEvent {
    pub severity: Severity,
    pub message: String,
    pub metric: Option<Metric>,
}

impl SimEvent {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            metric: None,
        }
    }

    pub fn metric(severity: Severity, message: impl Into<String>, name: &'static str, value: f64) -> Self {
        Self {
            severity,
            message: message.into(),
            metric: Some(Metric { name, value }),
        }
    }
}

pub trait SimObserver: Send + Sync {
    fn record(&self, event: &SimEvent);
}

pub type SharedObserver = Arc<dyn SimObserver>;

/// Forwards events to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl SimObserver for LogObserver {
    fn record(&self, event: &SimEvent) {
        let level = match event.severity {
            Severity::Debug => log::Level::Debug,
            Severity::Info => log::Level::Info,
            Severity::Warning => log::Level::Warn,
        };
        match &event.metric {
            Some(metric) => log::log!(level, "{} [{}={}]", event.message, metric.name, metric.value),
            None => log::log!(level, "{}", event.message),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl SimObserver for NullObserver {
    fn record(&self, _event: &SimEvent) {}
}

/// Keeps every event in memory.
#[derive(Default)]
pub struct CollectingObserver {
    events: Mutex<Vec<SimEvent>>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SimEvent> {
        self.events.lock().clone()
    }

    /// Value of the most recent metric with the given name.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.events
            .lock()
            .iter()
            .rev()
            .filter_map(|e| e.metric.as_ref())
            .find(|m| m.name == name)
            .map(|m| m.value)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.events.lock().iter().filter(|e| e.severity == severity).count()
    }
}

impl SimObserver for CollectingObserver {
    fn record(&self, event: &SimEvent) {
        self.events.lock().push(event.clone());
    }
}

pub fn default_observer() -> SharedObserver {
    Arc::new(LogObserver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_observer_keeps_latest_metric() {
        let observer = CollectingObserver::new();
        observer.record(&SimEvent::metric(Severity::Info, "first", "loss", 1.0));
        observer.record(&SimEvent::new(Severity::Warning, "bounds swapped"));
        observer.record(&SimEvent::metric(Severity::Info, "second", "loss", 2.5));
        assert_eq!(observer.metric("loss"), Some(2.5));
        assert_eq!(observer.metric("missing"), None);
        assert_eq!(observer.count(Severity::Warning), 1);
        assert_eq!(observer.events().len(), 3);
    }
}
