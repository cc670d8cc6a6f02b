//! Test and helper mocks for rinest_core

use rinest_traits::{BoxError, ParamStore, Sample, TelemetrySource};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use crate::sink::DiagnosticSink;
use crate::types::Diagnostics;

/// In-memory parameter store; counts commits and can be told to fail.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, f64>,
    commits: usize,
    fail: bool,
}

impl MemoryStore {
    pub fn with_value(key: &str, value: f64) -> Self {
        let mut s = Self::default();
        s.values.insert(key.to_string(), value);
        s
    }

    /// A store whose writes always fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn commits(&self) -> usize {
        self.commits
    }
}

impl ParamStore for MemoryStore {
    fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }
    fn set(&mut self, key: &str, value: f64) -> Result<(), BoxError> {
        if self.fail {
            return Err(Box::new(std::io::Error::other("memory store is read-only")));
        }
        self.values.insert(key.to_string(), value);
        Ok(())
    }
    fn commit(&mut self) -> Result<(), BoxError> {
        if self.fail {
            return Err(Box::new(std::io::Error::other("memory store is read-only")));
        }
        self.commits += 1;
        Ok(())
    }
}

/// Source replaying a fixed list of samples, optionally refusing to subscribe.
#[derive(Debug, Default, Clone)]
pub struct VecSource {
    samples: VecDeque<Sample>,
    refuse_subscription: bool,
}

impl VecSource {
    pub fn new(samples: impl IntoIterator<Item = Sample>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
            refuse_subscription: false,
        }
    }

    pub fn refusing_subscription() -> Self {
        Self {
            refuse_subscription: true,
            ..Self::default()
        }
    }
}

impl TelemetrySource for VecSource {
    fn subscribe(&mut self) -> Result<(), BoxError> {
        if self.refuse_subscription {
            return Err(Box::new(std::io::Error::other("battery topic not advertised")));
        }
        Ok(())
    }
    fn next_sample(&mut self, _timeout: Duration) -> Result<Option<Sample>, BoxError> {
        Ok(self.samples.pop_front())
    }
}

/// Sink keeping every published record.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub records: Vec<Diagnostics>,
}

impl DiagnosticSink for CollectingSink {
    fn publish(&mut self, diagnostics: &Diagnostics) {
        self.records.push(diagnostics.clone());
    }
}
