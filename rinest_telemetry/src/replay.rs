//! Replay of recorded battery telemetry.
//!
//! The CSV log is read on `subscribe`, so a missing or malformed log fails
//! startup the same way an unavailable bus topic would.

use std::collections::VecDeque;
use std::path::PathBuf;

use rinest_config::TelemetryRow;
use rinest_traits::{BoxError, Sample, TelemetrySource};

use crate::error::TelemetryError;

#[derive(Debug)]
pub struct ReplaySource {
    path: Option<PathBuf>,
    rows: Option<VecDeque<Sample>>,
}

fn to_sample(row: TelemetryRow) -> Sample {
    Sample::new(row.timestamp_us, row.current_a, row.voltage_v)
}

impl ReplaySource {
    /// Replay the CSV at `path` once subscribed.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            rows: None,
        }
    }

    /// Replay already-loaded rows.
    pub fn from_rows(rows: impl IntoIterator<Item = TelemetryRow>) -> Self {
        Self {
            path: None,
            rows: Some(rows.into_iter().map(to_sample).collect()),
        }
    }

    /// Samples left to replay; `None` before the log has been loaded.
    pub fn remaining(&self) -> Option<usize> {
        self.rows.as_ref().map(VecDeque::len)
    }
}

impl TelemetrySource for ReplaySource {
    fn subscribe(&mut self) -> Result<(), BoxError> {
        if self.rows.is_some() {
            return Ok(());
        }
        let Some(path) = &self.path else {
            return Err(Box::new(TelemetryError::Unavailable("no telemetry log".into())));
        };
        if !path.exists() {
            return Err(Box::new(TelemetryError::Unavailable(format!(
                "telemetry log {} not found",
                path.display()
            ))));
        }
        let rows = rinest_config::load_telemetry_csv(path)
            .map_err(|e| TelemetryError::Corrupt(format!("{e:#}")))?;
        tracing::info!(path = %path.display(), rows = rows.len(), "telemetry log loaded");
        self.rows = Some(rows.into_iter().map(to_sample).collect());
        Ok(())
    }

    fn next_sample(&mut self, _timeout: std::time::Duration) -> Result<Option<Sample>, BoxError> {
        match &mut self.rows {
            Some(rows) => Ok(rows.pop_front()),
            None => Err(Box::new(TelemetryError::Unavailable(
                "replay read before subscribe".into(),
            ))),
        }
    }
}
