//! JSON-lines diagnostics file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use eyre::WrapErr;
use rinest_core::{DiagnosticSink, Diagnostics};
use serde_json::json;

/// One JSON object per processed sample. Non-finite values are written as `null`.
pub struct JsonlSink {
    out: BufWriter<File>,
    written: u64,
    failed: bool,
}

impl JsonlSink {
    pub fn create(path: &Path) -> eyre::Result<Self> {
        let file = File::create(path)
            .wrap_err_with(|| format!("create diagnostics file {}", path.display()))?;
        Ok(Self {
            out: BufWriter::new(file),
            written: 0,
            failed: false,
        })
    }

    /// Flush and return the number of records written. A write that failed
    /// mid-run makes the file incomplete, which is reported here.
    pub fn finish(mut self) -> eyre::Result<u64> {
        self.out.flush().wrap_err("flush diagnostics file")?;
        if self.failed {
            eyre::bail!("diagnostics file truncated after {} records", self.written);
        }
        Ok(self.written)
    }
}

pub fn diagnostics_json(d: &Diagnostics) -> serde_json::Value {
    json!({
        "timestamp_us": d.timestamp_us,
        "voltage_v": d.voltage_measured,
        "current_a": d.current_measured,
        "voltage_predicted_v": d.voltage_predicted,
        "prediction_error_v": d.prediction_error,
        "params": d.params,
        "regressor": d.regressor,
        "r_steady_state_ohm": d.r_steady_state,
        "r_transient_ohm": d.r_transient,
        "voltage_open_circuit_v": d.voltage_open_circuit,
        "r_internal_sample_ohm": d.r_internal_sample,
        "sample_accepted": d.sample_accepted,
        "best_r_internal_ohm": d.best_r_internal,
        "committed_ohm": d.committed,
    })
}

impl DiagnosticSink for JsonlSink {
    fn publish(&mut self, d: &Diagnostics) {
        if self.failed {
            return;
        }
        if let Err(e) = writeln!(self.out, "{}", diagnostics_json(d)) {
            tracing::warn!(error = %e, "diagnostics write failed; further records dropped");
            self.failed = true;
            return;
        }
        self.written += 1;
    }
}
