//! Human-readable error descriptions and structured JSON error formatting.

use rinest_core::{BuildError, EstimatorError};
use rinest_telemetry::TelemetryError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingStore => {
                "What happened: No parameter store was provided to the estimator.\nLikely causes: The store failed to open or was not wired into the builder.\nHow to fix: Pass a store via with_store(...), or check [store].path in the config.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid estimator configuration ({msg}).\nLikely causes: Out-of-range values in [model], [adaptation] or [commit].\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(ee) = err.downcast_ref::<EstimatorError>() {
        return match ee {
            EstimatorError::Subscription(msg) => format!(
                "What happened: Could not subscribe to battery telemetry ({msg}).\nLikely causes: The telemetry log is missing or unreadable, or the bus topic is unavailable.\nHow to fix: Check the --input path (or the telemetry source) and rerun."
            ),
            EstimatorError::Timeout => {
                "What happened: Telemetry stopped arriving.\nLikely causes: The source stalled or source.timeout_ms is too low for its rate.\nHow to fix: Check the telemetry source, or raise source.timeout_ms in the config.".to_string()
            }
            EstimatorError::Source(msg) => format!(
                "What happened: The telemetry source failed ({msg}).\nLikely causes: A read error on the bus or a corrupt log.\nHow to fix: Re-run with --log-level=debug to see the failing sample."
            ),
            EstimatorError::Store(msg) => format!(
                "What happened: The parameter store rejected the estimate ({msg}).\nLikely causes: The parameter file is unwritable or corrupt.\nHow to fix: Check permissions and contents of [store].path."
            ),
            EstimatorError::Config(msg) => format!(
                "What happened: Configuration could not be loaded ({msg}).\nLikely causes: Missing file, TOML syntax error, or out-of-range values.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(TelemetryError::InvalidSetting(msg)) = err.downcast_ref::<TelemetryError>() {
        return format!(
            "What happened: Invalid simulation setting ({msg}).\nLikely causes: A simulate option or [model] value is out of range.\nHow to fix: Adjust the option and rerun."
        );
    }
    if let Some(TelemetryError::Store(msg)) = err.downcast_ref::<TelemetryError>() {
        return format!(
            "What happened: The parameter file could not be opened ({msg}).\nLikely causes: The file is not valid TOML or not readable.\nHow to fix: Fix or remove the file at [store].path; a missing file starts an empty store."
        );
    }

    // String-based heuristics
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("telemetry csv must have headers") {
        let expected = "timestamp_us,current_a,voltage_v";
        return format!("Invalid headers in telemetry CSV. Expected '{expected}'.");
    }
    if lower.contains("diagnostics file") {
        return format!(
            "What happened: The diagnostics file could not be written.\nLikely causes: Missing directory or no write permission.\nHow to fix: Choose a writable --diagnostics path. Original: {msg}"
        );
    }
    if lower.contains("self-check failed") {
        return format!(
            "What happened: {msg}.\nLikely causes: Adaptation gains or leakage too aggressive for the configured sample rate.\nHow to fix: Review [adaptation] and [source].sample_rate_hz."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per failure class.
///
/// 2 configuration, 3 subscription, 4 timeout, 5 source, 6 store, 1 anything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    if let Some(TelemetryError::InvalidSetting(_)) = err.downcast_ref::<TelemetryError>() {
        return 2;
    }
    if let Some(TelemetryError::Store(_)) = err.downcast_ref::<TelemetryError>() {
        return 6;
    }
    match err.downcast_ref::<EstimatorError>() {
        Some(EstimatorError::Config(_)) => 2,
        Some(EstimatorError::Subscription(_)) => 3,
        Some(EstimatorError::Timeout) => 4,
        Some(EstimatorError::Source(_)) => 5,
        Some(EstimatorError::Store(_)) => 6,
        None => 1,
    }
}

pub fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "Config";
    }
    match err.downcast_ref::<EstimatorError>() {
        Some(EstimatorError::Config(_)) => "Config",
        Some(EstimatorError::Subscription(_)) => "Subscription",
        Some(EstimatorError::Timeout) => "Timeout",
        Some(EstimatorError::Source(_)) => "Source",
        Some(EstimatorError::Store(_)) => "Store",
        None => match err.downcast_ref::<TelemetryError>() {
            Some(TelemetryError::InvalidSetting(_)) => "Config",
            Some(TelemetryError::Store(_)) => "Store",
            _ => "Error",
        },
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
