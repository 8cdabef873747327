//! Human-readable error descriptions and structured JSON error formatting.

use level_core::error::{BuildError, LevelError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSensors => {
                "What happened: No sensor source was provided to the monitor.\nLikely causes: The sensor stack was not wired into the builder.\nHow to fix: Pass a sensor source via with_sensors(...).".to_string()
            }
            BuildError::MissingStore => {
                "What happened: No calibration store was provided to the monitor.\nLikely causes: The byte store failed to open or was not wired into the builder.\nHow to fix: Check [storage] in the config and pass the store via with_store(...).".to_string()
            }
            BuildError::MissingTransport => {
                "What happened: No serial transport was provided to the monitor.\nLikely causes: The serial port failed to open or was not wired into the builder.\nHow to fix: Check [serial] in the config.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML or sensor table.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(le) = err.downcast_ref::<LevelError>() {
        return match le {
            LevelError::StoreInit(msg) => format!(
                "What happened: The calibration store could not be initialized ({msg}).\nLikely causes: storage.path does not exist and storage.format_if_missing is false, or the directory is not writable.\nHow to fix: Fix [storage] in the config or create the store by running once with format_if_missing = true."
            ),
            LevelError::Storage(msg) => format!(
                "What happened: Reading or writing the calibration record failed ({msg}).\nLikely causes: The store file was removed, truncated or is not writable.\nHow to fix: Check the file at storage.path, then recalibrate with `cal`."
            ),
            LevelError::Halted => {
                "What happened: The monitor halted after a fatal error.\nLikely causes: An earlier calibration store failure.\nHow to fix: Restart the monitor after fixing the store.".to_string()
            }
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from config loading
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("sensor table csv must have headers") {
        return "Invalid headers in sensor table CSV. Expected 'slot,scale,threshold'.".to_string();
    }

    if lower.contains("parse config") || lower.contains("must be") || lower.contains("expected") {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nLikely causes: A typo or out-of-range value in the TOML.\nHow to fix: Edit the config and try again."
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

/// Stable process exit codes: 3 store failure, 4 halted, 1 anything else.
/// Usage errors exit with 2 from clap before we get here.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<LevelError>() {
        Some(LevelError::Storage(_) | LevelError::StoreInit(_)) => 3,
        Some(LevelError::Halted) => 4,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(le) = err.downcast_ref::<LevelError>() {
        return match le {
            LevelError::Storage(_) => "Storage",
            LevelError::StoreInit(_) => "StoreInit",
            LevelError::Sensor(_) => "Sensor",
            LevelError::Config(_) => "Config",
            LevelError::Halted => "Halted",
            LevelError::Io(_) => "Io",
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return "Build";
    }
    "Error"
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
