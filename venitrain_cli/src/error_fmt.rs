//! Human-readable error descriptions and structured JSON error formatting.

use venitrain_core::error::{BuildError, TrainerError};

/// Exit code for invalid configuration or arguments that passed clap.
pub const EXIT_CONFIG: i32 = 3;
/// Exit code when the training arm cannot be reached.
pub const EXIT_TRANSPORT: i32 = 4;

fn is_config_error(err: &eyre::Report) -> bool {
    if matches!(
        err.downcast_ref::<TrainerError>(),
        Some(TrainerError::Config(_))
    ) || matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(_))
    ) {
        return true;
    }
    let lower = err.to_string().to_ascii_lowercase();
    lower.contains("invalid configuration") || lower.contains("parse config")
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingTransport => {
                "What happened: No transport was provided to the session runner.\nLikely causes: No device, --simulate or --replay source was selected.\nHow to fix: Pass one of --device, --simulate or --replay, or set transport.device in the config.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. `venitrain self-check` validates it."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<TrainerError>() {
        return match te {
            TrainerError::Transport(msg) => format!(
                "What happened: The training arm could not be reached ({msg}).\nLikely causes: Wrong device path, the arm is unplugged, or another program holds the port.\nHow to fix: Check the cable and transport.device, close other serial monitors, or try --simulate."
            ),
            TrainerError::Timeout => {
                "What happened: The training arm did not answer in time.\nLikely causes: Wrong baud rate or the arm firmware is not streaming.\nHow to fix: Check transport.baud_rate (9600 by default) and power-cycle the arm.".to_string()
            }
            TrainerError::NotConnected | TrainerError::AlreadyConnected => format!(
                "What happened: {te}.\nLikely causes: The command needs a different connection state.\nHow to fix: Use `connect` or `disconnect` first."
            ),
            TrainerError::Config(msg) => format!(
                "What happened: Invalid setting ({msg}).\nLikely causes: An unsupported value on the command line or in the config.\nHow to fix: Use one of the documented values and rerun."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if is_config_error(err) {
        let root = err.root_cause();
        return format!(
            "What happened: Configuration is invalid ({root}).\nLikely causes: A misspelled key, a wrong type, or an out-of-range value.\nHow to fix: Edit the TOML config and try again. `venitrain self-check` validates it."
        );
    }

    if lower.contains("hardware support") {
        return "What happened: This build cannot open serial devices.\nLikely causes: The binary was built without the `hardware` feature.\nHow to fix: Rebuild with `--features hardware`, or use --simulate / --replay.".to_string();
    }

    if lower.contains("no transport selected") {
        return "What happened: No data source was selected.\nLikely causes: No --device, --simulate or --replay flag and no transport.device in the config.\nHow to fix: Pass one of those flags or set transport.device.".to_string();
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

/// Stable exit codes: 3 for configuration, 4 for transport, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if is_config_error(err) {
        return EXIT_CONFIG;
    }
    if matches!(
        err.downcast_ref::<TrainerError>(),
        Some(TrainerError::Transport(_) | TrainerError::Timeout)
    ) {
        return EXIT_TRANSPORT;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if is_config_error(err) {
        return "Config";
    }
    match err.downcast_ref::<TrainerError>() {
        Some(TrainerError::Transport(_)) => "Transport",
        Some(TrainerError::Timeout) => "Timeout",
        Some(TrainerError::NotConnected) => "NotConnected",
        Some(TrainerError::AlreadyConnected) => "AlreadyConnected",
        Some(TrainerError::StepOutOfRange { .. }) => "StepOutOfRange",
        Some(TrainerError::UnknownSubStep(_)) => "UnknownSubStep",
        _ => "Error",
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
