//! Human-readable error descriptions and structured JSON error formatting.

use ice_core::error::{BuildError, IceError, RejectReason};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingRcInput => {
                "What happened: No RC input was provided to the engine controller.\nLikely causes: The receiver source was not wired into the builder.\nHow to fix: Pass the RC input via with_rc(...).".to_string()
            }
            BuildError::MissingServos => {
                "What happened: No servo outputs were provided to the engine controller.\nLikely causes: The servo rail was not wired into the builder.\nHow to fix: Pass the outputs via with_servos(...).".to_string()
            }
            BuildError::MissingArming => {
                "What happened: No arming source was provided to the engine controller.\nLikely causes: The arming state was not wired into the builder.\nHow to fix: Pass the arming source via with_arming(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML or on the command line.\nHow to fix: Edit the config file or the arguments, then rerun. Run `ice check-config` to validate."
            ),
        };
    }

    if let Some(ie) = err.downcast_ref::<IceError>() {
        return match ie {
            IceError::Hardware(m) | IceError::HardwareFault(m) => format!(
                "What happened: Actuator or GPIO access failed ({m}).\nLikely causes: Wrong output-enable pin, missing GPIO permissions, or a disconnected servo rail.\nHow to fix: Check engine.output_enable_pin and wiring; ensure the process may access GPIO."
            ),
            IceError::Rejected(RejectReason::StartBlockedBySwitch) => {
                "What happened: Engine start was refused.\nLikely causes: The start switch channel reads OFF.\nHow to fix: Move the start switch to RUN or START before commanding a start.".to_string()
            }
            IceError::Rejected(RejectReason::UnknownGear(code)) => format!(
                "What happened: Transmission command refused (gear code {code}).\nLikely causes: The code is not one of park, reverse, neutral, forward or pwm_value.\nHow to fix: Use a gear code between 1 and 8."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from config or scenario loading
    let msg = err.to_string();
    let chain = err
        .chain()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ");
    let lower = chain.to_ascii_lowercase();

    if lower.contains("scenario csv must have headers") {
        return format!(
            "Invalid headers in scenario CSV. Expected '{}'.",
            ice_config::SCENARIO_HEADERS.join(",")
        );
    }

    if lower.contains("scenario") {
        return format!(
            "What happened: The scenario could not be loaded ({chain}).\nLikely causes: Rows out of time order, malformed numbers, or an unknown command.\nHow to fix: Fix the CSV; commands are start, stop, start_height:<m>, gear:<code>, gear_pwm:<us>."
        );
    }

    if lower.contains("read config") {
        return format!(
            "What happened: The config file could not be read ({chain}).\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Pass --config <FILE> pointing at a readable TOML file."
        );
    }

    if lower.contains("parse config") || lower.contains("invalid configuration") {
        return format!(
            "What happened: Configuration is invalid or incomplete ({chain}).\nLikely causes: Missing [engine] section, a typo in a key, or out-of-range values.\nHow to fix: Edit the TOML config and try again."
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

/// Stable exit codes: 3 for hardware faults, 2 for configuration problems, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(IceError::Hardware(_) | IceError::HardwareFault(_)) = err.downcast_ref::<IceError>()
    {
        return 3;
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    let lower = err.to_string().to_ascii_lowercase();
    if lower.contains("parse config") || lower.contains("invalid configuration") {
        return 2;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::InvalidConfig(_) => "InvalidConfig",
            _ => "MissingCollaborator",
        };
    }
    if let Some(ie) = err.downcast_ref::<IceError>() {
        return match ie {
            IceError::Hardware(_) | IceError::HardwareFault(_) => "Hardware",
            IceError::Rejected(_) => "Rejected",
            IceError::Link(_) => "Link",
        };
    }
    if exit_code_for_error(err) == 2 {
        return "InvalidConfig";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "event": "error",
        "reason": reason_name(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::WrapErr;

    #[test]
    fn build_errors_are_config_errors() {
        let err = eyre::Report::new(BuildError::InvalidConfig("start_pct must be in [0, 100]"));
        assert!(humanize(&err).contains("start_pct must be in [0, 100]"));
        assert_eq!(exit_code_for_error(&err), 2);
        assert!(format_error_json(&err).contains("\"InvalidConfig\""));
    }

    #[test]
    fn hardware_faults_get_their_own_exit_code() {
        let err = eyre::Report::new(IceError::HardwareFault("gpio 17 busy".into()));
        assert_eq!(exit_code_for_error(&err), 3);
        assert!(humanize(&err).starts_with("What happened: Actuator or GPIO access failed"));
    }

    #[test]
    fn validation_failures_wrapped_as_invalid_configuration() {
        let err: eyre::Result<()> = Err(eyre::eyre!("engine.idle_pct must be in [0, 100]"));
        let err = err.wrap_err("invalid configuration").unwrap_err();
        assert_eq!(exit_code_for_error(&err), 2);
        assert!(humanize(&err).contains("engine.idle_pct"));
    }
}
