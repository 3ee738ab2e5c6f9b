//! Human-readable error descriptions and structured JSON error formatting.

use glass_core::{Fatal, GlassError};

/// Stable short name for JSON output.
pub fn fatal_reason_name(f: &Fatal) -> &'static str {
    match f {
        Fatal::ConfigChanged => "ConfigChanged",
        Fatal::RadarFault { .. } => "RadarFault",
        Fatal::ActuatorExited { .. } => "ActuatorExited",
        Fatal::ActuatorLink(_) => "ActuatorLink",
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(f) = err.downcast_ref::<Fatal>() {
        return match f {
            Fatal::ConfigChanged => "What happened: The configuration file changed while running.\nLikely causes: The config was edited or redeployed.\nHow to fix: Nothing; the supervisor restarts the service with the new file.".to_string(),
            Fatal::RadarFault { radar, failures } => format!(
                "What happened: Radar {radar} failed {failures} consecutive polls.\nLikely causes: Sensor unplugged, wrong device in [radar_{radar}], or UART noise.\nHow to fix: Check the cable and the device path; raise radar_{radar}.max_frame_failures only if the link is known to be flaky."
            ),
            Fatal::ActuatorExited { code } => {
                let how = code.map_or_else(
                    || "it was killed by a signal".to_string(),
                    |c| format!("its exit code is {c}"),
                );
                format!(
                    "What happened: The actuator process exited ({how}).\nLikely causes: GPIO access denied, invalid [actuator] values after an edit, or the process was killed.\nHow to fix: Check the actuator's log lines above this one, then restart."
                )
            }
            Fatal::ActuatorLink(msg) => format!(
                "What happened: Lost the command pipe to the actuator ({msg}).\nLikely causes: The actuator process crashed between two ticks.\nHow to fix: Check the actuator's log lines above this one, then restart."
            ),
        };
    }

    if let Some(ge) = err.downcast_ref::<GlassError>() {
        return match ge {
            GlassError::HardwareFault(msg) | GlassError::Hardware(msg) => format!(
                "What happened: Drive line error ({msg}).\nLikely causes: Wrong pin numbers or no permission to access GPIO.\nHow to fix: Fix enable_pin/a_pin/b_pin in [actuator]; run as a user in the gpio group."
            ),
            GlassError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun `glass self-check`."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.starts_with("read config") {
        return format!(
            "What happened: Could not read the config file ({msg}).\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Pass --config FILE pointing at a readable TOML file."
        );
    }

    if lower.starts_with("parse config") || lower.contains(" must ") {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nLikely causes: Missing [radar_1]/[radar_2] keys, a typo, or out-of-range values.\nHow to fix: Edit the TOML config and check it with `glass self-check`."
        );
    }

    if lower.contains("open gpio") || lower.contains("open drive pin") {
        return "What happened: Failed to initialize the drive pins.\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the pins in [actuator]; ensure the process has permission to access GPIO.".to_string();
    }

    if lower.contains("spawn actuator") {
        return format!(
            "What happened: Could not start the actuator process ({msg}).\nLikely causes: The glass binary was moved or replaced while running.\nHow to fix: Reinstall the binary and restart the service."
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

/// Every failure of this long-running service is reported as 1 for the supervisor.
pub fn exit_code_for_error(_err: &eyre::Report) -> i32 {
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    if let Some(f) = err.downcast_ref::<Fatal>() {
        let details = match f {
            Fatal::RadarFault { radar, failures } => {
                Some(json!({ "radar": radar, "failures": failures }))
            }
            Fatal::ActuatorExited { code } => Some(json!({ "exit_code": code })),
            _ => None,
        };
        let mut obj = json!({ "reason": fatal_reason_name(f), "message": humanize(err) });
        if let Some(d) = details {
            obj["details"] = d;
        }
        return obj.to_string();
    }

    json!({ "reason": "Error", "message": humanize(err) }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actuator_exit_mentions_the_code() {
        let err = eyre::Report::new(Fatal::ActuatorExited { code: Some(2) });
        assert!(humanize(&err).contains("its exit code is 2"));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "ActuatorExited");
        assert_eq!(v["details"]["exit_code"], 2);
    }

    #[test]
    fn validation_messages_are_classified_as_config() {
        let err = eyre::eyre!("radar_1.max_frame_failures must be >= 1");
        assert!(humanize(&err).starts_with("What happened: Configuration is invalid"));
        assert_eq!(exit_code_for_error(&err), 1);
    }
}
