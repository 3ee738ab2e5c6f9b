use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum GlassError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
    #[error("io error: {0}")]
    Io(String),
}

/// Conditions that end the orchestrator process. Restart is left to the
/// external supervisor; nothing in this crate retries them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Fatal {
    #[error("configuration file changed; restart required")]
    ConfigChanged,
    #[error("radar {radar} failed {failures} consecutive polls")]
    RadarFault { radar: u8, failures: u32 },
    #[error("actuator process exited ({})", describe_exit(.code))]
    ActuatorExited { code: Option<i32> },
    #[error("actuator link broken: {0}")]
    ActuatorLink(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("its exit code is {c}"),
        None => "terminated by signal".to_string(),
    }
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
