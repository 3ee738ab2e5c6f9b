//! Subscriber setup: console layer plus optional (rotating) JSON file layer.

use std::path::Path;

use glass_config::Logging;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::cli::FILE_GUARD;

/// Which process is logging. Each role writes its own log file so the
/// orchestrator and its actuator child never share an appender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Orchestrator,
    Actuator,
}

fn rolling_appender(
    file: &Path,
    role: Role,
    rotation: Option<&str>,
) -> tracing_appender::rolling::RollingFileAppender {
    let dir = file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = file
        .file_name()
        .map_or_else(|| "glass.log".to_string(), |n| n.to_string_lossy().into_owned());
    let name = match role {
        Role::Orchestrator => name,
        Role::Actuator => format!("actuator-{name}"),
    };
    match rotation {
        Some("daily") => tracing_appender::rolling::daily(dir, name),
        Some("hourly") => tracing_appender::rolling::hourly(dir, name),
        _ => tracing_appender::rolling::never(dir, name),
    }
}

/// Level precedence: `--log-level`, then `RUST_LOG`, then `[logging].level`, then `info`.
fn console_filter(cli_level: Option<&str>, cfg_level: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(level);
    }
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg_level.unwrap_or("info")))
}

pub fn init(role: Role, json: bool, cli_level: Option<&str>, cfg: &Logging) {
    let filter = console_filter(cli_level, cfg.level.as_deref());

    // console output goes to stderr, as it does for the actuator child
    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    };

    let file_layer = cfg.file.as_deref().map(|file| {
        let appender = rolling_appender(Path::new(file), role, cfg.rotation.as_deref());
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(EnvFilter::new(cfg.level.as_deref().unwrap_or("info")))
            .boxed()
    });

    let _ = tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init();
}
