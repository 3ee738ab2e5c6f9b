//! Per-tick telemetry: one human-readable log line plus one fixed-column row.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::command::Command;
use crate::error::{GlassError, Result};
use crate::fusion::RadarSnapshot;

/// Decision inputs and output of one orchestrator tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub glass_on: bool,
    pub cmd_allowed: bool,
    pub both_present: bool,
    pub stuck: bool,
    pub command: Option<Command>,
}

/// One telemetry row. Column order is the serialized field order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryRecord {
    pub timestamp_s: f64,
    pub glass_on: bool,
    pub r1_pending_bytes: usize,
    pub r1_stuck: bool,
    pub r1_distance_raw: Option<f64>,
    pub r1_distance_reliable: f64,
    pub r1_angle_raw: Option<f64>,
    pub r1_angle_reliable: f64,
    pub r1_present: bool,
    pub r1_present_reliable: bool,
    pub r2_pending_bytes: usize,
    pub r2_stuck: bool,
    pub r2_distance_raw: Option<f64>,
    pub r2_distance_reliable: f64,
    pub r2_angle_raw: Option<f64>,
    pub r2_angle_reliable: f64,
    pub r2_present: bool,
    pub r2_present_reliable: bool,
    pub cmd_allowed: bool,
    pub both_present: bool,
    pub stuck: bool,
    pub command: Option<&'static str>,
}

impl TelemetryRecord {
    pub fn new(r1: &RadarSnapshot, r2: &RadarSnapshot, d: &Decision) -> Self {
        let timestamp_s = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|t| t.as_secs_f64())
            .unwrap_or(0.0);
        Self {
            timestamp_s,
            glass_on: d.glass_on,
            r1_pending_bytes: r1.pending_bytes,
            r1_stuck: r1.stuck,
            r1_distance_raw: r1.raw.map(|r| r.distance),
            r1_distance_reliable: r1.reliable_distance,
            r1_angle_raw: r1.raw.map(|r| r.angle_abs),
            r1_angle_reliable: r1.reliable_angle_abs,
            r1_present: r1.raw_present,
            r1_present_reliable: r1.reliable_present,
            r2_pending_bytes: r2.pending_bytes,
            r2_stuck: r2.stuck,
            r2_distance_raw: r2.raw.map(|r| r.distance),
            r2_distance_reliable: r2.reliable_distance,
            r2_angle_raw: r2.raw.map(|r| r.angle_abs),
            r2_angle_reliable: r2.reliable_angle_abs,
            r2_present: r2.raw_present,
            r2_present_reliable: r2.reliable_present,
            cmd_allowed: d.cmd_allowed,
            both_present: d.both_present,
            stuck: d.stuck,
            command: d.command.map(Command::as_str),
        }
    }

    /// Console rendering, e.g.
    /// `glass  ON | [1]    0 | ----- |   812 /  1400 |    3 /    9 | yes | [2] ...`
    pub fn human_line(&self) -> String {
        #[allow(clippy::too_many_arguments)]
        fn radar(
            idx: u8,
            pending: usize,
            stuck: bool,
            d_raw: Option<f64>,
            d_rel: f64,
            a_raw: Option<f64>,
            a_rel: f64,
            present: bool,
        ) -> String {
            let d_raw = d_raw.map_or_else(|| "-----".to_string(), |v| format!("{v:5.0}"));
            let a_raw = a_raw.map_or_else(|| "----".to_string(), |v| format!("{v:4.0}"));
            format!(
                "[{idx}] {pending:4} | {} | {d_raw} / {d_rel:5.0} | {a_raw} / {a_rel:4.0} | {}",
                if stuck { "stuck" } else { "-----" },
                if present { "yes" } else { " no" },
            )
        }
        format!(
            "glass {} | {} | {} | cmd_allowed: {} | both_present: {} | stuck: {} | cmd: {}",
            if self.glass_on { " ON" } else { "OFF" },
            radar(
                1,
                self.r1_pending_bytes,
                self.r1_stuck,
                self.r1_distance_raw,
                self.r1_distance_reliable,
                self.r1_angle_raw,
                self.r1_angle_reliable,
                self.r1_present_reliable,
            ),
            radar(
                2,
                self.r2_pending_bytes,
                self.r2_stuck,
                self.r2_distance_raw,
                self.r2_distance_reliable,
                self.r2_angle_raw,
                self.r2_angle_reliable,
                self.r2_present_reliable,
            ),
            if self.cmd_allowed { "yes" } else { " no" },
            self.both_present,
            self.stuck,
            self.command.unwrap_or("-"),
        )
    }
}

/// Destination for machine-readable rows.
pub trait TelemetrySink {
    fn record(&mut self, rec: &TelemetryRecord) -> Result<()>;
}

/// Append-only CSV file, one per session, flushed after every row.
pub struct CsvTelemetry {
    writer: csv::Writer<File>,
    path: PathBuf,
}

impl CsvTelemetry {
    /// Create `telemetry-<unix seconds>.csv` in `dir`.
    pub fn create_session(dir: &Path) -> Result<Self> {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|t| t.as_secs())
            .unwrap_or(0);
        Self::create(&dir.join(format!("telemetry-{secs}.csv")))
    }

    pub fn create(path: &Path) -> Result<Self> {
        let file = File::options()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| GlassError::Io(format!("open telemetry {}: {e}", path.display())))?;
        Ok(Self {
            writer: csv::Writer::from_writer(file),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TelemetrySink for CsvTelemetry {
    fn record(&mut self, rec: &TelemetryRecord) -> Result<()> {
        self.writer
            .serialize(rec)
            .map_err(|e| GlassError::Io(format!("write telemetry: {e}")))?;
        self.writer
            .flush()
            .map_err(|e| GlassError::Io(format!("flush telemetry: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::RawReading;

    fn snapshot(raw: Option<RawReading>, present: bool) -> RadarSnapshot {
        RadarSnapshot {
            pending_bytes: 12,
            stuck: false,
            raw,
            reliable_distance: 1400.0,
            reliable_angle_abs: 9.0,
            raw_present: present,
            reliable_present: present,
            consecutive_failures: 0,
        }
    }

    #[test]
    fn human_line_marks_absent_raw_values() {
        let r1 = snapshot(
            Some(RawReading {
                distance: 812.0,
                angle_abs: 3.0,
            }),
            true,
        );
        let r2 = snapshot(None, false);
        let d = Decision {
            glass_on: true,
            cmd_allowed: false,
            both_present: false,
            stuck: false,
            command: None,
        };
        let line = TelemetryRecord::new(&r1, &r2, &d).human_line();
        assert!(line.starts_with("glass  ON | [1]   12 | ----- |   812 /  1400 |    3 /    9 | yes"));
        assert!(line.contains("[2]   12 | ----- | ----- /  1400 | ---- /    9 |  no"));
        assert!(line.ends_with("cmd: -"));
    }
}
