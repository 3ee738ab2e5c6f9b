//! Software-synthesized two-phase drive for the glass film.
//!
//! Each period has two halves. In the first half line A is high for
//! `duty/100` of the half, in the second half line B; the rest of each half
//! is silence. The film sees an AC drive whose RMS follows the duty cycle.
//! Nothing free-runs: the waveform only exists while `cycle()` is called.

use std::time::{Duration, Instant};

use glass_traits::clock::Clock;
use glass_traits::{Level, OutputLines};
use tracing::{debug, info, trace, warn};

use crate::config::ActuatorCfg;
use crate::error::{GlassError, Result};
use crate::hw_error::map_hw_error;

/// Last extreme the ramp completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlassState {
    Off,
    On,
}

/// What a completed ramp took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampReport {
    /// Ramp steps applied (one drive cycle each).
    pub steps: u32,
    pub took: Duration,
}

pub struct ActuatorRamp<L: OutputLines, C: Clock> {
    lines: L,
    clock: C,
    cfg: ActuatorCfg,
    duty: f64,
    state: GlassState,
    logged_duty: Option<f64>,
    cycles: u64,
}

impl<L: OutputLines, C: Clock> ActuatorRamp<L, C> {
    /// Enable the bridge and park both drive lines low. Starts at `dc_off`.
    pub fn new(lines: L, cfg: ActuatorCfg, clock: C) -> Result<Self> {
        let mut ramp = Self {
            lines,
            clock,
            duty: cfg.dc_off,
            cfg,
            state: GlassState::Off,
            logged_duty: None,
            cycles: 0,
        };
        ramp.set(ramp.cfg.enable_pin, Level::High)?;
        ramp.set(ramp.cfg.a_pin, Level::Low)?;
        ramp.set(ramp.cfg.b_pin, Level::Low)?;
        Ok(ramp)
    }

    fn set(&mut self, pin: u8, level: Level) -> Result<()> {
        self.lines
            .set_line(pin, level)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
    }

    /// Drive one full period at the current duty.
    pub fn cycle(&mut self) -> Result<()> {
        let half = self.cfg.half_period();
        let fraction = (self.duty / 100.0).clamp(0.0, 1.0);
        let pulse = half.mul_f64(fraction);

        if self.logged_duty != Some(self.duty) {
            debug!(duty = self.duty, "drive duty");
            self.logged_duty = Some(self.duty);
        }
        trace!(duty = self.duty, pulse_us = pulse.as_micros() as u64, "drive cycle");
        self.cycles = self.cycles.wrapping_add(1);

        if pulse.is_zero() {
            self.clock.sleep(half * 2);
            return Ok(());
        }

        let start = self.clock.now();
        self.half_wave(self.cfg.a_pin, start, pulse)?;
        self.half_wave(self.cfg.b_pin, start + half, pulse)?;
        self.clock.sleep_until(start + half * 2);
        Ok(())
    }

    fn half_wave(&mut self, pin: u8, phase_start: Instant, pulse: Duration) -> Result<()> {
        self.clock.sleep_until(phase_start);
        self.set(pin, Level::High)?;
        self.clock.sleep_until(phase_start + pulse);
        self.set(pin, Level::Low)
    }

    /// One ramp step toward ON, clamped at `dc_on`.
    pub fn step_up(&mut self) -> f64 {
        let d = self.cfg.ramp_up.delta_up(self.duty);
        self.duty = (self.duty + d).min(self.cfg.dc_on);
        self.duty
    }

    /// One ramp step toward OFF, clamped at `dc_off`.
    pub fn step_down(&mut self) -> f64 {
        let d = self.cfg.ramp_down.delta_down(self.duty);
        self.duty = (self.duty - d).max(self.cfg.dc_off);
        self.duty
    }

    /// Ramp to `dc_on`, driving one cycle before every step.
    pub fn turn_on(&mut self) -> Result<RampReport> {
        let start = self.clock.now();
        let mut steps = 0u32;
        while self.duty < self.cfg.dc_on {
            self.cycle()?;
            self.step_up();
            steps += 1;
        }
        self.state = GlassState::On;
        let took = self.clock.now().saturating_duration_since(start);
        info!(steps, ?took, "glass ON");
        Ok(RampReport { steps, took })
    }

    /// Ramp to `dc_off`, driving one cycle before every step.
    pub fn turn_off(&mut self) -> Result<RampReport> {
        let start = self.clock.now();
        let mut steps = 0u32;
        while self.duty > self.cfg.dc_off {
            self.cycle()?;
            self.step_down();
            steps += 1;
        }
        self.state = GlassState::Off;
        let took = self.clock.now().saturating_duration_since(start);
        info!(steps, ?took, "glass OFF");
        Ok(RampReport { steps, took })
    }

    /// Swap in a freshly loaded config. Drive pins are claimed once and
    /// cannot move at runtime. A duty left outside the new bounds is ramped
    /// back in with the new tables, one cycle per step.
    pub fn reload(&mut self, mut cfg: ActuatorCfg) -> Result<()> {
        if (cfg.enable_pin, cfg.a_pin, cfg.b_pin)
            != (self.cfg.enable_pin, self.cfg.a_pin, self.cfg.b_pin)
        {
            warn!("drive pin changes need a restart; keeping current pins");
            cfg.enable_pin = self.cfg.enable_pin;
            cfg.a_pin = self.cfg.a_pin;
            cfg.b_pin = self.cfg.b_pin;
        }
        self.cfg = cfg;
        info!("actuator config reloaded");

        let mut steps = 0u32;
        while self.duty > self.cfg.dc_on {
            self.cycle()?;
            let d = self.cfg.ramp_down.delta_down(self.duty);
            self.duty = (self.duty - d).max(self.cfg.dc_on);
            steps += 1;
        }
        while self.duty < self.cfg.dc_off {
            self.cycle()?;
            let d = self.cfg.ramp_up.delta_up(self.duty);
            self.duty = (self.duty + d).min(self.cfg.dc_off);
            steps += 1;
        }
        if steps > 0 {
            info!(steps, duty = self.duty, "duty ramped into the new bounds");
        }
        Ok(())
    }

    /// Park all lines low, disabling the bridge.
    pub fn shutdown(&mut self) -> Result<()> {
        self.set(self.cfg.a_pin, Level::Low)?;
        self.set(self.cfg.b_pin, Level::Low)?;
        self.set(self.cfg.enable_pin, Level::Low)
    }

    pub fn duty(&self) -> f64 {
        self.duty
    }

    pub fn state(&self) -> GlassState {
        self.state
    }

    pub fn cfg(&self) -> &ActuatorCfg {
        &self.cfg
    }

    /// Drive cycles executed since construction.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Fail if the duty ever escaped its bounds; used by the main loop's
    /// debug checks.
    pub fn check_bounds(&self) -> std::result::Result<(), GlassError> {
        if (self.cfg.dc_off..=self.cfg.dc_on).contains(&self.duty) {
            Ok(())
        } else {
            Err(GlassError::State(format!(
                "duty {} outside [{}, {}]",
                self.duty, self.cfg.dc_off, self.cfg.dc_on
            )))
        }
    }
}
