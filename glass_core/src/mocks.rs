//! Test and helper mocks for glass_core.
//!
//! Every mock is `Clone` and shares its state between clones, so a test can
//! keep a handle while the component under test owns the other one.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use glass_traits::{BoxError, FrameSource, Level, OutputLines, RawTarget};

use crate::command::Command;
use crate::orchestrator::{ActuatorExit, ActuatorLink};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct Script {
    queue: VecDeque<Option<Vec<RawTarget>>>,
    idle: Vec<RawTarget>,
    polls: u64,
    pending_bytes: usize,
}

/// Radar that replays queued frames; once the queue is empty it keeps
/// returning the idle frame (empty unless set).
#[derive(Debug, Clone, Default)]
pub struct ScriptedRadar {
    script: Arc<Mutex<Script>>,
}

impl ScriptedRadar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_frame(&self, frame: Vec<RawTarget>) {
        lock(&self.script).queue.push_back(Some(frame));
    }

    pub fn push_failure(&self) {
        lock(&self.script).queue.push_back(None);
    }

    /// Frame returned whenever the queue is empty.
    pub fn set_idle(&self, frame: Vec<RawTarget>) {
        lock(&self.script).idle = frame;
    }

    pub fn set_pending_bytes(&self, n: usize) {
        lock(&self.script).pending_bytes = n;
    }

    pub fn polls(&self) -> u64 {
        lock(&self.script).polls
    }
}

impl FrameSource for ScriptedRadar {
    type Target = RawTarget;

    fn poll_frame(&mut self) -> Result<Vec<RawTarget>, BoxError> {
        let mut s = lock(&self.script);
        s.polls += 1;
        match s.queue.pop_front() {
            Some(Some(frame)) => Ok(frame),
            Some(None) => Err(Box::new(io::Error::new(
                io::ErrorKind::TimedOut,
                "scripted poll failure",
            ))),
            None => Ok(s.idle.clone()),
        }
    }

    fn distance(&self, target: &RawTarget) -> f64 {
        target.distance_mm()
    }

    fn angle(&self, target: &RawTarget) -> f64 {
        target.angle_deg()
    }

    fn pending_bytes(&self) -> usize {
        lock(&self.script).pending_bytes
    }
}

/// Drive lines that record every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingLines {
    calls: Arc<Mutex<Vec<(u8, Level)>>>,
}

impl RecordingLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(u8, Level)> {
        lock(&self.calls).clone()
    }

    /// Number of times `pin` was driven high.
    pub fn pulses(&self, pin: u8) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|&&(p, l)| p == pin && l == Level::High)
            .count()
    }

    pub fn clear(&self) {
        lock(&self.calls).clear();
    }
}

impl OutputLines for RecordingLines {
    fn set_line(&mut self, pin: u8, level: Level) -> Result<(), BoxError> {
        lock(&self.calls).push((pin, level));
        Ok(())
    }
}

#[derive(Debug, Default)]
struct LinkState {
    sent: Vec<Command>,
    exit: Option<ActuatorExit>,
    broken: bool,
}

/// Actuator link that records commands and can simulate the child exiting.
#[derive(Debug, Clone, Default)]
pub struct RecordingLink {
    state: Arc<Mutex<LinkState>>,
}

impl RecordingLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Command> {
        lock(&self.state).sent.clone()
    }

    pub fn exit_with(&self, code: Option<i32>) {
        lock(&self.state).exit = Some(ActuatorExit { code });
    }

    /// Make every following `send` fail like a closed pipe.
    pub fn break_pipe(&self) {
        lock(&self.state).broken = true;
    }
}

impl ActuatorLink for RecordingLink {
    fn send(&mut self, cmd: Command) -> io::Result<()> {
        let mut s = lock(&self.state);
        if s.broken {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "actuator stdin closed"));
        }
        s.sent.push(cmd);
        Ok(())
    }

    fn poll_exit(&mut self) -> io::Result<Option<ActuatorExit>> {
        Ok(lock(&self.state).exit)
    }
}
