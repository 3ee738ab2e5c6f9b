//! Actuator child process behind the [`ActuatorLink`] seam.

use std::ffi::OsStr;
use std::io::{self, Write};
use std::process::{Child, ChildStdin, Command as Process, Stdio};

use tracing::{debug, info};

use crate::command::Command;
use crate::orchestrator::{ActuatorExit, ActuatorLink};

/// A spawned actuator process. Its stdin carries the command lines; stdout
/// and stderr are inherited so its logs land next to ours.
pub struct ChildActuator {
    child: Child,
    stdin: Option<ChildStdin>,
}

impl ChildActuator {
    pub fn spawn<I, A>(program: impl AsRef<OsStr>, args: I) -> io::Result<Self>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<OsStr>,
    {
        let mut child = Process::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()?;
        let stdin = child.stdin.take();
        info!(pid = child.id(), "actuator process spawned");
        Ok(Self { child, stdin })
    }

    /// Close the command stream and wait for the process to finish its
    /// OFF ramp.
    pub fn close_and_wait(mut self) -> io::Result<ActuatorExit> {
        drop(self.stdin.take());
        let status = self.child.wait()?;
        Ok(ActuatorExit {
            code: status.code(),
        })
    }
}

impl ActuatorLink for ChildActuator {
    fn send(&mut self, cmd: Command) -> io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "actuator stdin closed"))?;
        writeln!(stdin, "{cmd}")?;
        stdin.flush()?;
        debug!(%cmd, "command written to actuator");
        Ok(())
    }

    fn poll_exit(&mut self) -> io::Result<Option<ActuatorExit>> {
        Ok(self.child.try_wait()?.map(|status| ActuatorExit {
            code: status.code(),
        }))
    }
}
