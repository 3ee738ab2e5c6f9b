//! Orchestrator → actuator command channel.
//!
//! Wire format: one command per line, `on` or `off`, case-insensitive,
//! surrounding whitespace ignored. Anything else is dropped.
//!
//! On the actuator side a listener thread reads stdin and posts into a
//! single-slot `Mailbox`. The slot stays occupied until the main loop has
//! finished executing the command, so at most one command is ever
//! outstanding and the listener backs off instead of overwriting it.

use std::fmt;
use std::io::{BufRead, ErrorKind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    On,
    Off,
}

impl Command {
    pub const fn as_str(self) -> &'static str {
        match self {
            Command::On => "on",
            Command::Off => "off",
        }
    }

    /// Parse one received line; `None` for anything unrecognized.
    pub fn parse_line(line: &str) -> Option<Self> {
        let word = line.trim();
        if word.eq_ignore_ascii_case("on") {
            Some(Command::On)
        } else if word.eq_ignore_ascii_case("off") {
            Some(Command::Off)
        } else {
            None
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content of the mailbox slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Empty,
    Pending(Command),
    /// The command stream ended; no further commands will arrive.
    Closed,
}

const EMPTY: u8 = 0;
const ON: u8 = 1;
const OFF: u8 = 2;
const CLOSED: u8 = 3;

const fn encode(cmd: Command) -> u8 {
    match cmd {
        Command::On => ON,
        Command::Off => OFF,
    }
}

/// Single-producer/single-consumer command slot.
///
/// The listener is the only writer of commands (`post`, `close`); the main
/// loop is the only one to `complete` them. Clones share the slot.
#[derive(Debug, Clone, Default)]
pub struct Mailbox {
    slot: Arc<AtomicU8>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peek(&self) -> Slot {
        match self.slot.load(Ordering::Acquire) {
            ON => Slot::Pending(Command::On),
            OFF => Slot::Pending(Command::Off),
            CLOSED => Slot::Closed,
            _ => Slot::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slot.load(Ordering::Acquire) == EMPTY
    }

    /// Put `cmd` in the slot. Fails, handing the command back, while the
    /// slot is occupied.
    pub fn post(&self, cmd: Command) -> Result<(), Command> {
        self.slot
            .compare_exchange(EMPTY, encode(cmd), Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| cmd)
    }

    /// Clear a pending command once it has been executed. A closed slot stays closed.
    pub fn complete(&self) {
        let _ = self
            .slot
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| match v {
                ON | OFF => Some(EMPTY),
                _ => None,
            });
    }

    pub fn close(&self) {
        self.slot.store(CLOSED, Ordering::Release);
    }
}

const MIN_BACKOFF: Duration = Duration::from_millis(1);

/// Read commands from `reader` until end of stream, posting each into `mailbox`.
///
/// While the slot is occupied no line is read; `backoff` (at least 1 ms) is
/// slept between checks. On end of stream (or an unrecoverable read error)
/// the mailbox is closed and the function returns.
pub fn listen<R: BufRead>(mut reader: R, mailbox: &Mailbox, backoff: Duration) {
    // a zero sleep never yields the CPU to the drive loop
    let backoff = backoff.max(MIN_BACKOFF);
    let mut line = String::new();
    loop {
        while !mailbox.is_empty() {
            std::thread::sleep(backoff);
        }

        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => {
                info!("command stream closed");
                mailbox.close();
                return;
            }
            Ok(_) => match Command::parse_line(&line) {
                Some(cmd) => {
                    debug!(%cmd, "command received");
                    if let Err(cmd) = mailbox.post(cmd) {
                        warn!(%cmd, "mailbox unexpectedly occupied; command dropped");
                    }
                }
                None => trace!(line = line.trim(), "ignoring unrecognized command"),
            },
            // a line that is not UTF-8 is just another unrecognized line
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                trace!("ignoring non-UTF-8 command line");
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => {
                warn!(error = %e, "command stream failed");
                mailbox.close();
                return;
            }
        }
    }
}

/// Spawn the listener on its own named thread.
pub fn spawn_listener<R: BufRead + Send + 'static>(
    reader: R,
    mailbox: Mailbox,
    backoff: Duration,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("cmd-listener".into())
        .spawn(move || listen(reader, &mailbox, backoff))
}
