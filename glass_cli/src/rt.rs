//! Real-time scheduling for the actuator process (Linux SCHED_FIFO /
//! affinity / mlockall; macOS mlockall only).
//!
//! Every step is best effort: a failure is logged and the process carries on
//! with normal scheduling.

use crate::cli::RtLock;

#[derive(Debug, Clone, Copy)]
pub struct RtOptions {
    pub prio: Option<i32>,
    pub lock: RtLock,
    pub cpu: Option<usize>,
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
fn last_os_error(rc: libc::c_int) -> std::io::Result<()> {
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
fn lock_memory(lock: RtLock) -> std::io::Result<()> {
    use libc::{MCL_CURRENT, MCL_FUTURE, mlockall};
    let flags = match lock {
        RtLock::None => return Ok(()),
        RtLock::Current => MCL_CURRENT,
        RtLock::All => MCL_CURRENT | MCL_FUTURE,
    };
    // SAFETY: mlockall only takes flags and touches no caller memory.
    last_os_error(unsafe { mlockall(flags) })
}

#[cfg(target_os = "linux")]
fn memlock_hint() -> String {
    let mut rlim = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: rlim is a valid, writable rlimit.
    let rc = unsafe { libc::getrlimit(libc::RLIMIT_MEMLOCK, &mut rlim) };
    match rc {
        0 if rlim.rlim_cur == libc::RLIM_INFINITY => "memlock limit: unlimited".to_string(),
        0 => format!("memlock limit: {} KiB", rlim.rlim_cur / 1024),
        _ => "memlock limit unknown".to_string(),
    }
}

#[cfg(target_os = "linux")]
fn fifo_priority(prio: Option<i32>) -> std::io::Result<i32> {
    use libc::{SCHED_FIFO, sched_get_priority_max, sched_get_priority_min, sched_param};
    // SAFETY: plain queries without pointers.
    let (min, max) = unsafe { (sched_get_priority_min(SCHED_FIFO), sched_get_priority_max(SCHED_FIFO)) };
    let (min, max) = if min < 0 || max < 0 { (1, 99) } else { (min, max) };
    let prio = prio.unwrap_or(max).clamp(min, max);
    let param = sched_param {
        sched_priority: prio,
    };
    // SAFETY: param outlives the call; pid 0 is the calling process.
    last_os_error(unsafe { libc::sched_setscheduler(0, SCHED_FIFO, &param) })?;
    Ok(prio)
}

#[cfg(target_os = "linux")]
fn pin_to_cpu(cpu: usize) -> eyre::Result<()> {
    let bits = std::mem::size_of::<libc::cpu_set_t>() * 8;
    if cpu >= bits {
        eyre::bail!("CPU {cpu} exceeds cpu_set_t capacity {bits}");
    }
    // SAFETY: an all-zero cpu_set_t is the empty set.
    let mut allowed: libc::cpu_set_t = unsafe { std::mem::zeroed() };
    // SAFETY: `allowed` is a valid cpu_set_t of the size passed.
    let rc = unsafe {
        libc::sched_getaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &mut allowed)
    };
    last_os_error(rc)?;
    // SAFETY: cpu < bits was checked above.
    if !unsafe { libc::CPU_ISSET(cpu, &allowed) } {
        eyre::bail!("CPU {cpu} not permitted by current affinity mask");
    }
    // SAFETY: as above.
    let mut wanted: libc::cpu_set_t = unsafe { std::mem::zeroed() };
    // SAFETY: cpu < bits.
    unsafe { libc::CPU_SET(cpu, &mut wanted) };
    // SAFETY: `wanted` is a valid cpu_set_t of the size passed.
    let rc = unsafe { libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &wanted) };
    last_os_error(rc)?;
    Ok(())
}

/// Apply real-time settings to the current process, once.
#[cfg(target_os = "linux")]
pub fn setup_rt_once(opts: RtOptions) {
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    RT_ONCE.get_or_init(|| {
        match lock_memory(opts.lock) {
            Ok(()) => tracing::info!(mode = ?opts.lock, "RT: memory lock applied"),
            Err(e) => tracing::warn!(
                error = %e,
                hint = %memlock_hint(),
                "RT: mlockall failed; needs CAP_IPC_LOCK (or root) and a sufficient 'ulimit -l'"
            ),
        }
        match fifo_priority(opts.prio) {
            Ok(prio) => tracing::info!(prio, "RT: SCHED_FIFO enabled"),
            Err(e) => tracing::warn!(
                error = %e,
                "RT: sched_setscheduler(SCHED_FIFO) failed; needs CAP_SYS_NICE or root"
            ),
        }
        let cpu = opts.cpu.unwrap_or(0);
        match pin_to_cpu(cpu) {
            Ok(()) => tracing::info!(cpu, "RT: pinned to CPU"),
            Err(e) => tracing::warn!(error = %e, "RT: affinity not applied"),
        }
    });
}

#[cfg(target_os = "macos")]
pub fn setup_rt_once(opts: RtOptions) {
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    RT_ONCE.get_or_init(|| {
        match lock_memory(opts.lock) {
            Ok(()) => tracing::info!(mode = ?opts.lock, "RT: memory lock applied"),
            Err(e) => tracing::warn!(error = %e, "RT: mlockall failed"),
        }
        tracing::warn!("RT: macOS does not support SCHED_FIFO or affinity; only mlockall applied");
    });
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub fn setup_rt_once(opts: RtOptions) {
    tracing::warn!(?opts, "RT: real-time mode is not supported on this OS");
}
