/// Niceness requested while a run is live.
#[cfg(unix)]
const RUN_NICENESS_BOOST: libc::c_int = 10;

/// Raises the scheduling priority of this process until dropped.
///
/// Best effort: unprivileged users usually may not lower their niceness, in
/// which case the guard does nothing.
#[derive(Debug)]
pub struct PriorityGuard {
    previous: Option<i32>,
}

impl PriorityGuard {
    pub fn raise() -> Self {
        Self {
            previous: raise_process_priority(),
        }
    }

    /// True if the priority was actually changed.
    pub fn is_active(&self) -> bool {
        self.previous.is_some()
    }
}

impl Drop for PriorityGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            restore_process_priority(previous);
        }
    }
}

#[cfg(unix)]
fn raise_process_priority() -> Option<i32> {
    let previous = unsafe { libc::getpriority(libc::PRIO_PROCESS, 0) };
    let target = (previous - RUN_NICENESS_BOOST).max(-20);
    let rc = unsafe { libc::setpriority(libc::PRIO_PROCESS, 0, target) };
    if rc != 0 {
        log::debug!(
            "could not raise process priority: {}",
            std::io::Error::last_os_error()
        );
        return None;
    }
    log::debug!("process niceness {} -> {}", previous, target);
    Some(previous)
}

#[cfg(unix)]
fn restore_process_priority(previous: i32) {
    let rc = unsafe { libc::setpriority(libc::PRIO_PROCESS, 0, previous) };
    if rc != 0 {
        log::warn!(
            "could not restore process niceness {}: {}",
            previous,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn raise_process_priority() -> Option<i32> {
    None
}

#[cfg(not(unix))]
fn restore_process_priority(_previous: i32) {}
