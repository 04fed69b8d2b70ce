//! SIGINT/SIGTERM handling for a panel session.
//!
//! The handler records the request and shuts the panel socket down. That wakes the
//! reader thread with end-of-file, which ends the session; the binary then checks
//! [`termination_requested`] to exit cleanly instead of reporting a failure.

use anyhow::{anyhow, Result};
use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

static TERMINATION_REQUESTED: AtomicBool = AtomicBool::new(false);
static PANEL_FD: AtomicI32 = AtomicI32::new(-1);

extern "C" fn handle_termination(_: libc::c_int) {
    TERMINATION_REQUESTED.store(true, Ordering::SeqCst);
    let fd = PANEL_FD.load(Ordering::SeqCst);
    if fd >= 0 {
        // SAFETY: shutdown(2) is async-signal-safe and only affects the socket.
        unsafe {
            libc::shutdown(fd, libc::SHUT_RDWR);
        }
    }
}

/// Route SIGINT and SIGTERM to a clean shutdown of the socket behind `fd`.
pub fn install_termination_handlers(fd: RawFd) -> Result<()> {
    PANEL_FD.store(fd, Ordering::SeqCst);
    for signal in [libc::SIGINT, libc::SIGTERM] {
        unsafe {
            // SAFETY: handle_termination only touches atomics and calls shutdown(2),
            // both async-signal-safe.
            let handler = handle_termination as *const () as libc::sighandler_t;
            if libc::signal(signal, handler) == libc::SIG_ERR {
                tracing::error!(signal, "failed to install termination handler");
                return Err(anyhow!("failed to install handler for signal {signal}"));
            }
        }
    }
    Ok(())
}

pub fn termination_requested() -> bool {
    TERMINATION_REQUESTED.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::os::unix::io::AsRawFd;
    use std::os::unix::net::UnixStream;

    #[test]
    fn handler_shuts_down_the_socket() {
        let (ours, _theirs) = UnixStream::pair().unwrap();
        install_termination_handlers(ours.as_raw_fd()).unwrap();
        handle_termination(libc::SIGTERM);
        assert!(termination_requested());
        let mut buf = [0u8; 1];
        assert_eq!((&ours).read(&mut buf).unwrap(), 0);
        PANEL_FD.store(-1, Ordering::SeqCst);
        TERMINATION_REQUESTED.store(false, Ordering::SeqCst);
        for signal in [libc::SIGINT, libc::SIGTERM] {
            unsafe {
                libc::signal(signal, libc::SIG_DFL);
            }
        }
    }
}
