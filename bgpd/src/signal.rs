use std::io::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

extern "C" fn handle(_sig: libc::c_int) {
    // A store on an atomic is async-signal-safe.
    SHUTDOWN.store(true, Ordering::Release);
}

/// Install SIGINT and SIGTERM handlers that flip the shutdown flag the
/// router loop polls on every tick.
pub fn arm() -> Result<&'static AtomicBool> {
    let handler: extern "C" fn(libc::c_int) = handle;
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = handler as libc::sighandler_t;
        libc::sigemptyset(&mut sa.sa_mask);
        for sig in [libc::SIGINT, libc::SIGTERM] {
            if libc::sigaction(sig, &sa, std::ptr::null_mut()) != 0 {
                return Err(Error::last_os_error());
            }
        }
    }
    Ok(&SHUTDOWN)
}
