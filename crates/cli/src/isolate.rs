//! Scoped file-descriptor redirection.
//!
//! The extraction call runs third-party code that may print to fd 1. While
//! it runs, fd 1 is pointed at fd 2's destination so the only thing that
//! ever reaches stdout is the gist itself.

use std::future::Future;
use std::io::{self, Write};
use std::os::fd::RawFd;

use tracing::{error, warn};

/// Redirects `target` to `source`'s destination until dropped.
///
/// Buffered Rust stdout is flushed before the swap and again before the
/// original destination is restored, so nothing crosses the boundary.
#[derive(Debug)]
pub struct FdRedirect {
    target: RawFd,
    saved: RawFd,
}

impl FdRedirect {
    pub fn acquire(target: RawFd, source: RawFd) -> io::Result<Self> {
        io::stdout().flush()?;

        let saved = unsafe { libc::dup(target) };
        if saved < 0 {
            return Err(io::Error::last_os_error());
        }

        if unsafe { libc::dup2(source, target) } < 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(saved) };
            return Err(err);
        }

        Ok(Self { target, saved })
    }
}

impl Drop for FdRedirect {
    fn drop(&mut self) {
        let _ = io::stdout().flush();

        if unsafe { libc::dup2(self.saved, self.target) } < 0 {
            error!(
                component = "isolate",
                event = "isolate.restore_failed",
                fd = self.target,
                error = %io::Error::last_os_error(),
                "Failed to restore redirected file descriptor"
            );
        }
        unsafe { libc::close(self.saved) };
    }
}

/// Run `fut` with `target` redirected to `source`.
///
/// If the redirect cannot be set up the future still runs, unisolated.
pub async fn with_redirect<F: Future>(target: RawFd, source: RawFd, fut: F) -> F::Output {
    let guard = match FdRedirect::acquire(target, source) {
        Ok(guard) => Some(guard),
        Err(e) => {
            warn!(
                component = "isolate",
                event = "isolate.acquire_failed",
                fd = target,
                error = %e,
                "Running without output isolation"
            );
            None
        }
    };

    let output = fut.await;
    drop(guard);
    output
}

/// Run `fut` with stdout isolated onto stderr.
pub async fn isolated<F: Future>(fut: F) -> F::Output {
    with_redirect(libc::STDOUT_FILENO, libc::STDERR_FILENO, fut).await
}
