//! # OS shutdown signals.
//!
//! [`wait_for_shutdown_signal`] resolves with the name of the first
//! termination signal the process receives. The [`Runner`](crate::Runner)
//! races it against its turn loop and puts the name into the
//! `ShutdownRequested` notice.
//!
//! | Platform | Signals                               |
//! |----------|---------------------------------------|
//! | Unix     | `SIGINT`, `SIGTERM`, `SIGQUIT`, Ctrl-C |
//! | other    | Ctrl-C                                |

use std::io;

/// Waits for a termination signal and returns its name.
///
/// Fails if a handler cannot be registered.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut int = signal(SignalKind::interrupt())?;
    let mut term = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        res = tokio::signal::ctrl_c() => { res?; "ctrl-c" },
        _ = int.recv() => "SIGINT",
        _ = term.recv() => "SIGTERM",
        _ = quit.recv() => "SIGQUIT",
    };
    Ok(name)
}

/// Waits for Ctrl-C.
#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
