//! Signal dispositions for the shell and its children.

use std::io;

use log::debug;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

/// Keyboard signals must not kill the shell itself.
pub fn install_signal_handlers() -> io::Result<()> {
    let action = SigAction::new(SigHandler::SigIgn, SaFlags::SA_RESTART, SigSet::empty());
    install_action(Signal::SIGINT, &action)?;
    install_action(Signal::SIGQUIT, &action)?;
    debug!("signal event=install mode=ignore");
    Ok(())
}

/// Restores default dispositions in a forked child before exec; ignored
/// dispositions would otherwise survive the image replacement and make
/// foreground commands immune to Ctrl-C.
pub fn reset_child_signals() {
    let action = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    for &sig in &[Signal::SIGINT, Signal::SIGQUIT] {
        let _ = unsafe { sigaction(sig, &action) };
    }
}

fn install_action(signal: Signal, action: &SigAction) -> io::Result<()> {
    unsafe { sigaction(signal, action) }
        .map(|_| ())
        .map_err(|err| io::Error::other(err.to_string()))
}
