//! SIGINT / SIGTERM capture.
//!
//! The handler only records the signal number; the reactor polls [`take`] and
//! treats a hit exactly like a Quit from the menu.

use std::sync::atomic::{AtomicI32, Ordering};

use anyhow::Result;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

// 0 means "nothing pending"
static RECEIVED_SIGNAL: AtomicI32 = AtomicI32::new(0);

extern "C" fn record(sig: i32) {
    RECEIVED_SIGNAL.store(sig, Ordering::SeqCst);
}

pub fn install_handlers() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(record),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    for sig in [Signal::SIGINT, Signal::SIGTERM] {
        // SAFETY: the handler only performs an atomic store.
        unsafe { signal::sigaction(sig, &action) }
            .map_err(|e| anyhow::anyhow!("Failed to register {sig} handler: {e}"))?;
    }
    Ok(())
}

/// Non-blocking check; returns a received signal once.
pub fn take() -> Option<Signal> {
    let val = RECEIVED_SIGNAL.swap(0, Ordering::AcqRel);
    if val == 0 {
        return None;
    }
    match Signal::try_from(val) {
        Ok(sig) => Some(sig),
        Err(e) => {
            log::error!("BUG: invalid signal number {val} from signal handler: {e}");
            None
        }
    }
}
