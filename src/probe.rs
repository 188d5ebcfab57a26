//! Service status probe: is the daemon's server process alive?

use crate::config::TrayConfig;
use crate::exec::CommandRunner;
use crate::state::ServiceState;

pub struct StatusProber<'a, R: ?Sized> {
    runner: &'a R,
    cfg: &'a TrayConfig,
}

impl<'a, R: CommandRunner + ?Sized> StatusProber<'a, R> {
    pub fn new(runner: &'a R, cfg: &'a TrayConfig) -> Self {
        Self { runner, cfg }
    }

    /// True iff the process search exits zero.
    ///
    /// "Not found", a missing search utility and a timeout all read as stopped.
    pub fn is_running(&self) -> bool {
        match self
            .runner
            .run(&self.cfg.probe_program, &self.cfg.probe_args, self.cfg.probe_timeout)
        {
            Ok(()) => true,
            Err(e) => {
                log::debug!("probe negative: {e}");
                false
            }
        }
    }

    pub fn probe(&self) -> ServiceState {
        ServiceState::from_running(self.is_running())
    }
}
