//! Service lifecycle control - delegates to the OS service manager
//!
//! Every verb is wrapped in the privilege-escalation launcher, so the user is
//! prompted by the desktop's authentication agent (`pkexec systemctl <verb> <unit>`).

use std::thread;

use crate::config::TrayConfig;
use crate::exec::{CommandResult, CommandRunner};

pub struct ServiceController<'a, R: ?Sized> {
    runner: &'a R,
    cfg: &'a TrayConfig,
}

impl<'a, R: CommandRunner + ?Sized> ServiceController<'a, R> {
    pub fn new(runner: &'a R, cfg: &'a TrayConfig) -> Self {
        Self { runner, cfg }
    }

    /// Start the service.
    ///
    /// Returns as soon as the launcher is spawned, not once the service is up.
    pub fn start_service(&self) -> CommandResult {
        let result = self
            .runner
            .start(&self.cfg.launcher, &self.cfg.start_args());
        match &result {
            Ok(()) => log::info!("{} service started", self.cfg.title),
            Err(e) => log::error!("Failed to start {}: {e}", self.cfg.title),
        }
        result
    }

    /// Stop the service and wait for the launcher, bounded by `stop_timeout`.
    pub fn stop_service(&self) -> CommandResult {
        let result = self.runner.run(
            &self.cfg.launcher,
            &self.cfg.stop_args(),
            self.cfg.stop_timeout,
        );
        match &result {
            Ok(()) => log::info!("{} service stopped", self.cfg.title),
            Err(e) => log::error!("Failed to stop {}: {e}", self.cfg.title),
        }
        result
    }

    /// Stop, wait `settle_delay`, start.
    ///
    /// Start is attempted even when stop failed; the first error is returned.
    pub fn restart_service(&self) -> CommandResult {
        let stopped = self.stop_service();
        thread::sleep(self.cfg.settle_delay);
        let started = self.start_service();
        stopped.and(started)
    }
}
