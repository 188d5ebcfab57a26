//! The tray's event loop.
//!
//! One [`Reactor`] owns the displayed [`ServiceState`]. Timer ticks, menu actions
//! and termination signals are multiplexed into a single stream and handled one at
//! a time, so the state never needs a lock.

use std::time::Duration;

use chrono::{DateTime, Local};
use crossbeam_channel::{Receiver, select, tick};
use log::{debug, info};
use nix::sys::signal::Signal;

use crate::config::TrayConfig;
use crate::control::ServiceController;
use crate::exec::CommandRunner;
use crate::probe::StatusProber;
use crate::signals;
use crate::state::ServiceState;

/// Coarse signal polling interval.
const SIGNAL_POLL: Duration = Duration::from_millis(200);

/// Everything the reactor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayEvent {
    Tick,
    Start,
    Stop,
    Restart,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Outbound seam to whatever renders the status (the tray menu in production).
pub trait StatusSink: Send {
    /// Display `state`, observed at `checked_at`.
    fn show(&self, state: ServiceState, checked_at: DateTime<Local>);

    /// Tear the front end down. Called once, on quit.
    fn close(&self);
}

pub struct Reactor<R, S> {
    runner: R,
    sink: S,
    cfg: TrayConfig,
    state: ServiceState,
    finished: bool,
    signal_source: fn() -> Option<Signal>,
}

impl<R: CommandRunner, S: StatusSink> Reactor<R, S> {
    pub fn new(runner: R, sink: S, cfg: TrayConfig) -> Self {
        Self {
            runner,
            sink,
            cfg,
            state: ServiceState::Unknown,
            finished: false,
            signal_source: signals::take,
        }
    }

    /// Replace where termination signals are read from.
    pub fn with_signal_source(mut self, source: fn() -> Option<Signal>) -> Self {
        self.signal_source = source;
        self
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Probe the service and push the result to the sink.
    pub fn refresh(&mut self) {
        let state = StatusProber::new(&self.runner, &self.cfg).probe();
        if state != self.state {
            info!("{} → {state}", self.cfg.unit);
        }
        self.state = state;
        self.sink.show(state, Local::now());
    }

    fn controller(&self) -> ServiceController<'_, R> {
        ServiceController::new(&self.runner, &self.cfg)
    }

    /// Handle one event to completion.
    ///
    /// Once a quit has been handled every further event is ignored.
    pub fn handle(&mut self, event: TrayEvent) -> Flow {
        if self.finished {
            debug!("ignoring {event:?} after quit");
            return Flow::Exit;
        }

        // Controller failures are logged by the controller; the re-probe
        // below is the only thing the user sees.
        match event {
            TrayEvent::Tick => self.refresh(),
            TrayEvent::Start => {
                info!("start requested");
                self.controller().start_service().ok();
                self.refresh();
            }
            TrayEvent::Stop => {
                info!("stop requested");
                self.controller().stop_service().ok();
                self.refresh();
            }
            TrayEvent::Restart => {
                info!("restart requested");
                self.controller().restart_service().ok();
                self.refresh();
            }
            TrayEvent::Quit => {
                info!("quit requested");
                self.finished = true;
                self.sink.close();
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    /// Central event loop. Probes once right away, then runs until a quit,
    /// a SIGINT/SIGTERM, or until every event sender is dropped.
    ///
    /// Returns the last observed state.
    pub fn run(mut self, events: Receiver<TrayEvent>) -> ServiceState {
        self.refresh();

        let poll_tick = tick(self.cfg.poll_interval);
        let sig_tick = tick(SIGNAL_POLL);

        loop {
            let event = select! {
                recv(events) -> evt => match evt {
                    Ok(evt) => Some(evt),
                    Err(_) => {
                        info!("event channel closed – shutting down");
                        Some(TrayEvent::Quit)
                    }
                },
                recv(poll_tick) -> _ => Some(TrayEvent::Tick),
                recv(sig_tick) -> _ => (self.signal_source)().map(|sig| {
                    info!("signal {sig:?} – orderly shutdown");
                    TrayEvent::Quit
                }),
            };
            let Some(event) = event else { continue };
            if self.handle(event) == Flow::Exit {
                break;
            }
        }

        self.state
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Instant;

    use crossbeam_channel::unbounded;

    use super::*;
    use crate::exec::mock::{Mode, MockRunner, status};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Shown {
        State(ServiceState),
        Closed,
    }

    #[derive(Clone, Default)]
    struct RecordingSink(Arc<Mutex<Vec<Shown>>>);

    impl RecordingSink {
        fn shown(&self) -> Vec<Shown> {
            self.0.lock().unwrap().clone()
        }
    }

    impl StatusSink for RecordingSink {
        fn show(&self, state: ServiceState, _checked_at: DateTime<Local>) {
            self.0.lock().unwrap().push(Shown::State(state));
        }

        fn close(&self) {
            self.0.lock().unwrap().push(Shown::Closed);
        }
    }

    fn quick_config() -> TrayConfig {
        TrayConfig {
            settle_delay: Duration::from_millis(10),
            ..TrayConfig::default()
        }
    }

    fn no_signals() -> Option<Signal> {
        None
    }

    fn programs(runner: &MockRunner) -> Vec<(String, Mode)> {
        runner
            .calls()
            .into_iter()
            .map(|c| (format!("{} {}", c.program, c.args.join(" ")), c.mode))
            .collect()
    }

    #[test]
    fn tick_probes_and_updates_label() {
        let runner = MockRunner::exiting(0);
        let sink = RecordingSink::default();
        let mut reactor = Reactor::new(runner.clone(), sink.clone(), quick_config());
        assert_eq!(reactor.state(), ServiceState::Unknown);

        assert_eq!(reactor.handle(TrayEvent::Tick), Flow::Continue);
        assert_eq!(reactor.state(), ServiceState::Running);
        assert_eq!(sink.shown(), [Shown::State(ServiceState::Running)]);
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn start_launches_then_reprobes() {
        // Service not up yet when the follow-up probe runs.
        let runner = MockRunner::new(|program, _| match program {
            "pgrep" => status(program, 1),
            _ => Ok(()),
        });
        let sink = RecordingSink::default();
        let mut reactor = Reactor::new(runner.clone(), sink.clone(), quick_config());

        reactor.handle(TrayEvent::Start);

        let probe = Mode::Run(Duration::from_secs(3));
        assert_eq!(
            programs(&runner),
            [
                ("pkexec systemctl start ollama".to_string(), Mode::Start),
                ("pgrep -f ollama serve".to_string(), probe),
            ]
        );
        assert_eq!(sink.shown(), [Shown::State(ServiceState::Stopped)]);
    }

    #[test]
    fn failed_stop_still_reprobes_and_updates_label() {
        let runner = MockRunner::new(|program, _| match program {
            "pgrep" => Ok(()),
            _ => status(program, 126),
        });
        let sink = RecordingSink::default();
        let mut reactor = Reactor::new(runner.clone(), sink.clone(), quick_config());

        assert_eq!(reactor.handle(TrayEvent::Stop), Flow::Continue);

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].args, ["systemctl", "stop", "ollama"]);
        assert_eq!(calls[1].program, "pgrep");
        assert_eq!(sink.shown(), [Shown::State(ServiceState::Running)]);
    }

    #[test]
    fn restart_runs_stop_start_probe_in_order() {
        let runner = MockRunner::succeeding();
        let sink = RecordingSink::default();
        let mut reactor = Reactor::new(runner.clone(), sink.clone(), quick_config());

        reactor.handle(TrayEvent::Restart);

        let order: Vec<_> = programs(&runner).into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            order,
            [
                "pkexec systemctl stop ollama",
                "pkexec systemctl start ollama",
                "pgrep -f ollama serve",
            ]
        );
        assert_eq!(sink.shown(), [Shown::State(ServiceState::Running)]);
    }

    #[test]
    fn quit_is_terminal_and_idempotent() {
        let runner = MockRunner::succeeding();
        let sink = RecordingSink::default();
        let mut reactor = Reactor::new(runner.clone(), sink.clone(), quick_config());

        assert_eq!(reactor.handle(TrayEvent::Quit), Flow::Exit);
        assert!(reactor.is_finished());
        assert_eq!(reactor.handle(TrayEvent::Quit), Flow::Exit);
        assert_eq!(reactor.handle(TrayEvent::Start), Flow::Exit);
        assert_eq!(reactor.handle(TrayEvent::Tick), Flow::Exit);

        assert!(runner.calls().is_empty());
        assert_eq!(sink.shown(), [Shown::Closed]);
    }

    #[test]
    fn run_probes_before_first_tick() {
        let runner = MockRunner::exiting(0);
        let sink = RecordingSink::default();
        let cfg = TrayConfig {
            poll_interval: Duration::from_secs(3600),
            ..quick_config()
        };
        let (tx, rx) = unbounded();
        let reactor = Reactor::new(runner.clone(), sink.clone(), cfg).with_signal_source(no_signals);
        let handle = thread::spawn(move || reactor.run(rx));

        let deadline = Instant::now() + Duration::from_secs(2);
        while sink.shown().is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        tx.send(TrayEvent::Quit).unwrap();

        assert_eq!(handle.join().unwrap(), ServiceState::Running);
        assert_eq!(
            sink.shown(),
            [Shown::State(ServiceState::Running), Shown::Closed]
        );
    }

    #[test]
    fn run_ticks_on_poll_interval() {
        let runner = MockRunner::exiting(1);
        let sink = RecordingSink::default();
        let cfg = TrayConfig {
            poll_interval: Duration::from_millis(50),
            ..quick_config()
        };
        let (tx, rx) = unbounded();
        let reactor = Reactor::new(runner.clone(), sink.clone(), cfg).with_signal_source(no_signals);
        let handle = thread::spawn(move || reactor.run(rx));

        thread::sleep(Duration::from_millis(400));
        tx.send(TrayEvent::Quit).unwrap();
        assert_eq!(handle.join().unwrap(), ServiceState::Stopped);

        let probes = sink
            .shown()
            .iter()
            .filter(|s| matches!(s, Shown::State(_)))
            .count();
        assert!(probes >= 3, "only {probes} probes in 400ms");
    }

    #[test]
    fn dropped_senders_shut_the_loop_down() {
        let sink = RecordingSink::default();
        let (tx, rx) = unbounded::<TrayEvent>();
        drop(tx);
        let state = Reactor::new(MockRunner::exiting(1), sink.clone(), quick_config())
            .with_signal_source(no_signals)
            .run(rx);

        assert_eq!(state, ServiceState::Stopped);
        assert_eq!(sink.shown().last(), Some(&Shown::Closed));
    }

    #[test]
    fn termination_signal_acts_as_quit() {
        fn sigterm() -> Option<Signal> {
            Some(Signal::SIGTERM)
        }

        let runner = MockRunner::exiting(0);
        let sink = RecordingSink::default();
        let (_tx, rx) = unbounded::<TrayEvent>();
        let started = Instant::now();
        Reactor::new(runner.clone(), sink.clone(), quick_config())
            .with_signal_source(sigterm)
            .run(rx);

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(
            sink.shown(),
            [Shown::State(ServiceState::Running), Shown::Closed]
        );
        assert_eq!(runner.calls().len(), 1);
    }
}
