//! GTK tray front end (AppIndicator/StatusNotifier through `tray-icon`).
//!
//! The main thread owns the tray and its menu items because they are `!Send`.
//! Menu clicks go out to the reactor as [`TrayEvent`]s; label updates and the
//! final shutdown come back as [`TrayCommand`]s.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use gtk::glib;
use log::{debug, warn};
use ollama_tray::{ServiceState, StatusSink, TrayConfig, TrayEvent, icon};
use tray_icon::menu::{Menu, MenuEvent, MenuId, MenuItem, PredefinedMenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

/// How often the GTK loop drains pending [`TrayCommand`]s.
const COMMAND_POLL: Duration = Duration::from_millis(100);

/// Commands sent from the reactor thread to the main UI thread.
#[derive(Debug, Clone)]
pub enum TrayCommand {
    /// Replace the status entry text and the tooltip.
    SetStatus { label: &'static str, tooltip: String },
    /// Leave the GTK main loop.
    Shutdown,
}

/// [`StatusSink`] that forwards to the UI thread.
pub struct ChannelSink {
    tx: Sender<TrayCommand>,
    tooltip: String,
}

impl ChannelSink {
    pub fn new(tx: Sender<TrayCommand>, cfg: &TrayConfig) -> Self {
        Self {
            tx,
            tooltip: cfg.tooltip.clone(),
        }
    }
}

impl StatusSink for ChannelSink {
    fn show(&self, state: ServiceState, checked_at: DateTime<Local>) {
        let tooltip = format!(
            "{}\n{} (checked {})",
            self.tooltip,
            state.label(),
            checked_at.format("%H:%M:%S")
        );
        // The UI may already be gone during shutdown.
        self.tx
            .send(TrayCommand::SetStatus {
                label: state.label(),
                tooltip,
            })
            .ok();
    }

    fn close(&self) {
        self.tx.send(TrayCommand::Shutdown).ok();
    }
}

struct ActionIds {
    start: MenuId,
    stop: MenuId,
    restart: MenuId,
    quit: MenuId,
}

impl ActionIds {
    fn event_for(&self, id: &MenuId) -> Option<TrayEvent> {
        if *id == self.start {
            Some(TrayEvent::Start)
        } else if *id == self.stop {
            Some(TrayEvent::Stop)
        } else if *id == self.restart {
            Some(TrayEvent::Restart)
        } else if *id == self.quit {
            Some(TrayEvent::Quit)
        } else {
            None
        }
    }
}

pub struct TrayFrontend {
    tray: TrayIcon,
    status: MenuItem,
}

impl TrayFrontend {
    /// Initialise GTK and put the icon and menu in the panel. Menu clicks are
    /// forwarded on `events`.
    pub fn build(cfg: &TrayConfig, events: Sender<TrayEvent>) -> Result<Self> {
        gtk::init().context("Failed to initialise GTK")?;

        let rgba = icon::load()?;
        let icon = Icon::from_rgba(rgba.rgba, rgba.width, rgba.height)
            .context("Embedded tray icon is not valid RGBA")?;

        let status = MenuItem::new(ServiceState::Unknown.label(), false, None);
        let start = MenuItem::new(format!("Start {}", cfg.title), true, None);
        let stop = MenuItem::new(format!("Stop {}", cfg.title), true, None);
        let restart = MenuItem::new(format!("Restart {}", cfg.title), true, None);
        let quit = MenuItem::new("Quit", true, None);

        let menu = Menu::new();
        menu.append_items(&[
            &status,
            &PredefinedMenuItem::separator(),
            &start,
            &stop,
            &restart,
            &PredefinedMenuItem::separator(),
            &quit,
        ])
        .context("Failed to build tray menu")?;

        let tray = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_icon(icon)
            .with_title(&cfg.title)
            .with_tooltip(&cfg.tooltip)
            .build()
            .context("Failed to create tray icon")?;

        let ids = ActionIds {
            start: start.id().clone(),
            stop: stop.id().clone(),
            restart: restart.id().clone(),
            quit: quit.id().clone(),
        };
        MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
            match ids.event_for(&event.id) {
                // A closed channel means the reactor has already quit.
                Some(evt) => {
                    events.send(evt).ok();
                }
                None => debug!("unhandled menu event {:?}", event.id),
            }
        }));

        Ok(Self { tray, status })
    }

    /// Run the GTK main loop until the reactor asks for shutdown (or goes away).
    pub fn run(self, commands: Receiver<TrayCommand>) {
        let Self { tray, status } = self;

        glib::timeout_add_local(COMMAND_POLL, move || {
            loop {
                match commands.try_recv() {
                    Ok(TrayCommand::SetStatus { label, tooltip }) => {
                        status.set_text(label);
                        if let Err(e) = tray.set_tooltip(Some(tooltip)) {
                            debug!("tooltip update failed: {e}");
                        }
                    }
                    Ok(TrayCommand::Shutdown) => {
                        gtk::main_quit();
                        return glib::ControlFlow::Break;
                    }
                    Err(TryRecvError::Empty) => return glib::ControlFlow::Continue,
                    Err(TryRecvError::Disconnected) => {
                        warn!("reactor went away without shutting the tray down");
                        gtk::main_quit();
                        return glib::ControlFlow::Break;
                    }
                }
            }
        });

        gtk::main();
    }
}
