use std::fmt;

/// Last observed run state of the managed service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceState {
    /// No probe has completed yet
    #[default]
    Unknown,
    Running,
    Stopped,
}

impl ServiceState {
    pub fn from_running(running: bool) -> Self {
        if running {
            ServiceState::Running
        } else {
            ServiceState::Stopped
        }
    }

    /// Text of the status entry in the tray menu.
    pub fn label(self) -> &'static str {
        match self {
            ServiceState::Unknown => "Status: Checking...",
            ServiceState::Running => "Status: Running ✓",
            ServiceState::Stopped => "Status: Stopped ✗",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServiceState::Unknown => "unknown",
            ServiceState::Running => "running",
            ServiceState::Stopped => "stopped",
        })
    }
}
