use std::time::Duration;

/// Tray settings (compiled in, there is no config file).
#[derive(Debug, Clone)]
pub struct TrayConfig {
    /// Process-search utility used by the status probe
    pub probe_program: String,
    pub probe_args: Vec<String>,
    /// Privilege-escalation launcher wrapped around every service verb
    pub launcher: String,
    pub service_manager: String,
    /// Unit name handed to the service manager
    pub unit: String,
    pub probe_timeout: Duration,
    pub stop_timeout: Duration,
    pub poll_interval: Duration,
    /// Pause between stop and start during a restart
    pub settle_delay: Duration,
    pub title: String,
    pub tooltip: String,
}

impl TrayConfig {
    /// Arguments handed to the launcher for `verb` (`start`, `stop`).
    pub fn service_args(&self, verb: &str) -> Vec<String> {
        vec![
            self.service_manager.clone(),
            verb.to_string(),
            self.unit.clone(),
        ]
    }

    pub fn start_args(&self) -> Vec<String> {
        self.service_args("start")
    }

    pub fn stop_args(&self) -> Vec<String> {
        self.service_args("stop")
    }

    /// External tools the tray shells out to, in the order they are used.
    pub fn external_tools(&self) -> [&str; 3] {
        [
            self.probe_program.as_str(),
            self.launcher.as_str(),
            self.service_manager.as_str(),
        ]
    }
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            probe_program: "pgrep".into(),
            probe_args: vec!["-f".into(), "ollama serve".into()],
            launcher: "pkexec".into(),
            service_manager: "systemctl".into(),
            unit: "ollama".into(),
            probe_timeout: Duration::from_secs(3),
            stop_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_secs(5),
            settle_delay: Duration::from_secs(2),
            title: "Ollama".into(),
            tooltip: "Ollama Server Manager".into(),
        }
    }
}
